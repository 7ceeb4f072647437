//! Diesel-based implementation of the sighting store
//!
//! Sessions stage records in memory and write them in a single SQLite
//! transaction on commit. The store hands out one writable session at a time.

use crate::modules::sightings::domain::entities::{FieldValue, Sighting, SightingField};
use crate::modules::sightings::domain::repository::{RecordHandle, SessionFactory, StoreSession};
use crate::modules::sightings::infrastructure::models::{
    NewSighting, SightingChangeset, SightingModel,
};
use crate::schema::ufo_sightings;
use crate::shared::errors::{AppError, AppResult};
use crate::shared::infrastructure::database::Database;
use crate::shared::utils::logger::{LogContext, TimedOperation};
use crate::{log_debug, log_info, log_warn};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task;

pub struct SqliteSightingStore {
    db: Arc<Database>,
    writer: Arc<Mutex<()>>,
}

impl SqliteSightingStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Number of stored sightings
    pub async fn count(&self) -> AppResult<i64> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> AppResult<i64> {
            let mut conn = db.get_connection()?;
            let count = ufo_sightings::table.count().get_result::<i64>(&mut conn)?;
            Ok(count)
        })
        .await?
    }

    /// Stored sighting with the given guid, if any
    pub async fn find_by_guid(&self, guid: &str) -> AppResult<Option<Sighting>> {
        let db = Arc::clone(&self.db);
        let guid = guid.to_string();

        task::spawn_blocking(move || -> AppResult<Option<Sighting>> {
            let mut conn = db.get_connection()?;
            let model = load_matches(&mut conn, SightingField::Guid, &guid)?;
            Ok(model.into_iter().next().map(SightingModel::to_sighting))
        })
        .await?
    }

    /// All stored sightings in insertion order
    pub async fn all(&self) -> AppResult<Vec<Sighting>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> AppResult<Vec<Sighting>> {
            let mut conn = db.get_connection()?;
            let models: Vec<SightingModel> = ufo_sightings::table
                .select(SightingModel::as_select())
                .order(ufo_sightings::id.asc())
                .load(&mut conn)?;
            Ok(models.into_iter().map(SightingModel::to_sighting).collect())
        })
        .await?
    }
}

#[async_trait]
impl SessionFactory for SqliteSightingStore {
    async fn open_session(&self) -> AppResult<Box<dyn StoreSession>> {
        let writer = match Arc::clone(&self.writer).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                log_info!("Another import holds the sighting store, waiting for it to finish");
                Arc::clone(&self.writer).lock_owned().await
            }
        };

        log_debug!("Opened sighting store session");
        Ok(Box::new(SightingSession::new(Arc::clone(&self.db), writer)))
    }
}

/// A record loaded into or created in a session
#[derive(Debug)]
struct StagedSighting {
    row_id: Option<i32>,
    sighting: Sighting,
    dirty: bool,
}

/// Unit of work over the sighting store
///
/// Staged records are indexed by guid and by row id so lookups stay constant
/// time however many records a batch touches.
pub struct SightingSession {
    db: Arc<Database>,
    staged: Vec<StagedSighting>,
    by_guid: HashMap<String, usize>,
    by_row: HashMap<i32, usize>,
    _writer: OwnedMutexGuard<()>,
}

impl SightingSession {
    fn new(db: Arc<Database>, writer: OwnedMutexGuard<()>) -> Self {
        Self {
            db,
            staged: Vec::new(),
            by_guid: HashMap::new(),
            by_row: HashMap::new(),
            _writer: writer,
        }
    }

    fn stage(&mut self, staged: StagedSighting) -> RecordHandle {
        let index = self.staged.len();
        if let Some(row_id) = staged.row_id {
            self.by_row.insert(row_id, index);
        }
        if !staged.sighting.guid.is_empty() {
            self.by_guid.entry(staged.sighting.guid.clone()).or_insert(index);
        }
        self.staged.push(staged);
        RecordHandle::new(index)
    }

    fn staged_mut(&mut self, handle: RecordHandle) -> AppResult<&mut StagedSighting> {
        self.staged
            .get_mut(handle.index())
            .ok_or_else(|| AppError::NotFound(format!("No staged record for {:?}", handle)))
    }

    /// First staged record whose text `field` equals `value`
    fn find_staged(&self, field: SightingField, value: &str) -> Option<usize> {
        match field {
            SightingField::Guid => self.by_guid.get(value).copied(),
            _ => self
                .staged
                .iter()
                .position(|s| s.sighting.text_matches(field, value)),
        }
    }

    /// Keep the guid index in step after a staged record's guid changed
    fn reindex_guid(&mut self, index: usize, previous: &str) {
        if self.by_guid.get(previous) == Some(&index) {
            self.by_guid.remove(previous);
            if let Some(other) = self
                .staged
                .iter()
                .position(|s| s.sighting.guid == previous)
            {
                self.by_guid.insert(previous.to_string(), other);
            }
        }

        let current = &self.staged[index].sighting.guid;
        if !current.is_empty() {
            let slot = self.by_guid.entry(current.clone()).or_insert(index);
            *slot = (*slot).min(index);
        }
    }

    fn clear(&mut self) {
        self.staged.clear();
        self.by_guid.clear();
        self.by_row.clear();
    }

    fn pending_count(&self) -> usize {
        self.staged.iter().filter(|s| s.dirty).count()
    }
}

#[async_trait]
impl StoreSession for SightingSession {
    async fn find_by_key(
        &mut self,
        field: SightingField,
        value: &str,
    ) -> AppResult<Option<RecordHandle>> {
        if !field.is_text() {
            return Err(AppError::InvalidInput(format!(
                "Field '{}' cannot be used as a lookup key",
                field
            )));
        }

        // Staged changes win over stored rows
        if let Some(index) = self.find_staged(field, value) {
            return Ok(Some(RecordHandle::new(index)));
        }

        let db = Arc::clone(&self.db);
        let value = value.to_string();
        let candidates = task::spawn_blocking(move || -> AppResult<Vec<SightingModel>> {
            let mut conn = db.get_connection()?;
            load_matches(&mut conn, field, &value)
        })
        .await??;

        // Rows already in the session were checked above in their staged form
        let model = candidates
            .into_iter()
            .find(|model| !self.by_row.contains_key(&model.id));

        Ok(model.map(|model| {
            self.stage(StagedSighting {
                row_id: Some(model.id),
                sighting: model.to_sighting(),
                dirty: false,
            })
        }))
    }

    async fn create_record(&mut self) -> AppResult<RecordHandle> {
        Ok(self.stage(StagedSighting {
            row_id: None,
            sighting: Sighting::default(),
            dirty: true,
        }))
    }

    async fn set_field(
        &mut self,
        handle: RecordHandle,
        field: SightingField,
        value: FieldValue,
    ) -> AppResult<()> {
        let staged = self.staged_mut(handle)?;
        let previous = (field == SightingField::Guid).then(|| staged.sighting.guid.clone());
        staged.sighting.set(field, value)?;
        staged.dirty = true;

        if let Some(previous) = previous {
            self.reindex_guid(handle.index(), &previous);
        }
        Ok(())
    }

    async fn commit(&mut self) -> AppResult<()> {
        let pending: Vec<(Option<i32>, Sighting)> = self
            .staged
            .drain(..)
            .filter(|s| s.dirty)
            .map(|s| (s.row_id, s.sighting))
            .collect();
        self.clear();

        if pending.is_empty() {
            log_debug!("Commit with no staged changes");
            return Ok(());
        }

        let timer = TimedOperation::new("sighting_session_commit");
        LogContext::db_operation("commit", "ufo_sightings", None);
        let db = Arc::clone(&self.db);

        let written = task::spawn_blocking(move || -> AppResult<usize> {
            let mut conn = db.get_connection()?;
            conn.transaction::<usize, AppError, _>(|conn| write_staged(conn, &pending))
        })
        .await??;

        timer.finish_with_info(&format!("{} sightings written", written));
        Ok(())
    }

    async fn rollback(&mut self) {
        let discarded = self.pending_count();
        self.clear();
        log_debug!("Rolled back session, discarded {} staged sightings", discarded);
    }
}

impl Drop for SightingSession {
    fn drop(&mut self) {
        let pending = self.pending_count();
        if pending > 0 {
            log_warn!(
                "Sighting session dropped with {} uncommitted changes",
                pending
            );
        }
    }
}

/// Insert new rows and fully replace existing ones inside the caller's transaction
fn write_staged(
    conn: &mut SqliteConnection,
    pending: &[(Option<i32>, Sighting)],
) -> AppResult<usize> {
    for (row_id, sighting) in pending {
        if sighting.guid.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Cannot persist a sighting without a guid".to_string(),
            ));
        }

        match row_id {
            Some(id) => {
                let changes = SightingChangeset::from(sighting);
                diesel::update(ufo_sightings::table.find(*id))
                    .set(&changes)
                    .execute(conn)?;
            }
            None => {
                let new_row = NewSighting::from(sighting);
                diesel::insert_into(ufo_sightings::table)
                    .values(&new_row)
                    .execute(conn)?;
            }
        }
    }

    Ok(pending.len())
}

/// Stored rows whose text `field` equals `value`, lowest id first
///
/// A guid lookup returns at most one row.
fn load_matches(
    conn: &mut SqliteConnection,
    field: SightingField,
    value: &str,
) -> AppResult<Vec<SightingModel>> {
    let query = ufo_sightings::table
        .select(SightingModel::as_select())
        .order(ufo_sightings::id.asc())
        .into_boxed();

    let query = match field {
        SightingField::Guid => query.filter(ufo_sightings::guid.eq(value)).limit(1),
        SightingField::Location => query.filter(ufo_sightings::location.eq(value)),
        SightingField::Shape => query.filter(ufo_sightings::shape.eq(value)),
        SightingField::Duration => query.filter(ufo_sightings::duration.eq(value)),
        SightingField::Description => query.filter(ufo_sightings::description.eq(value)),
        other => {
            return Err(AppError::InvalidInput(format!(
                "Field '{}' cannot be used as a lookup key",
                other
            )))
        }
    };

    Ok(query.load::<SightingModel>(conn)?)
}
