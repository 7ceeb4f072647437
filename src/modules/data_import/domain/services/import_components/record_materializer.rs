use crate::modules::sightings::{RecordHandle, StoreSession};
use crate::shared::errors::AppResult;

use super::field_mapper::NormalizedSighting;
use super::types::MaterializeOutcome;
use super::uniqueness_resolver::Resolution;

/// Record staged in the session for one source document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializedRecord {
    pub handle: RecordHandle,
    pub outcome: MaterializeOutcome,
}

/// Creates or overwrites one sighting inside the current session
///
/// Updates replace every field, so an absent value clears the stored one.
/// Nothing is committed here.
pub struct RecordMaterializer;

impl RecordMaterializer {
    pub async fn apply(
        session: &mut dyn StoreSession,
        sighting: &NormalizedSighting,
        resolution: Resolution,
    ) -> AppResult<MaterializedRecord> {
        let (handle, outcome) = match resolution {
            Resolution::Existing(handle) => (handle, MaterializeOutcome::Updated),
            Resolution::NotFound => (session.create_record().await?, MaterializeOutcome::Created),
        };

        for (field, value) in sighting.field_values() {
            session.set_field(handle, field, value).await?;
        }

        Ok(MaterializedRecord { handle, outcome })
    }
}
