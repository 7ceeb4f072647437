//! Store session ports
//!
//! The import core only talks to these traits. A session is a unit of work:
//! changes are staged in the session and persisted together on `commit`.

use crate::modules::sightings::domain::entities::{FieldValue, SightingField};
use crate::shared::errors::AppResult;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// Identity of a record inside one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHandle(usize);

impl RecordHandle {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Opens writable sessions on a store
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open_session(&self) -> AppResult<Box<dyn StoreSession>>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait StoreSession: Send {
    /// First record (store order) whose text `field` equals `value`
    async fn find_by_key(
        &mut self,
        field: SightingField,
        value: &str,
    ) -> AppResult<Option<RecordHandle>>;

    /// Stage a new, empty record
    async fn create_record(&mut self) -> AppResult<RecordHandle>;

    async fn set_field(
        &mut self,
        handle: RecordHandle,
        field: SightingField,
        value: FieldValue,
    ) -> AppResult<()>;

    /// Persist every staged change atomically
    async fn commit(&mut self) -> AppResult<()>;

    /// Discard every staged change
    async fn rollback(&mut self);
}
