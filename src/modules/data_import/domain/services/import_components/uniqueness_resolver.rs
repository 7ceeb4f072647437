use crate::log_debug;
use crate::modules::sightings::{RecordHandle, SightingField, StoreSession};
use crate::shared::errors::AppResult;

/// Result of looking a guid up in the active session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Existing(RecordHandle),
    NotFound,
}

/// Decides insert-vs-update by guid. Read-only.
pub struct UniquenessResolver;

impl UniquenessResolver {
    /// Look up `guid`; if the store somehow holds several matches, the
    /// session returns the first in store order and that one is used
    pub async fn resolve(session: &mut dyn StoreSession, guid: &str) -> AppResult<Resolution> {
        match session.find_by_key(SightingField::Guid, guid).await? {
            Some(handle) => {
                log_debug!("Sighting '{}' exists, updating in place", guid);
                Ok(Resolution::Existing(handle))
            }
            None => Ok(Resolution::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::sightings::domain::repository::MockStoreSession;
    use crate::shared::errors::AppError;

    #[tokio::test]
    async fn existing_record_resolves_to_its_handle() {
        let mut session = MockStoreSession::new();
        session
            .expect_find_by_key()
            .times(1)
            .returning(|field, value| {
                assert_eq!(field, SightingField::Guid);
                assert_eq!(value, "a1");
                Ok(Some(RecordHandle::new(3)))
            });

        let resolution = UniquenessResolver::resolve(&mut session, "a1").await.unwrap();
        assert_eq!(resolution, Resolution::Existing(RecordHandle::new(3)));
    }

    #[tokio::test]
    async fn missing_record_resolves_to_not_found() {
        let mut session = MockStoreSession::new();
        session.expect_find_by_key().returning(|_, _| Ok(None));
        session.expect_create_record().never();

        let resolution = UniquenessResolver::resolve(&mut session, "a1").await.unwrap();
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[tokio::test]
    async fn lookup_errors_propagate() {
        let mut session = MockStoreSession::new();
        session
            .expect_find_by_key()
            .returning(|_, _| Err(AppError::DatabaseError("locked".into())));

        assert!(UniquenessResolver::resolve(&mut session, "a1").await.is_err());
    }
}
