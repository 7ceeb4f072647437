use crate::log_warn;
use crate::modules::sightings::{Sighting, SightingField};
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::document::value_at_path_or_absent;
use super::types::RecordRejection;

/// A source document after normalization, ready to be stored
pub type NormalizedSighting = Sighting;

/// Maps raw source documents to normalized sightings
///
/// Pure: the same document always yields the same result.
pub struct FieldMapper;

impl FieldMapper {
    /// Normalize one source document
    ///
    /// Only a missing or empty id rejects the document; bad dates and
    /// absent optional fields are absorbed.
    pub fn map_sighting(document: &Value) -> Result<NormalizedSighting, RecordRejection> {
        if !document.is_object() {
            return Err(RecordRejection::NotAnObject);
        }

        let guid = Self::id_value(document).ok_or(RecordRejection::MissingId)?;

        Ok(NormalizedSighting {
            sighted: Self::date_value(document, SightingField::Sighted, &guid),
            reported: Self::date_value(document, SightingField::Reported, &guid),
            location: Self::text_value(document, SightingField::Location),
            shape: Self::text_value(document, SightingField::Shape),
            duration: Self::text_value(document, SightingField::Duration),
            description: Self::text_value(document, SightingField::Description),
            read: Self::flag_value(document, SightingField::Read),
            guid,
        })
    }

    fn id_value(document: &Value) -> Option<String> {
        Self::text_value(document, SightingField::Guid)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
    }

    /// Strings as-is, numbers and booleans in their text form
    fn text_value(document: &Value, field: SightingField) -> Option<String> {
        match value_at_path_or_absent(document, field.json_key())? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn date_value(document: &Value, field: SightingField, guid: &str) -> Option<DateTime<Utc>> {
        let raw = Self::text_value(document, field)?;
        let parsed = Sighting::date_from_string(&raw);
        if parsed.is_none() {
            log_warn!(
                "Sighting '{}': unparsable {} date '{}', storing it as absent",
                guid,
                field,
                raw
            );
        }
        parsed
    }

    /// Booleans, or numbers where non-zero means true; anything else is false
    fn flag_value(document: &Value, field: SightingField) -> bool {
        match value_at_path_or_absent(document, field.json_key()) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn maps_complete_document() {
        let doc = json!({
            "id": "a1",
            "sighted": "2013-01-01T10:00:00Z",
            "reported": "2013-01-02T08:30:00Z",
            "location": "Phoenix, AZ",
            "shape": "light",
            "duration": "5 minutes",
            "description": "Three lights in a V",
            "read": true
        });

        let sighting = FieldMapper::map_sighting(&doc).unwrap();
        assert_eq!(sighting.guid, "a1");
        assert_eq!(
            sighting.sighted,
            Some(Utc.with_ymd_and_hms(2013, 1, 1, 10, 0, 0).unwrap())
        );
        assert_eq!(
            sighting.reported,
            Some(Utc.with_ymd_and_hms(2013, 1, 2, 8, 30, 0).unwrap())
        );
        assert_eq!(sighting.location.as_deref(), Some("Phoenix, AZ"));
        assert_eq!(sighting.shape.as_deref(), Some("light"));
        assert_eq!(sighting.duration.as_deref(), Some("5 minutes"));
        assert_eq!(sighting.description.as_deref(), Some("Three lights in a V"));
        assert!(sighting.read);
    }

    #[test]
    fn nulls_and_missing_keys_are_absent() {
        let doc = json!({"id": "a2", "shape": null, "sighted": null});
        let sighting = FieldMapper::map_sighting(&doc).unwrap();

        assert_eq!(sighting.shape, None);
        assert_eq!(sighting.sighted, None);
        assert_eq!(sighting.location, None);
        assert!(!sighting.read);
    }

    #[test]
    fn bad_date_does_not_reject() {
        let doc = json!({"id": "a3", "sighted": "bad-date", "reported": "2013-01-01T10:00:00Z"});
        let sighting = FieldMapper::map_sighting(&doc).unwrap();

        assert_eq!(sighting.sighted, None);
        assert!(sighting.reported.is_some());
    }

    #[test]
    fn missing_or_empty_id_rejects() {
        for doc in [
            json!({"sighted": "2013-01-01T10:00:00Z"}),
            json!({"id": null}),
            json!({"id": ""}),
            json!({"id": "   "}),
            json!({"id": ["a1"]}),
        ] {
            assert_eq!(
                FieldMapper::map_sighting(&doc),
                Err(RecordRejection::MissingId),
                "{}",
                doc
            );
        }
    }

    #[test]
    fn non_object_rejects() {
        assert_eq!(
            FieldMapper::map_sighting(&json!("a1")),
            Err(RecordRejection::NotAnObject)
        );
        assert_eq!(
            FieldMapper::map_sighting(&json!(null)),
            Err(RecordRejection::NotAnObject)
        );
    }

    #[test]
    fn numeric_values_become_text() {
        let doc = json!({"id": 42, "duration": 30, "read": 1});
        let sighting = FieldMapper::map_sighting(&doc).unwrap();

        assert_eq!(sighting.guid, "42");
        assert_eq!(sighting.duration.as_deref(), Some("30"));
        assert!(sighting.read);
    }

    #[test]
    fn id_is_trimmed() {
        let sighting = FieldMapper::map_sighting(&json!({"id": "  a1 "})).unwrap();
        assert_eq!(sighting.guid, "a1");
    }

    #[test]
    fn normalized_output_feeds_the_store_entity() {
        let normalized: NormalizedSighting =
            FieldMapper::map_sighting(&json!({"id": "a1", "shape": "disk"})).unwrap();
        let expected = Sighting {
            guid: "a1".to_string(),
            shape: Some("disk".to_string()),
            ..Default::default()
        };
        assert_eq!(normalized, expected);
    }
}
