//! Domain entities for UFO sighting records
//!
//! A `Sighting` is both the normalized shape produced from a source document
//! and the in-session copy of a stored record.

use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Date/time format shared by source files and display formatting (ISO-8601, UTC)
pub const SIGHTING_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Fields of a sighting record, named by their store column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SightingField {
    Guid,
    Sighted,
    Reported,
    Location,
    Shape,
    Duration,
    Description,
    Read,
}

impl SightingField {
    pub const ALL: [SightingField; 8] = [
        SightingField::Guid,
        SightingField::Sighted,
        SightingField::Reported,
        SightingField::Location,
        SightingField::Shape,
        SightingField::Duration,
        SightingField::Description,
        SightingField::Read,
    ];

    /// Store column name
    pub fn column(&self) -> &'static str {
        match self {
            SightingField::Guid => "guid",
            SightingField::Sighted => "sighted",
            SightingField::Reported => "reported",
            SightingField::Location => "location",
            SightingField::Shape => "shape",
            SightingField::Duration => "duration",
            SightingField::Description => "description",
            SightingField::Read => "is_read",
        }
    }

    /// Key used for this field in source JSON documents
    pub fn json_key(&self) -> &'static str {
        match self {
            SightingField::Guid => "id",
            SightingField::Sighted => "sighted",
            SightingField::Reported => "reported",
            SightingField::Location => "location",
            SightingField::Shape => "shape",
            SightingField::Duration => "duration",
            SightingField::Description => "description",
            SightingField::Read => "read",
        }
    }

    /// Whether the field holds free text (and can be used as a lookup key)
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            SightingField::Guid
                | SightingField::Location
                | SightingField::Shape
                | SightingField::Duration
                | SightingField::Description
        )
    }
}

impl std::fmt::Display for SightingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

impl std::str::FromStr for SightingField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "guid" | "id" => Ok(SightingField::Guid),
            "sighted" => Ok(SightingField::Sighted),
            "reported" => Ok(SightingField::Reported),
            "location" => Ok(SightingField::Location),
            "shape" => Ok(SightingField::Shape),
            "duration" => Ok(SightingField::Duration),
            "description" | "desc" => Ok(SightingField::Description),
            "is_read" | "read" => Ok(SightingField::Read),
            _ => Err(format!("Invalid sighting field: {}", s)),
        }
    }
}

/// A typed value for one sighting field; `None` means "no value"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(Option<String>),
    Timestamp(Option<DateTime<Utc>>),
    Flag(bool),
}

/// UFO sighting report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sighting {
    pub guid: String,
    pub sighted: Option<DateTime<Utc>>,
    pub reported: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub shape: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
    pub read: bool,
}

impl Sighting {
    /// Parse a timestamp in `SIGHTING_DATE_FORMAT`
    pub fn date_from_string(value: &str) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(value.trim(), SIGHTING_DATE_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Format a timestamp in `SIGHTING_DATE_FORMAT`
    pub fn string_from_date(date: &DateTime<Utc>) -> String {
        date.format(SIGHTING_DATE_FORMAT).to_string()
    }

    pub fn get(&self, field: SightingField) -> FieldValue {
        match field {
            SightingField::Guid => FieldValue::Text(Some(self.guid.clone())),
            SightingField::Sighted => FieldValue::Timestamp(self.sighted),
            SightingField::Reported => FieldValue::Timestamp(self.reported),
            SightingField::Location => FieldValue::Text(self.location.clone()),
            SightingField::Shape => FieldValue::Text(self.shape.clone()),
            SightingField::Duration => FieldValue::Text(self.duration.clone()),
            SightingField::Description => FieldValue::Text(self.description.clone()),
            SightingField::Read => FieldValue::Flag(self.read),
        }
    }

    /// Assign one field; the value kind must match the field
    pub fn set(&mut self, field: SightingField, value: FieldValue) -> AppResult<()> {
        match (field, value) {
            (SightingField::Guid, FieldValue::Text(Some(guid))) => self.guid = guid,
            (SightingField::Guid, FieldValue::Text(None)) => {
                return Err(AppError::InvalidInput(
                    "guid cannot be cleared".to_string(),
                ))
            }
            (SightingField::Sighted, FieldValue::Timestamp(v)) => self.sighted = v,
            (SightingField::Reported, FieldValue::Timestamp(v)) => self.reported = v,
            (SightingField::Location, FieldValue::Text(v)) => self.location = v,
            (SightingField::Shape, FieldValue::Text(v)) => self.shape = v,
            (SightingField::Duration, FieldValue::Text(v)) => self.duration = v,
            (SightingField::Description, FieldValue::Text(v)) => self.description = v,
            (SightingField::Read, FieldValue::Flag(v)) => self.read = v,
            (field, value) => {
                return Err(AppError::InvalidInput(format!(
                    "Value {:?} does not fit field '{}'",
                    value, field
                )))
            }
        }
        Ok(())
    }

    /// Every field paired with its current value, in `SightingField::ALL` order
    pub fn field_values(&self) -> Vec<(SightingField, FieldValue)> {
        SightingField::ALL
            .iter()
            .map(|field| (*field, self.get(*field)))
            .collect()
    }

    /// Whether a text field currently equals `value`
    pub fn text_matches(&self, field: SightingField, value: &str) -> bool {
        match self.get(field) {
            FieldValue::Text(Some(current)) => current == value,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_helpers_are_symmetric() {
        let date = Utc.with_ymd_and_hms(2013, 1, 1, 10, 0, 0).unwrap();
        let formatted = Sighting::string_from_date(&date);
        assert_eq!(formatted, "2013-01-01T10:00:00Z");
        assert_eq!(Sighting::date_from_string(&formatted), Some(date));
    }

    #[test]
    fn unparsable_dates_are_absent() {
        assert_eq!(Sighting::date_from_string("bad-date"), None);
        assert_eq!(Sighting::date_from_string("2013-01-01"), None);
        assert_eq!(Sighting::date_from_string(""), None);
    }

    #[test]
    fn set_rejects_mismatched_kind() {
        let mut sighting = Sighting::default();
        let err = sighting
            .set(SightingField::Sighted, FieldValue::Text(Some("x".into())))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        assert!(sighting
            .set(SightingField::Guid, FieldValue::Text(None))
            .is_err());
    }

    #[test]
    fn set_then_get_round_trips_each_field() {
        let mut sighting = Sighting::default();
        sighting
            .set(SightingField::Guid, FieldValue::Text(Some("a1".into())))
            .unwrap();
        sighting
            .set(SightingField::Shape, FieldValue::Text(Some("disk".into())))
            .unwrap();
        sighting.set(SightingField::Read, FieldValue::Flag(true)).unwrap();

        assert_eq!(sighting.guid, "a1");
        assert!(sighting.text_matches(SightingField::Shape, "disk"));
        assert_eq!(sighting.get(SightingField::Read), FieldValue::Flag(true));
        assert_eq!(sighting.field_values().len(), SightingField::ALL.len());
    }

    #[test]
    fn field_names_parse() {
        assert_eq!("desc".parse::<SightingField>().unwrap(), SightingField::Description);
        assert_eq!("ID".parse::<SightingField>().unwrap(), SightingField::Guid);
        assert!("color".parse::<SightingField>().is_err());
        assert_eq!(SightingField::Read.to_string(), "is_read");
    }
}
