//! Diesel models for the ufo_sightings table

use crate::modules::sightings::domain::entities::Sighting;
use crate::schema::ufo_sightings;
use chrono::NaiveDateTime;
use diesel::prelude::*;

/// Diesel model for querying stored sightings
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = ufo_sightings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SightingModel {
    pub id: i32,
    pub guid: String,
    pub sighted: Option<NaiveDateTime>,
    pub reported: Option<NaiveDateTime>,
    pub location: Option<String>,
    pub shape: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
    pub is_read: bool,
}

impl SightingModel {
    /// Convert to domain Sighting (timestamps are stored as UTC)
    pub fn to_sighting(self) -> Sighting {
        Sighting {
            guid: self.guid,
            sighted: self.sighted.map(|d| d.and_utc()),
            reported: self.reported.map(|d| d.and_utc()),
            location: self.location,
            shape: self.shape,
            duration: self.duration,
            description: self.description,
            read: self.is_read,
        }
    }
}

/// Diesel model for inserting new sightings
#[derive(Insertable, Debug)]
#[diesel(table_name = ufo_sightings)]
pub struct NewSighting<'a> {
    pub guid: &'a str,
    pub sighted: Option<NaiveDateTime>,
    pub reported: Option<NaiveDateTime>,
    pub location: Option<&'a str>,
    pub shape: Option<&'a str>,
    pub duration: Option<&'a str>,
    pub description: Option<&'a str>,
    pub is_read: bool,
}

impl<'a> From<&'a Sighting> for NewSighting<'a> {
    fn from(sighting: &'a Sighting) -> Self {
        Self {
            guid: &sighting.guid,
            sighted: sighting.sighted.map(|d| d.naive_utc()),
            reported: sighting.reported.map(|d| d.naive_utc()),
            location: sighting.location.as_deref(),
            shape: sighting.shape.as_deref(),
            duration: sighting.duration.as_deref(),
            description: sighting.description.as_deref(),
            is_read: sighting.read,
        }
    }
}

/// Full-row replacement; absent values are written as NULL
#[derive(AsChangeset, Debug)]
#[diesel(table_name = ufo_sightings, treat_none_as_null = true)]
pub struct SightingChangeset<'a> {
    pub guid: &'a str,
    pub sighted: Option<NaiveDateTime>,
    pub reported: Option<NaiveDateTime>,
    pub location: Option<&'a str>,
    pub shape: Option<&'a str>,
    pub duration: Option<&'a str>,
    pub description: Option<&'a str>,
    pub is_read: bool,
}

impl<'a> From<&'a Sighting> for SightingChangeset<'a> {
    fn from(sighting: &'a Sighting) -> Self {
        Self {
            guid: &sighting.guid,
            sighted: sighting.sighted.map(|d| d.naive_utc()),
            reported: sighting.reported.map(|d| d.naive_utc()),
            location: sighting.location.as_deref(),
            shape: sighting.shape.as_deref(),
            duration: sighting.duration.as_deref(),
            description: sighting.description.as_deref(),
            is_read: sighting.read,
        }
    }
}
