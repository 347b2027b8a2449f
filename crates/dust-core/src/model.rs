//! Raw documents as they arrive from a dataset, plus the derived values the
//! normalizer attaches to them.
//!
//! Raw types tolerate absent and `null` properties; anything the guide never
//! reads is ignored on deserialization.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder shown instead of a hidden or missing camp/art location.
pub const LOCATION_UNAVAILABLE: &str = "Unavailable";

/// Display string used when no occurrence of an event can be described.
pub const UNKNOWN_TIME: &str = "Unknown";

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Identifier of an [`Event`].
    EventId
);
entity_id!(
    /// Identifier of a [`Camp`].
    CampId
);
entity_id!(
    /// Identifier of an [`Art`] installation.
    ArtId
);

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventType {
    #[serde(default, deserialize_with = "nullable")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbr: Option<String>,
}

/// One scheduled window of an event, exactly as published.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    #[serde(default, deserialize_with = "nullable")]
    pub start_time: String,
    #[serde(default, deserialize_with = "nullable")]
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub uid: EventId,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub print_description: String,
    #[serde(default, deserialize_with = "nullable")]
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosted_by_camp: Option<CampId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub located_at_art: Option<ArtId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub occurrence_set: Vec<Occurrence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camp {
    pub uid: CampId,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hometown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Set by the display layer once a cached render is validated.
    #[serde(default)]
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Art {
    pub uid: ArtId,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub images: Vec<Image>,
}

/// Auxiliary map point (the `potties` resource).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub x: f64,
    pub y: f64,
}

/// The three collections that make up one population.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawDataset {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub camps: Vec<Camp>,
    #[serde(default)]
    pub art: Vec<Art>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeString {
    pub short: String,
    pub long: String,
}

impl TimeString {
    pub fn unknown() -> Self {
        Self {
            short: UNKNOWN_TIME.to_string(),
            long: UNKNOWN_TIME.to_string(),
        }
    }
}

/// A calendar day on which at least one occurrence starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    /// Weekday abbreviated to three characters, e.g. `Mon`.
    pub name: String,
    pub day_of_month: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceState {
    /// Corrected window; `None` when the published timestamps did not parse.
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub old: bool,
    pub happening: bool,
    pub long_time_string: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventState {
    /// Resolved host label: camp name, free-text location, or art name.
    pub camp: Option<String>,
    /// Location of the hosting camp, when hosted by one.
    pub location: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub time_string: String,
    pub long_time_string: String,
    pub old: bool,
    pub happening: bool,
    pub occurrences: Vec<OccurrenceState>,
}
