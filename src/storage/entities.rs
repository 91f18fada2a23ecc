use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted artist as exposed by the API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Artist {
    /// Storage-assigned, immutable id
    pub id: i64,
    /// Artist name
    pub name: String,
    /// Monthly listener count
    pub monthly_listeners: i32,
    /// Time of the last successful create or update
    pub last_checked: DateTime<Utc>,
}

/// The client-suppliable part of an artist. `id` and `last_checked` are
/// always assigned by the server, so they are ignored if present in input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ArtistDraft {
    /// Artist name
    pub name: String,
    /// Monthly listener count
    pub monthly_listeners: i32,
}

impl ArtistDraft {
    /// Creates a draft from its two fields
    pub fn new(name: impl Into<String>, monthly_listeners: i32) -> Self {
        ArtistDraft {
            name: name.into(),
            monthly_listeners,
        }
    }

    pub(crate) fn into_artist(self, id: i64, last_checked: DateTime<Utc>) -> Artist {
        Artist {
            id,
            name: self.name,
            monthly_listeners: self.monthly_listeners,
            last_checked,
        }
    }
}
