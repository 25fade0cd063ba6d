//! Song model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Entity, Tag};

/// A playable song in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub genre: String,
    /// Opaque reference to the external audio source
    #[serde(default)]
    pub suno_id: String,
    /// Tags resolved by the server
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub is_generated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Song {
    /// Tag names in display order
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }
}

impl Entity for Song {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Request body for creating or updating a song.
///
/// Tags are sent as names; the server resolves them to tag records and
/// answers with the full song.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SongDraft {
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub suno_id: String,
    pub tags: Vec<String>,
}
