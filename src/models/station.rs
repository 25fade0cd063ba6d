//! Station model

use serde::{Deserialize, Serialize};

use super::Entity;

/// A virtual radio channel. Tags are carried by name, not by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Entity for Station {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Request body for creating or updating a station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationDraft {
    pub name: String,
    pub tags: Vec<String>,
}

impl StationDraft {
    pub fn new(name: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            name: name.into(),
            tags,
        }
    }
}
