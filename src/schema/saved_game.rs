use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::value::StorableData;

/// Creation and last-write timestamps of a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveMeta {
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// The game-state part of a save: every store namespace by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedGameData {
    pub store: HashMap<String, StorableData>,
}

/// A persisted play session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedGame {
    pub name: String,
    pub version: String,
    pub meta: SaveMeta,
    pub game: SavedGameData,
}

impl SavedGame {
    /// An empty save stamped with the current time.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            version: version.into(),
            meta: SaveMeta {
                created: now,
                updated: now,
            },
            game: SavedGameData::default(),
        }
    }

    /// The record a fresh game starts with, named `NewGame-<millis>`.
    pub fn new_game(version: impl Into<String>) -> Self {
        let name = format!("NewGame-{}", Utc::now().timestamp_millis());
        Self::new(name, version)
    }

    pub fn touch(&mut self) {
        self.meta.updated = Utc::now();
    }
}
