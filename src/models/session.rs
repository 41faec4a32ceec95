use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::block::Block;
use crate::utils::{clock, ids};

/// A single-user thought stream, persisted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Session {
    pub fn new(title: impl Into<String>) -> Self {
        let now = clock::now();
        Self {
            id: ids::generate_id(),
            title: title.into(),
            blocks: Vec::new(),
            created_at: now,
            updated_at: now,
            tags: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScratchpadItem {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub completed: bool,
}

impl ScratchpadItem {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: ids::generate_id(),
            content: content.into(),
            completed: false,
        }
    }
}
