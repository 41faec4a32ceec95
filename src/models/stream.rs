use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::block::Block;
use super::peer::PeerId;
use crate::utils::{clock, ids};

/// A chat line inside a collaborative stream. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: PeerId,
    pub sender_name: String,
    pub content: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender_id: impl Into<PeerId>, sender_name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: ids::generate_id(),
            sender_id: sender_id.into(),
            sender_name: sender_name.into(),
            content: content.into(),
            timestamp: clock::now(),
        }
    }
}

/// Shared document replicated across the mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollabStream {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// External database connection string. Carried along, never used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_uri: Option<String>,
    #[serde(default)]
    pub connected_peers: BTreeSet<PeerId>,
}

impl CollabStream {
    pub fn new(title: impl Into<String>, persistence_uri: Option<String>) -> Self {
        let now = clock::now();
        Self {
            id: ids::generate_id(),
            title: title.into(),
            blocks: Vec::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            tags: BTreeSet::new(),
            persistence_uri,
            connected_peers: BTreeSet::new(),
        }
    }
}
