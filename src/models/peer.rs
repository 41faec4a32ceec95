use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::clock;

pub type PeerId = String;

/// A participant of the mesh as seen by one replica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub id: PeerId,
    pub name: String,
    pub is_host: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub joined_at: DateTime<Utc>,
}

impl Peer {
    pub fn new(id: impl Into<PeerId>, name: impl Into<String>, is_host: bool) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_host,
            joined_at: clock::now(),
        }
    }

    /// The same peer with the host flag cleared, as the host lists newcomers in a WELCOME.
    pub fn as_guest(&self) -> Self {
        Self {
            is_host: false,
            ..self.clone()
        }
    }
}
