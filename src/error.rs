use thiserror::Error;

use crate::mesh::role::Role;

/// Failures of local mesh operations and of the transport underneath them.
///
/// Inbound event handling never produces these: a bad event is logged and
/// dropped so the receive loop keeps going.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("mesh session already started as {0}")]
    AlreadyJoined(Role),
    #[error("mesh session has not been started")]
    NotJoined,
    #[error("no active stream selected")]
    NoActiveStream,
    #[error("unknown stream '{0}'")]
    UnknownStream(String),
    #[error("block '{0}' is not a task in the active stream")]
    NotATask(String),
    #[error("chat message is empty")]
    EmptyMessage,
    #[error("stream title is empty")]
    EmptyTitle,
    #[error("malformed mesh event: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Key-value store write failures. Reads never fail, see `storage_service::load`.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize value: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JournalError {
    #[error("no active session selected")]
    NoActiveSession,
    #[error("unknown session '{0}'")]
    UnknownSession(String),
    #[error("block '{0}' is not a task in the active session")]
    NotATask(String),
}
