//! Broadcast transports carrying [`MeshEvent`]s between replicas.
//!
//! Delivery is best effort: no acknowledgements, no history, and ordering is
//! only preserved per sender. A sender never receives its own frames.

pub mod fanout;
pub mod local;
pub mod relay;

use tokio::sync::mpsc;
use tracing::warn;

use crate::error::MeshError;
use crate::models::MeshEvent;
use crate::utils::scope_guard::ScopeGuard;

pub use local::{LocalChannel, LocalTransport};
pub use relay::RelayTransport;

pub const DEFAULT_CHANNEL_NAME: &str = "devcognition-mesh-v1";

pub trait Transport: Send + Sync {
    /// Fire-and-forget publish to every other participant on the channel.
    fn broadcast(&self, event: &MeshEvent);

    /// Registers a listener. Dropping the subscription unsubscribes it.
    fn subscribe(&self) -> Subscription;

    /// Stops sending and receiving. Existing subscriptions end.
    fn close(&self);

    fn is_open(&self) -> bool;
}

pub fn encode_event(event: &MeshEvent) -> Result<String, MeshError> {
    Ok(serde_json::to_string(event)?)
}

pub fn decode_event(frame: &str) -> Result<MeshEvent, MeshError> {
    Ok(serde_json::from_str(frame)?)
}

/// Receiving end of a transport listener.
///
/// Frames are decoded here; anything that does not parse as a [`MeshEvent`]
/// is logged and skipped.
#[derive(Debug)]
pub struct Subscription {
    frames: mpsc::UnboundedReceiver<String>,
    _unsubscribe: ScopeGuard,
}

impl Subscription {
    pub fn new(frames: mpsc::UnboundedReceiver<String>, unsubscribe: ScopeGuard) -> Self {
        Self {
            frames,
            _unsubscribe: unsubscribe,
        }
    }

    /// Next well-formed event, or `None` once the transport is closed.
    pub async fn next_event(&mut self) -> Option<MeshEvent> {
        loop {
            let frame = self.frames.recv().await?;
            if let Some(event) = Self::decode(&frame) {
                return Some(event);
            }
        }
    }

    /// Next event already queued, without waiting.
    pub fn try_next_event(&mut self) -> Option<MeshEvent> {
        while let Ok(frame) = self.frames.try_recv() {
            if let Some(event) = Self::decode(&frame) {
                return Some(event);
            }
        }
        None
    }

    /// Drains everything queued right now.
    pub fn drain(&mut self) -> Vec<MeshEvent> {
        std::iter::from_fn(|| self.try_next_event()).collect()
    }

    pub fn unsubscribe(self) {}

    fn decode(frame: &str) -> Option<MeshEvent> {
        match decode_event(frame) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Dropping malformed mesh frame: {}", e);
                None
            }
        }
    }
}
