use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{broadcast, RwLock};

/// A frame on its way through the relay, tagged with the connection it came from.
#[derive(Debug, Clone)]
pub struct RelayFrame {
    pub sender_id: String,
    pub content: String,
}

/// Per-channel fan-out shared by all relay connections.
#[derive(Debug)]
pub struct RelayState {
    channels: RwLock<HashMap<String, broadcast::Sender<RelayFrame>>>,
    capacity: usize,
    relayed: AtomicU64,
    dropped: AtomicU64,
}

impl RelayState {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            relayed: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Attaches to `channel`, creating it on first use.
    ///
    /// Subscribing happens under the same lock as pruning, so a channel is
    /// never dropped between lookup and subscription.
    pub async fn join(&self, channel: &str) -> (broadcast::Sender<RelayFrame>, broadcast::Receiver<RelayFrame>) {
        let mut channels = self.channels.write().await;
        let bc = channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel::<RelayFrame>(self.capacity).0)
            .clone();
        let rbc = bc.subscribe();
        (bc, rbc)
    }

    /// Forgets channels nobody is connected to.
    pub async fn prune(&self) {
        self.channels.write().await.retain(|_, bc| bc.receiver_count() > 0);
    }

    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn connection_count(&self) -> usize {
        self.channels
            .read()
            .await
            .values()
            .map(|bc| bc.receiver_count())
            .sum()
    }

    pub fn record_relayed(&self) {
        self.relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, n: u64) {
        self.dropped.fetch_add(n, Ordering::Relaxed);
    }

    pub fn relayed(&self) -> u64 {
        self.relayed.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new(256)
    }
}
