use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info};

use super::fanout::Fanout;
use super::{encode_event, Subscription, Transport};
use crate::models::MeshEvent;

#[derive(Default)]
struct Endpoints {
    next_id: u64,
    open: Vec<(u64, Fanout)>,
}

/// Named in-process broadcast channel. Every [`LocalTransport`] opened on it
/// sees what the others publish.
#[derive(Clone)]
pub struct LocalChannel {
    name: Arc<str>,
    endpoints: Arc<Mutex<Endpoints>>,
}

impl LocalChannel {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            endpoints: Arc::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn endpoints(&self) -> MutexGuard<'_, Endpoints> {
        self.endpoints.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attaches a new participant to the channel.
    pub fn open(&self) -> LocalTransport {
        let fanout = Fanout::new();
        let endpoint = {
            let mut endpoints = self.endpoints();
            let id = endpoints.next_id;
            endpoints.next_id += 1;
            endpoints.open.push((id, fanout.clone()));
            id
        };
        debug!("Opened endpoint {} on local channel '{}'", endpoint, self.name);
        LocalTransport {
            channel: self.clone(),
            endpoint,
            fanout,
            open: AtomicBool::new(true),
        }
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints().open.len()
    }

    fn publish(&self, from: u64, frame: &str) {
        // Collect first so delivery happens outside the channel lock.
        let targets: Vec<Fanout> = self
            .endpoints()
            .open
            .iter()
            .filter(|(id, _)| *id != from)
            .map(|(_, fanout)| fanout.clone())
            .collect();
        for fanout in targets {
            fanout.deliver(frame);
        }
    }

    fn detach(&self, endpoint: u64) {
        self.endpoints().open.retain(|(id, _)| *id != endpoint);
    }
}

/// One participant's handle on a [`LocalChannel`].
pub struct LocalTransport {
    channel: LocalChannel,
    endpoint: u64,
    fanout: Fanout,
    open: AtomicBool,
}

impl Transport for LocalTransport {
    fn broadcast(&self, event: &MeshEvent) {
        if !self.is_open() {
            debug!("Local endpoint {} is closed, dropping {}", self.endpoint, event.kind());
            return;
        }
        match encode_event(event) {
            Ok(frame) => self.channel.publish(self.endpoint, &frame),
            Err(e) => error!("Failed to encode {}: {}", event.kind(), e),
        }
    }

    fn subscribe(&self) -> Subscription {
        self.fanout.subscribe()
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            self.channel.detach(self.endpoint);
            self.fanout.clear();
            info!("Closed endpoint {} on local channel '{}'", self.endpoint, self.channel.name());
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl Drop for LocalTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left(peer_id: &str) -> MeshEvent {
        MeshEvent::PeerLeft { peer_id: peer_id.into() }
    }

    #[test]
    fn sender_does_not_receive_its_own_frames() {
        let channel = LocalChannel::new("test");
        let a = channel.open();
        let b = channel.open();
        let mut a_sub = a.subscribe();
        let mut b_sub = b.subscribe();

        a.broadcast(&left("x"));

        assert!(a_sub.drain().is_empty());
        assert_eq!(b_sub.drain(), vec![left("x")]);
    }

    #[test]
    fn per_sender_order_is_preserved() {
        let channel = LocalChannel::new("test");
        let a = channel.open();
        let b = channel.open();
        let mut sub = b.subscribe();

        for id in ["1", "2", "3"] {
            a.broadcast(&left(id));
        }

        assert_eq!(sub.drain(), vec![left("1"), left("2"), left("3")]);
    }

    #[test]
    fn late_subscribers_see_no_history() {
        let channel = LocalChannel::new("test");
        let a = channel.open();
        let b = channel.open();

        a.broadcast(&left("early"));
        let mut sub = b.subscribe();
        a.broadcast(&left("late"));

        assert_eq!(sub.drain(), vec![left("late")]);
    }

    #[tokio::test]
    async fn closing_ends_subscriptions_and_silences_broadcasts() {
        let channel = LocalChannel::new("test");
        let a = channel.open();
        let b = channel.open();
        let mut b_sub = b.subscribe();
        let mut a_sub = a.subscribe();

        a.close();
        assert!(!a.is_open());
        assert_eq!(channel.endpoint_count(), 1);

        a.broadcast(&left("ignored"));
        assert!(b_sub.drain().is_empty());
        assert_eq!(a_sub.next_event().await, None);
    }
}
