use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use super::Subscription;
use crate::utils::scope_guard::ScopeGuard;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    senders: Vec<(u64, mpsc::UnboundedSender<String>)>,
}

/// Set of listeners attached to one transport endpoint.
#[derive(Clone, Default)]
pub struct Fanout {
    inner: Arc<Mutex<Listeners>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    fn listeners(&self) -> MutexGuard<'_, Listeners> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut listeners = self.listeners();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.senders.push((id, tx));
            id
        };
        let inner = Arc::downgrade(&self.inner);
        let guard = ScopeGuard::new(move || {
            if let Some(inner) = inner.upgrade() {
                let mut listeners = inner.lock().unwrap_or_else(PoisonError::into_inner);
                listeners.senders.retain(|(listener, _)| *listener != id);
            }
        });
        Subscription::new(rx, guard)
    }

    /// Hands a frame to every live listener, forgetting the ones that went away.
    pub fn deliver(&self, frame: &str) {
        self.listeners()
            .senders
            .retain(|(_, tx)| tx.send(frame.to_owned()).is_ok());
    }

    /// Drops every listener so their subscriptions end.
    pub fn clear(&self) {
        self.listeners().senders.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners().senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
