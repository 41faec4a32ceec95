use crate::models::{Peer, PeerId};

/// Known participants, in the order they were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeerRegistry {
    peers: Vec<Peer>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a list, keeping the first entry for a repeated id.
    pub fn from_peers(peers: impl IntoIterator<Item = Peer>) -> Self {
        let mut registry = Self::new();
        for peer in peers {
            registry.insert(peer);
        }
        registry
    }

    /// Adds `peer` unless its id is already known. Returns whether it was added.
    pub fn insert(&mut self, peer: Peer) -> bool {
        if self.contains(&peer.id) {
            return false;
        }
        self.peers.push(peer);
        true
    }

    pub fn remove(&mut self, id: &str) -> Option<Peer> {
        let index = self.peers.iter().position(|p| p.id == id)?;
        Some(self.peers.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&Peer> {
        self.peers.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn ids(&self) -> impl Iterator<Item = &PeerId> {
        self.peers.iter().map(|p| &p.id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Peer list for a WELCOME answering `newcomer`: everyone known, with the
    /// newcomer listed as a non-host exactly once.
    pub fn snapshot_for(&self, newcomer: &Peer) -> Vec<Peer> {
        let mut peers: Vec<Peer> = self
            .peers
            .iter()
            .map(|p| if p.id == newcomer.id { newcomer.as_guest() } else { p.clone() })
            .collect();
        if !self.contains(&newcomer.id) {
            peers.push(newcomer.as_guest());
        }
        peers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent_per_id() {
        let mut registry = PeerRegistry::new();
        assert!(registry.insert(Peer::new("a", "Dev-1", false)));
        assert!(!registry.insert(Peer::new("a", "Renamed", true)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().name, "Dev-1");
    }

    #[test]
    fn remove_by_id() {
        let mut registry = PeerRegistry::from_peers([Peer::new("a", "A", true), Peer::new("b", "B", false)]);
        assert_eq!(registry.remove("a").map(|p| p.name), Some("A".to_string()));
        assert_eq!(registry.remove("a"), None);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn snapshot_appends_newcomer_as_guest() {
        let host = Peer::new("h", "Host", true);
        let registry = PeerRegistry::from_peers([host.clone()]);
        let newcomer = Peer::new("j1", "Dev-1", true);

        let snapshot = registry.snapshot_for(&newcomer);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0], host);
        assert_eq!(snapshot[1].id, "j1");
        assert!(!snapshot[1].is_host);
    }

    #[test]
    fn snapshot_does_not_repeat_a_known_newcomer() {
        let newcomer = Peer::new("j1", "Dev-1", false);
        let registry = PeerRegistry::from_peers([Peer::new("h", "Host", true), newcomer.clone()]);
        let snapshot = registry.snapshot_for(&newcomer);
        assert_eq!(snapshot.iter().filter(|p| p.id == "j1").count(), 1);
    }
}
