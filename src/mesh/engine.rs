use std::sync::Arc;

use tracing::{debug, info, warn};

use super::merge::{self, MergePolicy};
use super::registry::PeerRegistry;
use super::role::{Role, SessionPhase};
use crate::error::MeshError;
use crate::models::{
    block, Block, BlockKind, ChatMessage, CollabStream, MeshEvent, MeshSnapshot, Peer, PeerId,
};
use crate::transport::Transport;
use crate::utils::ids;

pub const DEFAULT_STREAM_TITLE: &str = "General Discussion";

/// One process's replica of the shared mesh state.
///
/// Inbound events are folded in by [`handle_event`](Self::handle_event).
/// Local edits are applied immediately and then broadcast; nothing waits for
/// an echo or an acknowledgement.
pub struct ReplicationEngine {
    transport: Arc<dyn Transport>,
    local: Peer,
    phase: SessionPhase,
    streams: Vec<CollabStream>,
    registry: PeerRegistry,
    active_stream_id: Option<String>,
    synced: bool,
    merge: MergePolicy,
}

impl ReplicationEngine {
    pub fn new(transport: Arc<dyn Transport>, name: impl Into<String>) -> Self {
        Self::with_peer_id(transport, ids::generate_peer_id(), name)
    }

    pub fn with_peer_id(transport: Arc<dyn Transport>, id: impl Into<PeerId>, name: impl Into<String>) -> Self {
        Self {
            transport,
            local: Peer::new(id, name, false),
            phase: SessionPhase::NotJoined,
            streams: Vec::new(),
            registry: PeerRegistry::new(),
            active_stream_id: None,
            synced: false,
            merge: merge::replace_blocks,
        }
    }

    pub fn with_merge_policy(mut self, merge: MergePolicy) -> Self {
        self.merge = merge;
        self
    }

    pub fn local_peer(&self) -> &Peer {
        &self.local
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn role(&self) -> Option<Role> {
        self.phase.role()
    }

    pub fn is_host(&self) -> bool {
        self.role().is_some_and(Role::is_host)
    }

    /// Whether this replica holds a snapshot: always for a host, after the
    /// first accepted WELCOME for a joiner.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn streams(&self) -> &[CollabStream] {
        &self.streams
    }

    pub fn stream(&self, id: &str) -> Option<&CollabStream> {
        self.streams.iter().find(|s| s.id == id)
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.registry
    }

    pub fn active_stream_id(&self) -> Option<&str> {
        self.active_stream_id.as_deref()
    }

    pub fn active_stream(&self) -> Option<&CollabStream> {
        self.active_stream_id.as_deref().and_then(|id| self.stream(id))
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    // -- bootstrap ----------------------------------------------------------

    fn start(&mut self, role: Role) -> Result<(), MeshError> {
        if let SessionPhase::Active(current) = self.phase {
            return Err(MeshError::AlreadyJoined(current));
        }
        self.local.is_host = role.is_host();
        self.local.joined_at = crate::utils::clock::now();
        self.registry = PeerRegistry::from_peers([self.local.clone()]);
        self.phase = SessionPhase::Active(role);
        Ok(())
    }

    /// Starts the session as host with one default stream.
    ///
    /// The default stream is not broadcast; joiners receive it in the WELCOME
    /// snapshot. Returns its id.
    pub fn host(&mut self) -> Result<String, MeshError> {
        self.start(Role::Host)?;
        let stream = CollabStream::new(DEFAULT_STREAM_TITLE, None);
        let id = stream.id.clone();
        self.streams.push(stream);
        self.active_stream_id = Some(id.clone());
        self.synced = true;
        info!("Hosting mesh session as {} ({})", self.local.name, self.local.id);
        Ok(id)
    }

    /// Starts the session as joiner and announces this peer.
    ///
    /// State stays empty until some host answers with a WELCOME. There is no
    /// timeout: without a host the replica never converges.
    pub fn join(&mut self) -> Result<(), MeshError> {
        self.start(Role::Joiner)?;
        info!("Joining mesh session as {} ({})", self.local.name, self.local.id);
        self.transport.broadcast(&MeshEvent::Hello {
            peer: self.local.clone(),
        });
        Ok(())
    }

    pub fn start_as(&mut self, role: Role) -> Result<(), MeshError> {
        match role {
            Role::Host => self.host().map(|_| ()),
            Role::Joiner => self.join(),
        }
    }

    // -- inbound ------------------------------------------------------------

    /// Applies one received event. Never fails: events that cannot apply are
    /// logged and dropped.
    pub fn handle_event(&mut self, event: MeshEvent) {
        let Some(role) = self.role() else {
            debug!("Not joined yet, dropping {}", event.kind());
            return;
        };
        debug!("Applying {}", event.kind());
        match event {
            MeshEvent::Hello { peer } => self.on_hello(role, peer),
            MeshEvent::Welcome { state } => self.on_welcome(role, state),
            MeshEvent::CreateStream { stream } => {
                // Duplicate ids are kept as distinct entries.
                self.streams.push(stream);
            }
            MeshEvent::UpdateStream { stream_id, blocks } => self.on_update_stream(&stream_id, blocks),
            MeshEvent::NewChat { stream_id, message } => self.on_new_chat(&stream_id, message),
            MeshEvent::PeerJoined { peer } => {
                self.registry.insert(peer);
            }
            MeshEvent::PeerLeft { peer_id } => {
                if self.registry.remove(&peer_id).is_none() {
                    debug!("PEER_LEFT for unknown peer {}", peer_id);
                }
            }
        }
    }

    fn on_hello(&mut self, role: Role, peer: Peer) {
        let snapshot_peers = self.registry.snapshot_for(&peer);
        if self.registry.insert(peer.clone()) {
            info!("Peer {} ({}) said hello", peer.name, peer.id);
        }
        if role.answers_hello() {
            self.transport.broadcast(&MeshEvent::Welcome {
                state: MeshSnapshot {
                    streams: self.streams.clone(),
                    peers: snapshot_peers,
                },
            });
        }
    }

    fn on_welcome(&mut self, role: Role, state: MeshSnapshot) {
        if !role.accepts_snapshot() {
            warn!("Ignoring WELCOME received while hosting");
            return;
        }
        info!(
            "Applying snapshot with {} streams and {} peers",
            state.streams.len(),
            state.peers.len()
        );
        self.streams = state.streams;
        self.registry = PeerRegistry::from_peers(state.peers);
        self.synced = true;
        if self.active_stream_id.is_none() {
            self.active_stream_id = self.streams.first().map(|s| s.id.clone());
        }
    }

    fn on_update_stream(&mut self, stream_id: &str, blocks: Vec<Block>) {
        let merge = self.merge;
        let mut matched = false;
        for stream in self.streams.iter_mut().filter(|s| s.id == stream_id) {
            stream.blocks = merge(&stream.blocks, blocks.clone());
            matched = true;
        }
        if !matched {
            debug!("UPDATE_STREAM for unknown stream {}", stream_id);
        }
    }

    fn on_new_chat(&mut self, stream_id: &str, message: ChatMessage) {
        let mut matched = false;
        for stream in self.streams.iter_mut().filter(|s| s.id == stream_id) {
            stream.messages.push(message.clone());
            matched = true;
        }
        if !matched {
            debug!("NEW_CHAT for unknown stream {}", stream_id);
        }
    }

    // -- local edits ----------------------------------------------------------

    fn ensure_active(&self) -> Result<(), MeshError> {
        match self.phase {
            SessionPhase::NotJoined => Err(MeshError::NotJoined),
            SessionPhase::Active(_) => Ok(()),
        }
    }

    fn active_stream_mut(&mut self) -> Result<&mut CollabStream, MeshError> {
        self.ensure_active()?;
        let id = self.active_stream_id.as_deref().ok_or(MeshError::NoActiveStream)?;
        self.streams
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(MeshError::NoActiveStream)
    }

    pub fn select_stream(&mut self, stream_id: &str) -> Result<(), MeshError> {
        self.ensure_active()?;
        if self.stream(stream_id).is_none() {
            return Err(MeshError::UnknownStream(stream_id.to_string()));
        }
        self.active_stream_id = Some(stream_id.to_string());
        Ok(())
    }

    /// Creates a stream, selects it and broadcasts CREATE_STREAM. Returns its id.
    pub fn create_stream(&mut self, title: &str, persistence_uri: Option<String>) -> Result<String, MeshError> {
        self.ensure_active()?;
        let title = title.trim();
        if title.is_empty() {
            return Err(MeshError::EmptyTitle);
        }
        let stream = CollabStream::new(title, persistence_uri.filter(|uri| !uri.trim().is_empty()));
        let id = stream.id.clone();
        self.streams.push(stream.clone());
        self.active_stream_id = Some(id.clone());
        self.transport.broadcast(&MeshEvent::CreateStream { stream });
        Ok(id)
    }

    /// Appends a block to the active stream and broadcasts the full block list.
    pub fn add_block(&mut self, kind: BlockKind, content: &str) -> Result<Block, MeshError> {
        let block = Block::new(kind, content);
        let stream = self.active_stream_mut()?;
        stream.blocks.push(block.clone());
        let event = MeshEvent::UpdateStream {
            stream_id: stream.id.clone(),
            blocks: stream.blocks.clone(),
        };
        self.transport.broadcast(&event);
        Ok(block)
    }

    /// Flips a task in the active stream and broadcasts the full block list.
    /// Returns the new completion flag.
    pub fn toggle_task(&mut self, block_id: &str) -> Result<bool, MeshError> {
        let stream = self.active_stream_mut()?;
        let completed = block::toggle_task(&mut stream.blocks, block_id)
            .ok_or_else(|| MeshError::NotATask(block_id.to_string()))?;
        let event = MeshEvent::UpdateStream {
            stream_id: stream.id.clone(),
            blocks: stream.blocks.clone(),
        };
        self.transport.broadcast(&event);
        Ok(completed)
    }

    /// Appends a chat message to the active stream and broadcasts it.
    pub fn send_chat(&mut self, content: &str) -> Result<ChatMessage, MeshError> {
        if content.trim().is_empty() {
            return Err(MeshError::EmptyMessage);
        }
        let message = ChatMessage::new(self.local.id.clone(), self.local.name.clone(), content);
        let stream = self.active_stream_mut()?;
        stream.messages.push(message.clone());
        let event = MeshEvent::NewChat {
            stream_id: stream.id.clone(),
            message: message.clone(),
        };
        self.transport.broadcast(&event);
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DecisionMetadata, DecisionStatus};
    use crate::transport::{LocalChannel, Subscription};

    struct Harness {
        channel: LocalChannel,
        probe: Subscription,
        _probe_transport: Arc<dyn Transport>,
    }

    impl Harness {
        fn new() -> Self {
            let channel = LocalChannel::new("engine-test");
            let probe_transport: Arc<dyn Transport> = Arc::new(channel.open());
            let probe = probe_transport.subscribe();
            Self {
                channel,
                probe,
                _probe_transport: probe_transport,
            }
        }

        fn engine(&self, id: &str, name: &str) -> ReplicationEngine {
            ReplicationEngine::with_peer_id(Arc::new(self.channel.open()), id, name)
        }

        fn sent(&mut self) -> Vec<MeshEvent> {
            self.probe.drain()
        }
    }

    fn hello(id: &str, name: &str) -> MeshEvent {
        MeshEvent::Hello {
            peer: Peer::new(id, name, false),
        }
    }

    fn stream_with(id: &str, blocks: Vec<Block>) -> CollabStream {
        CollabStream {
            id: id.into(),
            blocks,
            ..CollabStream::new("a stream", None)
        }
    }

    fn welcome_of(events: Vec<MeshEvent>) -> MeshSnapshot {
        events
            .into_iter()
            .find_map(|e| match e {
                MeshEvent::Welcome { state } => Some(state),
                _ => None,
            })
            .expect("no WELCOME was broadcast")
    }

    #[test]
    fn host_starts_with_default_stream_and_broadcasts_nothing() {
        let mut h = Harness::new();
        let mut host = h.engine("h", "Host");

        let id = host.host().unwrap();

        assert!(host.is_host());
        assert!(host.is_synced());
        assert_eq!(host.streams().len(), 1);
        assert_eq!(host.streams()[0].title, DEFAULT_STREAM_TITLE);
        assert_eq!(host.active_stream_id(), Some(id.as_str()));
        assert_eq!(host.peers().ids().collect::<Vec<_>>(), vec!["h"]);
        assert!(h.sent().is_empty());
    }

    #[test]
    fn join_broadcasts_hello_and_starts_empty() {
        let mut h = Harness::new();
        let mut joiner = h.engine("j1", "Dev-1");

        joiner.join().unwrap();

        assert_eq!(joiner.role(), Some(Role::Joiner));
        assert!(joiner.streams().is_empty());
        assert!(!joiner.is_synced());
        match h.sent().as_slice() {
            [MeshEvent::Hello { peer }] => {
                assert_eq!(peer.id, "j1");
                assert!(!peer.is_host);
            }
            other => panic!("expected a single HELLO, got {:?}", other),
        }
    }

    #[test]
    fn starting_twice_is_rejected() {
        let h = Harness::new();
        let mut host = h.engine("h", "Host");
        host.host().unwrap();
        assert!(matches!(host.join(), Err(MeshError::AlreadyJoined(Role::Host))));
        assert_eq!(host.streams().len(), 1);
    }

    #[test]
    fn events_before_joining_are_dropped() {
        let h = Harness::new();
        let mut idle = h.engine("x", "Idle");
        idle.handle_event(hello("j1", "Dev-1"));
        idle.handle_event(MeshEvent::CreateStream {
            stream: stream_with("a", Vec::new()),
        });
        assert!(idle.peers().is_empty());
        assert!(idle.streams().is_empty());
    }

    #[test]
    fn repeated_hello_registers_peer_once() {
        let mut h = Harness::new();
        let mut host = h.engine("h", "Host");
        host.host().unwrap();

        host.handle_event(hello("j1", "Dev-1"));
        host.handle_event(hello("j1", "Dev-1"));

        assert_eq!(host.peers().len(), 2);
        let welcomes: Vec<MeshSnapshot> = h
            .sent()
            .into_iter()
            .filter_map(|e| match e {
                MeshEvent::Welcome { state } => Some(state),
                _ => None,
            })
            .collect();
        assert_eq!(welcomes.len(), 2);
        assert_eq!(welcomes[1].peers.iter().filter(|p| p.id == "j1").count(), 1);
    }

    #[test]
    fn welcome_snapshot_is_complete() {
        let mut h = Harness::new();
        let mut host = h.engine("h", "Host");
        host.host().unwrap();
        host.handle_event(hello("j1", "Dev-1"));
        host.create_stream("design", None).unwrap();
        host.add_block(BlockKind::Note, "first").unwrap();
        h.sent();

        host.handle_event(MeshEvent::Hello {
            peer: Peer::new("j2", "Dev-2", true),
        });

        let state = welcome_of(h.sent());
        assert_eq!(state.streams, host.streams());
        let ids: Vec<&str> = state.peers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["h", "j1", "j2"]);
        assert!(!state.peers[2].is_host);
    }

    #[test]
    fn joiner_never_answers_hello() {
        let mut h = Harness::new();
        let mut joiner = h.engine("j1", "Dev-1");
        joiner.join().unwrap();
        h.sent();

        joiner.handle_event(hello("j2", "Dev-2"));

        assert!(joiner.peers().contains("j2"));
        assert!(h.sent().is_empty());
    }

    #[test]
    fn joiner_adopts_welcome_and_selects_first_stream() {
        let h = Harness::new();
        let mut joiner = h.engine("j1", "Dev-1");
        joiner.join().unwrap();
        let b1 = Block::new(BlockKind::Note, "b1");
        let streams = vec![stream_with("a", vec![b1])];
        let peers = vec![Peer::new("h", "Host", true), Peer::new("j1", "Dev-1", false)];

        joiner.handle_event(MeshEvent::Welcome {
            state: MeshSnapshot {
                streams: streams.clone(),
                peers: peers.clone(),
            },
        });

        assert_eq!(joiner.streams(), streams.as_slice());
        assert_eq!(joiner.peers().peers(), peers.as_slice());
        assert_eq!(joiner.active_stream_id(), Some("a"));
        assert!(joiner.is_synced());
    }

    #[test]
    fn welcome_keeps_an_existing_selection() {
        let h = Harness::new();
        let mut joiner = h.engine("j1", "Dev-1");
        joiner.join().unwrap();
        joiner.handle_event(MeshEvent::CreateStream {
            stream: stream_with("mine", Vec::new()),
        });
        joiner.select_stream("mine").unwrap();

        joiner.handle_event(MeshEvent::Welcome {
            state: MeshSnapshot {
                streams: vec![stream_with("a", Vec::new())],
                peers: Vec::new(),
            },
        });

        assert_eq!(joiner.active_stream_id(), Some("mine"));
        assert_eq!(joiner.streams().len(), 1);
    }

    #[test]
    fn host_ignores_welcome() {
        let h = Harness::new();
        let mut host = h.engine("h", "Host");
        host.host().unwrap();
        host.handle_event(hello("j1", "Dev-1"));
        let streams = host.streams().to_vec();
        let peers = host.peers().clone();

        host.handle_event(MeshEvent::Welcome {
            state: MeshSnapshot {
                streams: vec![stream_with("other", Vec::new())],
                peers: vec![Peer::new("h2", "Other Host", true)],
            },
        });

        assert_eq!(host.streams(), streams.as_slice());
        assert_eq!(host.peers(), &peers);
    }

    #[test]
    fn duplicate_create_stream_is_kept() {
        let h = Harness::new();
        let mut joiner = h.engine("j1", "Dev-1");
        joiner.join().unwrap();
        let stream = stream_with("dup", Vec::new());

        joiner.handle_event(MeshEvent::CreateStream { stream: stream.clone() });
        joiner.handle_event(MeshEvent::CreateStream { stream });

        assert_eq!(joiner.streams().iter().filter(|s| s.id == "dup").count(), 2);
    }

    #[test]
    fn last_applied_update_wins() {
        let h = Harness::new();
        let mut host = h.engine("h", "Host");
        host.host().unwrap();
        let b1 = Block::new(BlockKind::Note, "b1");
        let b2 = Block::new(BlockKind::Note, "b2");
        host.handle_event(MeshEvent::CreateStream {
            stream: stream_with("a", vec![b1.clone()]),
        });

        host.handle_event(MeshEvent::UpdateStream {
            stream_id: "a".into(),
            blocks: vec![b1.clone(), b2],
        });
        host.handle_event(MeshEvent::UpdateStream {
            stream_id: "a".into(),
            blocks: vec![b1.clone()],
        });

        assert_eq!(host.stream("a").unwrap().blocks, vec![b1]);
    }

    #[test]
    fn update_for_unknown_stream_changes_nothing() {
        let h = Harness::new();
        let mut host = h.engine("h", "Host");
        host.host().unwrap();
        let before = host.streams().to_vec();

        host.handle_event(MeshEvent::UpdateStream {
            stream_id: "nope".into(),
            blocks: vec![Block::new(BlockKind::Note, "lost")],
        });

        assert_eq!(host.streams(), before.as_slice());
    }

    #[test]
    fn custom_merge_policy_is_used() {
        fn keep_local(current: &[Block], _incoming: Vec<Block>) -> Vec<Block> {
            current.to_vec()
        }
        let h = Harness::new();
        let mut host = h.engine("h", "Host").with_merge_policy(keep_local);
        host.host().unwrap();
        let b1 = Block::new(BlockKind::Note, "b1");
        host.handle_event(MeshEvent::CreateStream {
            stream: stream_with("a", vec![b1.clone()]),
        });

        host.handle_event(MeshEvent::UpdateStream {
            stream_id: "a".into(),
            blocks: Vec::new(),
        });

        assert_eq!(host.stream("a").unwrap().blocks, vec![b1]);
    }

    #[test]
    fn chat_is_append_only_in_receipt_order() {
        let h = Harness::new();
        let mut joiner = h.engine("j1", "Dev-1");
        joiner.join().unwrap();
        joiner.handle_event(MeshEvent::CreateStream {
            stream: stream_with("a", Vec::new()),
        });
        joiner.select_stream("a").unwrap();
        let mine = joiner.send_chat("first").unwrap();

        let incoming: Vec<ChatMessage> = (0..3)
            .map(|i| ChatMessage::new("p2", "Dev-2", format!("msg {}", i)))
            .collect();
        for message in &incoming {
            joiner.handle_event(MeshEvent::NewChat {
                stream_id: "a".into(),
                message: message.clone(),
            });
        }

        let messages = &joiner.stream("a").unwrap().messages;
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], mine);
        assert_eq!(&messages[1..], incoming.as_slice());
    }

    #[test]
    fn peer_joined_and_left_update_registry() {
        let h = Harness::new();
        let mut joiner = h.engine("j1", "Dev-1");
        joiner.join().unwrap();

        joiner.handle_event(MeshEvent::PeerJoined {
            peer: Peer::new("p2", "Dev-2", false),
        });
        joiner.handle_event(MeshEvent::PeerJoined {
            peer: Peer::new("p2", "Dev-2", false),
        });
        assert_eq!(joiner.peers().len(), 2);

        joiner.handle_event(MeshEvent::PeerLeft { peer_id: "p2".into() });
        joiner.handle_event(MeshEvent::PeerLeft { peer_id: "ghost".into() });
        assert_eq!(joiner.peers().ids().collect::<Vec<_>>(), vec!["j1"]);
    }

    #[test]
    fn add_block_applies_locally_then_broadcasts_full_list() {
        let mut h = Harness::new();
        let mut host = h.engine("h", "Host");
        let stream_id = host.host().unwrap();

        let note = host.add_block(BlockKind::Note, "one").unwrap();
        let task = host.add_block(BlockKind::task(), "two").unwrap();

        assert_eq!(host.active_stream().unwrap().blocks, vec![note.clone(), task.clone()]);
        let sent = h.sent();
        assert_eq!(
            sent.last(),
            Some(&MeshEvent::UpdateStream {
                stream_id,
                blocks: vec![note, task],
            })
        );
    }

    #[test]
    fn decision_blocks_carry_their_record() {
        let h = Harness::new();
        let mut host = h.engine("h", "Host");
        host.host().unwrap();
        let record = DecisionMetadata {
            problem: "transport".into(),
            options: vec!["relay".into(), "webrtc".into()],
            rationale: "simpler".into(),
            status: DecisionStatus::Proposed,
        };

        let block = host.add_block(BlockKind::Decision(record.clone()), "use relay").unwrap();

        assert_eq!(block.kind, BlockKind::Decision(record));
    }

    #[test]
    fn toggle_task_changes_only_that_flag() {
        let mut h = Harness::new();
        let mut host = h.engine("h", "Host");
        let stream_id = host.host().unwrap();
        host.add_block(BlockKind::Note, "context").unwrap();
        let task = host.add_block(BlockKind::task(), "do it").unwrap();
        host.add_block(BlockKind::task(), "later").unwrap();
        let before = host.active_stream().unwrap().clone();
        h.sent();

        assert!(matches!(host.toggle_task(&task.id), Ok(true)));

        let after = host.active_stream().unwrap();
        assert_eq!(after.blocks[1].is_completed(), Some(true));
        assert_eq!(after.blocks[0], before.blocks[0]);
        assert_eq!(after.blocks[2], before.blocks[2]);
        assert_eq!(after.messages, before.messages);
        assert_eq!(after.title, before.title);
        assert_eq!(
            h.sent(),
            vec![MeshEvent::UpdateStream {
                stream_id,
                blocks: after.blocks.clone(),
            }]
        );
    }

    #[test]
    fn toggle_rejects_non_tasks() {
        let h = Harness::new();
        let mut host = h.engine("h", "Host");
        host.host().unwrap();
        let note = host.add_block(BlockKind::Note, "context").unwrap();
        assert!(matches!(host.toggle_task(&note.id), Err(MeshError::NotATask(_))));
    }

    #[test]
    fn local_edits_need_a_session_and_a_stream() {
        let h = Harness::new();
        let mut engine = h.engine("x", "Idle");
        assert!(matches!(engine.add_block(BlockKind::Note, "x"), Err(MeshError::NotJoined)));
        assert!(matches!(engine.create_stream("t", None), Err(MeshError::NotJoined)));

        engine.join().unwrap();
        assert!(matches!(engine.add_block(BlockKind::Note, "x"), Err(MeshError::NoActiveStream)));
        assert!(matches!(engine.send_chat("hi"), Err(MeshError::NoActiveStream)));
        assert!(matches!(engine.send_chat("   "), Err(MeshError::EmptyMessage)));
        assert!(matches!(engine.create_stream("  ", None), Err(MeshError::EmptyTitle)));
        assert!(matches!(engine.select_stream("nope"), Err(MeshError::UnknownStream(_))));
    }

    #[test]
    fn create_stream_selects_and_broadcasts() {
        let mut h = Harness::new();
        let mut host = h.engine("h", "Host");
        host.host().unwrap();

        let id = host
            .create_stream("Persisted", Some("mongodb://localhost/db".into()))
            .unwrap();

        assert_eq!(host.active_stream_id(), Some(id.as_str()));
        match h.sent().as_slice() {
            [MeshEvent::CreateStream { stream }] => {
                assert_eq!(stream.id, id);
                assert_eq!(stream.persistence_uri.as_deref(), Some("mongodb://localhost/db"));
            }
            other => panic!("expected CREATE_STREAM, got {:?}", other),
        }
    }
}
