use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use super::engine::ReplicationEngine;
use super::role::Role;
use crate::error::MeshError;
use crate::models::{BlockKind, CollabStream, Peer};
use crate::transport::Subscription;

/// Local user actions fed into a running [`MeshNode`].
#[derive(Debug)]
pub enum NodeCommand {
    CreateStream {
        title: String,
        persistence_uri: Option<String>,
    },
    SelectStream(String),
    AddBlock {
        kind: BlockKind,
        content: String,
    },
    ToggleTask(String),
    SendChat(String),
    Inspect(oneshot::Sender<ReplicaView>),
}

/// Copy of a replica's state, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaView {
    pub local: Peer,
    pub role: Option<Role>,
    pub synced: bool,
    pub streams: Vec<CollabStream>,
    pub peers: Vec<Peer>,
    pub active_stream_id: Option<String>,
}

impl ReplicaView {
    pub fn of(engine: &ReplicationEngine) -> Self {
        Self {
            local: engine.local_peer().clone(),
            role: engine.role(),
            synced: engine.is_synced(),
            streams: engine.streams().to_vec(),
            peers: engine.peers().peers().to_vec(),
            active_stream_id: engine.active_stream_id().map(str::to_string),
        }
    }

    pub fn active_stream(&self) -> Option<&CollabStream> {
        let id = self.active_stream_id.as_deref()?;
        self.streams.iter().find(|s| s.id == id)
    }
}

/// Drives one replica: inbound events and local commands are handled one at
/// a time on a single task, so the engine needs no locking.
pub struct MeshNode {
    engine: ReplicationEngine,
    subscription: Subscription,
    welcome_timeout: Option<Duration>,
}

impl MeshNode {
    /// Subscribes to the engine's transport, then hosts or joins. Subscribing
    /// first means a WELCOME sent right after our HELLO is not missed.
    pub fn start(mut engine: ReplicationEngine, role: Role) -> Result<Self, MeshError> {
        let subscription = engine.transport().subscribe();
        engine.start_as(role)?;
        Ok(Self {
            engine,
            subscription,
            welcome_timeout: None,
        })
    }

    /// Logs a warning if a joiner is still without a snapshot after `timeout`.
    /// Purely diagnostic.
    pub fn with_welcome_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.welcome_timeout = timeout;
        self
    }

    pub fn engine(&self) -> &ReplicationEngine {
        &self.engine
    }

    pub fn apply(&mut self, command: NodeCommand) {
        let result = match command {
            NodeCommand::CreateStream { title, persistence_uri } => {
                self.engine.create_stream(&title, persistence_uri).map(|_| ())
            }
            NodeCommand::SelectStream(id) => self.engine.select_stream(&id),
            NodeCommand::AddBlock { kind, content } => self.engine.add_block(kind, &content).map(|_| ()),
            NodeCommand::ToggleTask(id) => self.engine.toggle_task(&id).map(|_| ()),
            NodeCommand::SendChat(content) => self.engine.send_chat(&content).map(|_| ()),
            NodeCommand::Inspect(reply) => {
                let _ = reply.send(ReplicaView::of(&self.engine));
                Ok(())
            }
        };
        if let Err(e) = result {
            warn!("Local edit rejected: {}", e);
        }
    }

    /// Runs until the command channel closes or the transport goes away, and
    /// hands the engine back.
    pub async fn run(mut self, mut commands: mpsc::Receiver<NodeCommand>) -> ReplicationEngine {
        let timeout = self.welcome_timeout.filter(|_| !self.engine.is_synced());
        let mut watching = timeout.is_some();
        let welcome_deadline = tokio::time::sleep(timeout.unwrap_or(Duration::MAX));
        tokio::pin!(welcome_deadline);

        loop {
            tokio::select! {
                event = self.subscription.next_event() => match event {
                    Some(event) => self.engine.handle_event(event),
                    None => {
                        warn!("Transport closed, stopping mesh node");
                        break;
                    }
                },
                command = commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
                _ = &mut welcome_deadline, if watching => {
                    watching = false;
                    if !self.engine.is_synced() {
                        warn!(
                            "No WELCOME received after {:?}; is a host running on this channel?",
                            self.welcome_timeout.unwrap_or_default()
                        );
                    }
                }
            }
        }
        info!("Mesh node for {} stopped", self.engine.local_peer().name);
        self.engine
    }
}
