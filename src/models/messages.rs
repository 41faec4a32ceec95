use serde::{Deserialize, Serialize};

use super::block::Block;
use super::peer::{Peer, PeerId};
use super::stream::{ChatMessage, CollabStream};

/// Full replica state shipped by the host to joiners.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    pub streams: Vec<CollabStream>,
    pub peers: Vec<Peer>,
}

/// Every message exchanged between replicas. Nothing else goes over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeshEvent {
    Hello {
        peer: Peer,
    },
    Welcome {
        state: MeshSnapshot,
    },
    CreateStream {
        stream: CollabStream,
    },
    #[serde(rename_all = "camelCase")]
    UpdateStream {
        stream_id: String,
        blocks: Vec<Block>,
    },
    #[serde(rename_all = "camelCase")]
    NewChat {
        stream_id: String,
        message: ChatMessage,
    },
    PeerJoined {
        peer: Peer,
    },
    #[serde(rename_all = "camelCase")]
    PeerLeft {
        peer_id: PeerId,
    },
}

impl MeshEvent {
    /// Wire tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            MeshEvent::Hello { .. } => "HELLO",
            MeshEvent::Welcome { .. } => "WELCOME",
            MeshEvent::CreateStream { .. } => "CREATE_STREAM",
            MeshEvent::UpdateStream { .. } => "UPDATE_STREAM",
            MeshEvent::NewChat { .. } => "NEW_CHAT",
            MeshEvent::PeerJoined { .. } => "PEER_JOINED",
            MeshEvent::PeerLeft { .. } => "PEER_LEFT",
        }
    }
}
