//! Host-anchored replication of collaborative streams over a broadcast transport.
//!
//! There is no merge beyond last-applied-wins and no repair: a replica that
//! misses an event stays diverged until the next event that overwrites the
//! affected state.

pub mod engine;
pub mod merge;
pub mod node;
pub mod registry;
pub mod role;

pub use engine::{ReplicationEngine, DEFAULT_STREAM_TITLE};
pub use merge::MergePolicy;
pub use node::{MeshNode, NodeCommand, ReplicaView};
pub use registry::PeerRegistry;
pub use role::{Role, SessionPhase};
