use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Relay occupancy
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DiagnosticsResponse {
    pub n_channels: u32,
    pub n_conn: u32,
    pub n_frames_relayed: u64,
    pub n_frames_dropped: u64,
}
