use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::info;

use crate::models::DiagnosticsResponse;
use crate::websocket::RelayState;

/// Relay occupancy and traffic counters
pub async fn diagnostics(State(state): State<Arc<RelayState>>) -> Json<DiagnosticsResponse> {
    let n_channels = state.channel_count().await as u32;
    let n_conn = state.connection_count().await as u32;
    let n_frames_relayed = state.relayed();
    let n_frames_dropped = state.dropped();

    info!(
        "Diagnostics: Channels: {}, Conn: {}, Relayed: {}, Dropped: {}",
        n_channels, n_conn, n_frames_relayed, n_frames_dropped
    );

    Json(DiagnosticsResponse {
        n_channels,
        n_conn,
        n_frames_relayed,
        n_frames_dropped,
    })
}
