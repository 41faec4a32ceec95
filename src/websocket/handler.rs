use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::relay_state::{RelayFrame, RelayState};
use crate::transport::decode_event;

/// WebSocket handler for one mesh channel
pub async fn websocket_handler(
    Path(channel): Path<String>,
    ws: WebSocketUpgrade,
    State(state): State<Arc<RelayState>>,
) -> Response {
    info!("New relay connection attempt on channel {}", channel);
    ws.on_upgrade(move |socket| handle_socket(socket, channel, state))
}

/// Relays every frame from this connection to all other connections on the
/// channel. Nothing is stored and nothing is echoed back.
async fn handle_socket(socket: WebSocket, channel: String, state: Arc<RelayState>) {
    // Generate unique connection ID to identify this client
    let connection_id = Uuid::new_v4().to_string();
    info!("Relay connection {} joined channel {}", connection_id, channel);

    let (mut sender, mut receiver) = socket.split();

    let (bc, mut rbc) = state.join(&channel).await;

    // Frames from the client go to the channel
    let mut inbound_task = {
        let connection_id = connection_id.clone();
        let channel = channel.clone();
        let state = state.clone();
        tokio::spawn(async move {
            while let Some(message) = receiver.next().await {
                let text = match message {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        debug!("Relay connection {} errored: {}", connection_id, e);
                        break;
                    }
                };

                match decode_event(&text) {
                    Ok(event) => debug!("Relaying {} on channel {}", event.kind(), channel),
                    Err(e) => {
                        warn!("Dropping malformed frame on channel {}: {}", channel, e);
                        state.record_dropped(1);
                        continue;
                    }
                }

                let frame = RelayFrame {
                    sender_id: connection_id.clone(),
                    content: text,
                };
                // No receivers just means nobody else is listening right now.
                if bc.send(frame).is_ok() {
                    state.record_relayed();
                }
            }
        })
    };

    // Frames from the channel go to the client
    let mut outbound_task = {
        let connection_id = connection_id.clone();
        let state = state.clone();
        tokio::spawn(async move {
            loop {
                match rbc.recv().await {
                    Ok(frame) => {
                        // Skip frames from this connection to prevent echo
                        if frame.sender_id == connection_id {
                            continue;
                        }
                        if sender.send(Message::Text(frame.content)).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!("Relay connection {} lagged, {} frames lost", connection_id, n);
                        state.record_dropped(n);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    // Wait for either task to finish, then stop the other and wait until it
    // is gone so its channel receiver is dropped before pruning.
    tokio::select! {
        _ = (&mut inbound_task) => {
            outbound_task.abort();
            let _ = outbound_task.await;
        }
        _ = (&mut outbound_task) => {
            inbound_task.abort();
            let _ = inbound_task.await;
        }
    };

    state.prune().await;
    info!("Relay connection {} left channel {}", connection_id, channel);
}
