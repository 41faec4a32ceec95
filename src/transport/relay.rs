use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use super::fanout::Fanout;
use super::{encode_event, Subscription, Transport};
use crate::error::MeshError;
use crate::models::MeshEvent;

/// Websocket client attached to one channel of a relay server.
pub struct RelayTransport {
    url: String,
    outbound: mpsc::UnboundedSender<String>,
    fanout: Fanout,
    open: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

/// Websocket url of `channel` on the relay at `relay_url`.
pub fn channel_url(relay_url: &str, channel: &str) -> String {
    format!("{}/mesh/{}", relay_url.trim_end_matches('/'), channel)
}

impl RelayTransport {
    pub async fn connect(relay_url: &str, channel: &str) -> Result<Self, MeshError> {
        let url = channel_url(relay_url, channel);
        let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| MeshError::Transport(format!("failed to connect to {}: {}", url, e)))?;
        info!("Connected to relay at {}", url);

        let (mut sink, mut stream) = socket.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let fanout = Fanout::new();
        let open = Arc::new(AtomicBool::new(true));

        let writer = tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::text(frame)).await {
                    warn!("Relay send failed: {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader = {
            let fanout = fanout.clone();
            let open = open.clone();
            tokio::spawn(async move {
                while let Some(message) = stream.next().await {
                    match message {
                        Ok(Message::Text(text)) => fanout.deliver(text.as_str()),
                        Ok(Message::Close(_)) => break,
                        Ok(_) => continue,
                        Err(e) => {
                            warn!("Relay receive failed: {}", e);
                            break;
                        }
                    }
                }
                open.store(false, Ordering::SeqCst);
                fanout.clear();
                debug!("Relay reader stopped");
            })
        };

        Ok(Self {
            url,
            outbound,
            fanout,
            open,
            reader,
            writer,
        })
    }
}

impl Transport for RelayTransport {
    fn broadcast(&self, event: &MeshEvent) {
        if !self.is_open() {
            debug!("Relay connection closed, dropping {}", event.kind());
            return;
        }
        match encode_event(event) {
            Ok(frame) => {
                if self.outbound.send(frame).is_err() {
                    debug!("Relay writer gone, dropping {}", event.kind());
                }
            }
            Err(e) => error!("Failed to encode {}: {}", event.kind(), e),
        }
    }

    fn subscribe(&self) -> Subscription {
        self.fanout.subscribe()
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            self.reader.abort();
            self.writer.abort();
            self.fanout.clear();
            info!("Disconnected from relay at {}", self.url);
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl Drop for RelayTransport {
    fn drop(&mut self) {
        self.close();
    }
}
