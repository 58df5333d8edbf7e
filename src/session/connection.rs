//! WebSocket connection manager
//!
//! Owns the single duplex channel to the backend. Publishes connection state
//! through a watch channel, queues outbound frames through an mpsc channel,
//! and delivers inbound text frames to the single consumer handed out by
//! [`ConnectionManager::connect`].
//!
//! Reconnection policy: an unexpected close retries up to
//! [`MAX_RECONNECT_ATTEMPTS`] times with a fixed [`RECONNECT_DELAY`] between
//! attempts. A manual [`ConnectionHandle::close`] never reconnects. Reaching
//! the ceiling leaves the manager in `Closed` with no further retries; the
//! surrounding system surfaces that as a persistent disconnection.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// Retry ceiling for unexpected closes.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Fixed delay between reconnect attempts.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

const OUTBOUND_BUFFER: usize = 64;
const INBOUND_BUFFER: usize = 256;

/// Lifecycle of the underlying channel. Owned exclusively by the connection
/// task; observers read it through the watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Uninstantiated,
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    /// Advisory display text for this state. Never part of the application
    /// data model.
    pub fn status_text(self) -> &'static str {
        match self {
            ConnectionState::Uninstantiated => "Not connected",
            ConnectionState::Connecting => "Connecting to backend...",
            ConnectionState::Open => "Connected",
            ConnectionState::Closing => "Disconnecting...",
            ConnectionState::Closed => "Disconnected",
        }
    }
}

/// Cloneable handle to a running connection task.
#[derive(Clone)]
pub struct ConnectionHandle {
    outbound: mpsc::Sender<String>,
    status: watch::Receiver<ConnectionState>,
    close: mpsc::Sender<()>,
}

impl ConnectionHandle {
    /// Current channel state.
    pub fn state(&self) -> ConnectionState {
        *self.status.borrow()
    }

    /// Watch receiver for state transitions; changes are published
    /// synchronously with each transition.
    pub fn status(&self) -> watch::Receiver<ConnectionState> {
        self.status.clone()
    }

    /// Queue a frame for transmission. Dropped with a logged warning when the
    /// channel is not open; callers that care must check [`Self::state`] and
    /// re-issue after reconnection.
    pub fn send(&self, frame: String) {
        if self.state() != ConnectionState::Open {
            tracing::warn!("dropping outbound frame, connection not open");
            return;
        }
        if self.outbound.try_send(frame).is_err() {
            tracing::warn!("outbound queue full or closed, frame dropped");
        }
    }

    /// Request a manual close. The connection task sends a close frame and
    /// settles in `Closed` without reconnecting.
    pub fn close(&self) {
        let _ = self.close.try_send(());
    }
}

/// Spawns and supervises the connection task.
pub struct ConnectionManager {
    url: String,
    outbound_rx: mpsc::Receiver<String>,
    inbound_tx: mpsc::Sender<String>,
    status_tx: watch::Sender<ConnectionState>,
    close_rx: mpsc::Receiver<()>,
}

enum PumpExit {
    /// Channel lost unexpectedly; eligible for reconnection.
    Lost,
    /// Closed on purpose (manual close or consumer gone); no reconnection.
    Manual,
}

impl ConnectionManager {
    /// Open the channel to `url`. Returns the shared handle plus the single
    /// inbound consumer; the connection task runs until closed.
    pub fn connect(url: String) -> (ConnectionHandle, mpsc::Receiver<String>) {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_BUFFER);
        let (status_tx, status_rx) = watch::channel(ConnectionState::Uninstantiated);
        let (close_tx, close_rx) = mpsc::channel(1);

        let manager = ConnectionManager {
            url,
            outbound_rx,
            inbound_tx,
            status_tx,
            close_rx,
        };
        tokio::spawn(manager.run());

        let handle = ConnectionHandle {
            outbound: outbound_tx,
            status: status_rx,
            close: close_tx,
        };
        (handle, inbound_rx)
    }

    async fn run(mut self) {
        let mut attempts = 0u32;
        loop {
            self.publish(ConnectionState::Connecting);
            tokio::select! {
                result = connect_async(self.url.as_str()) => match result {
                    Ok((ws, _)) => {
                        tracing::info!("connected to {}", self.url);
                        attempts = 0;
                        self.publish(ConnectionState::Open);
                        match self.pump(ws).await {
                            PumpExit::Manual => {
                                self.publish(ConnectionState::Closed);
                                return;
                            }
                            PumpExit::Lost => {
                                tracing::warn!("connection to {} lost", self.url);
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!("connect to {} failed: {}", self.url, e);
                    }
                },
                _ = self.close_rx.recv() => {
                    self.publish(ConnectionState::Closed);
                    return;
                }
            }

            attempts += 1;
            if attempts >= MAX_RECONNECT_ATTEMPTS {
                tracing::error!(
                    "giving up after {} reconnect attempts to {}",
                    attempts,
                    self.url
                );
                self.publish(ConnectionState::Closed);
                return;
            }
            self.publish(ConnectionState::Closed);
            tokio::select! {
                _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                _ = self.close_rx.recv() => {
                    self.publish(ConnectionState::Closed);
                    return;
                }
            }
        }
    }

    /// Run one open channel until it closes. Forwards inbound text frames to
    /// the consumer, drains the outbound queue onto the socket, and answers
    /// pings.
    async fn pump(&mut self, ws: WebSocketStream<MaybeTlsStream<TcpStream>>) -> PumpExit {
        let (mut sink, mut stream) = ws.split();
        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if self.inbound_tx.send(text).await.is_err() {
                            // Consumer dropped: nobody left to reconnect for.
                            return PumpExit::Manual;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => return PumpExit::Lost,
                    Some(Err(e)) => {
                        tracing::warn!("websocket error: {}", e);
                        return PumpExit::Lost;
                    }
                    Some(Ok(_)) => {}
                },
                out = self.outbound_rx.recv() => match out {
                    Some(text) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            tracing::warn!("websocket send failed: {}", e);
                            return PumpExit::Lost;
                        }
                    }
                    None => return PumpExit::Manual,
                },
                _ = self.close_rx.recv() => {
                    self.publish(ConnectionState::Closing);
                    let _ = sink.send(Message::Close(None)).await;
                    return PumpExit::Manual;
                }
            }
        }
    }

    fn publish(&self, state: ConnectionState) {
        tracing::debug!("connection state -> {:?}", state);
        let _ = self.status_tx.send(state);
    }
}
