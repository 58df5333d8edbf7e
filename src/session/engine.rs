//! Session engine event loop
//!
//! One task owns the [`SessionStore`] and is the only place it mutates.
//! Inbound frames, dispatcher requests and connection-state changes are
//! multiplexed through a single `select!` loop, so events apply strictly in
//! receipt order and callers never observe a half-applied transition. After
//! every step the loop publishes a store snapshot through a watch channel for
//! the presentation layer to render.

use tokio::sync::{mpsc, watch};

use crate::error::ClientError;
use crate::session::connection::{ConnectionHandle, ConnectionState};
use crate::session::dispatcher;
use crate::session::protocol::{self, Command, ConfigData, RepositoryDraft};
use crate::session::store::{Advisory, SessionStore, Severity};

const REQUEST_BUFFER: usize = 64;

/// A presentation-layer request, translated by the dispatcher into an
/// optimistic store transition plus an outgoing command.
#[derive(Debug, Clone)]
pub enum Request {
    Configure(ConfigData),
    FetchFileTree { repository_id: String },
    AddRepository(RepositoryDraft),
    UpdateRepository {
        repository_id: String,
        repository: RepositoryDraft,
    },
    DeleteRepository { repository_id: String },
    SelectRepository { repository_id: String },
    SendChatMessage { text: String },
    /// Full session reset: configuration, chat and file tree are cleared,
    /// the repository registry stays for resync.
    Reset,
}

/// Cloneable handle for the presentation layer.
#[derive(Clone)]
pub struct SessionHandle {
    requests: mpsc::Sender<Request>,
    snapshots: watch::Receiver<SessionStore>,
    connection: watch::Receiver<ConnectionState>,
}

impl SessionHandle {
    /// Queue a request for the engine task.
    pub async fn dispatch(&self, request: Request) -> crate::Result<()> {
        self.requests
            .send(request)
            .await
            .map_err(|_| ClientError::EngineClosed)
    }

    /// Latest published store snapshot.
    pub fn snapshot(&self) -> SessionStore {
        self.snapshots.borrow().clone()
    }

    /// Watch receiver over store snapshots, for render loops.
    pub fn snapshots(&self) -> watch::Receiver<SessionStore> {
        self.snapshots.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.clone()
    }
}

pub struct SessionEngine {
    store: SessionStore,
    conn: ConnectionHandle,
    inbound: mpsc::Receiver<String>,
    requests: mpsc::Receiver<Request>,
    snapshot_tx: watch::Sender<SessionStore>,
}

impl SessionEngine {
    /// Wire an engine to a running connection. `inbound` must be the receiver
    /// returned by [`crate::session::connection::ConnectionManager::connect`].
    pub fn new(conn: ConnectionHandle, inbound: mpsc::Receiver<String>) -> (Self, SessionHandle) {
        let store = SessionStore::new();
        let (request_tx, request_rx) = mpsc::channel(REQUEST_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(store.clone());
        let handle = SessionHandle {
            requests: request_tx,
            snapshots: snapshot_rx,
            connection: conn.status(),
        };
        let engine = SessionEngine {
            store,
            conn,
            inbound,
            requests: request_rx,
            snapshot_tx,
        };
        (engine, handle)
    }

    /// Run until every [`SessionHandle`] has been dropped. A settled-closed
    /// connection does not end the loop: the store keeps serving snapshots
    /// with the disconnection surfaced in the status line.
    pub async fn run(mut self) {
        let mut status_rx = self.conn.status();
        let mut inbound_open = true;
        let mut status_open = true;
        loop {
            tokio::select! {
                frame = self.inbound.recv(), if inbound_open => match frame {
                    Some(raw) => self.handle_frame(&raw),
                    None => {
                        inbound_open = false;
                        self.handle_transition(ConnectionState::Closed);
                    }
                },
                request = self.requests.recv() => match request {
                    Some(request) => self.handle_request(request),
                    None => break,
                },
                changed = status_rx.changed(), if status_open => match changed {
                    Ok(()) => {
                        let state = *status_rx.borrow_and_update();
                        self.handle_transition(state);
                    }
                    Err(_) => status_open = false,
                }
            }
            let _ = self.snapshot_tx.send(self.store.clone());
        }
        tracing::debug!("session engine stopped");
    }

    fn handle_frame(&mut self, raw: &str) {
        match protocol::decode(raw) {
            Ok(event) => self.store.apply_event(event),
            Err(e) => tracing::warn!("dropping undecodable frame: {}", e),
        }
    }

    fn handle_request(&mut self, request: Request) {
        let dispatched: Result<Command, _> = match request {
            Request::Configure(data) => dispatcher::configure(&mut self.store, data),
            Request::FetchFileTree { repository_id } => {
                dispatcher::fetch_file_tree(&mut self.store, &repository_id)
            }
            Request::AddRepository(repository) => {
                dispatcher::add_repository(&mut self.store, repository)
            }
            Request::UpdateRepository {
                repository_id,
                repository,
            } => dispatcher::update_repository(&mut self.store, &repository_id, repository),
            Request::DeleteRepository { repository_id } => {
                dispatcher::delete_repository(&mut self.store, &repository_id)
            }
            Request::SelectRepository { repository_id } => {
                dispatcher::select_repository(&mut self.store, &repository_id)
            }
            Request::SendChatMessage { text } => {
                dispatcher::send_chat_message(&mut self.store, &text)
            }
            Request::Reset => {
                self.store.reset();
                return;
            }
        };
        match dispatched {
            Ok(command) => match protocol::encode(&command) {
                Ok(frame) => self.conn.send(frame),
                Err(e) => tracing::error!("failed to encode command: {}", e),
            },
            Err(e) => {
                tracing::warn!("request rejected: {}", e);
                self.store
                    .set_status(Advisory::error(e.to_string()));
            }
        }
    }

    /// Every transition surfaces advisory text; a settled close is the one
    /// state that warrants error severity, since no automatic retry follows.
    fn handle_transition(&mut self, state: ConnectionState) {
        let severity = if state == ConnectionState::Closed {
            Severity::Error
        } else {
            Severity::Normal
        };
        self.store.set_status(Advisory {
            severity,
            text: state.status_text().to_string(),
        });
    }
}
