//! Workbench client: session-synchronized access to a coding-agent backend
//!
//! This library is the client half of the workbench: it configures the remote
//! agent, manages a registry of source repositories, browses the selected
//! repository's file tree, and exchanges chat messages, all over one
//! persistent WebSocket. The rendering layer is deliberately absent; callers
//! drive a [`SessionHandle`] and render [`SessionStore`] snapshots however
//! they like.
//!
//! # Example
//!
//! ```ignore
//! use workbench_client::{ConnectionManager, Request, SessionEngine};
//!
//! let (conn, inbound) = ConnectionManager::connect("ws://127.0.0.1:8000/ws".into());
//! let (engine, handle) = SessionEngine::new(conn, inbound);
//! tokio::spawn(engine.run());
//!
//! handle.dispatch(Request::SendChatMessage { text: "hello".into() }).await?;
//! let transcript = handle.snapshot().chat.messages().to_vec();
//! ```

pub mod error;
pub mod session;

pub use error::{ClientError, Result};
pub use session::connection::{ConnectionHandle, ConnectionManager, ConnectionState};
pub use session::engine::{Request, SessionEngine, SessionHandle};
pub use session::protocol::{
    ChatMessage, Command, ConfigData, Event, FileNode, FileNodeKind, RepoAction, RepositoryDraft,
    RepositoryRecord, Sender,
};
pub use session::store::{Advisory, SessionStore, Severity, StatusLine};
