//! Session synchronization engine
//!
//! Owns the persistent duplex connection to the backend and reconciles
//! optimistic local actions with asynchronous server acknowledgements.
//!
//! # Architecture
//!
//! ```text
//! presentation ──► SessionHandle ──► SessionEngine (one task, owns the store)
//!                                      │
//!                     ┌────────────────┼─────────────────┐
//!                     │                │                 │
//!                dispatcher        SessionStore      protocol codec
//!              (validate +       ┌─────────────┐    (encode/decode)
//!               optimistic       │ config slice│          │
//!               transition)      │ repos slice │          │
//!                                │ tree  slice │   ConnectionManager
//!                                │ chat  slice │   (WebSocket, bounded
//!                                └─────────────┘    reconnection)
//! ```
//!
//! # Protocol
//!
//! All messages are JSON over WebSocket, `{"type": ..., "payload": ...}`:
//!
//! ```json
//! // Client -> Server
//! {"type": "SUBMIT_CONFIG", "payload": {"agentCredential": "...", "repositories": []}}
//! {"type": "FETCH_FILES", "payload": {"repository_id": "..."}}
//!
//! // Server -> Client
//! {"type": "REPOSITORIES_LIST", "payload": {"repositories": [...]}}
//! {"type": "NEW_CHAT_MESSAGE", "payload": {"id": "...", "sender": "agent", ...}}
//! ```

pub mod chat;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod engine;
pub mod file_tree;
pub mod protocol;
pub mod repos;
pub mod store;

pub use connection::{ConnectionHandle, ConnectionManager, ConnectionState};
pub use engine::{Request, SessionEngine, SessionHandle};
pub use protocol::{Command, Event};
pub use store::SessionStore;
