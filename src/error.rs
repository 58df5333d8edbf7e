//! Error types for the workbench client

use thiserror::Error;

use crate::session::dispatcher::DispatchError;
use crate::session::protocol::DecodeError;

/// Main error type for workbench client operations
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("protocol decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("session engine has shut down")]
    EngineClosed,
}

/// Result type alias for workbench client operations
pub type Result<T> = std::result::Result<T, ClientError>;
