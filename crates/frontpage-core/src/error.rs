//! Core error types

use serde::Serialize;
use thiserror::Error;

use frontpage_post::PostError;
use frontpage_session::SessionError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("{0}")]
    Post(#[from] PostError),

    #[error("Storage error: {0}")]
    Storage(#[from] frontpage_storage::StorageError),

    #[error("Transport error: {0}")]
    Transport(#[from] frontpage_xrpc::TransportError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure category reported to the UI alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Bad caller input; never retried
    Validation,
    /// Handle or DID lookup failed
    Resolution,
    /// Login or refresh exchange rejected
    Authentication,
    /// Authorized action rejected after the refresh-and-retry
    Authorization,
    /// Any other failed request
    Request,
    /// No stored session
    NotAuthenticated,
    Storage,
    Internal,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Session(e) => session_kind(e),
            CoreError::Post(e) => match e {
                PostError::Validation(_) => ErrorKind::Validation,
                PostError::Authorization { .. } => ErrorKind::Authorization,
                PostError::Request { .. }
                | PostError::MalformedResponse(_)
                | PostError::Transport(_) => ErrorKind::Request,
                PostError::Session(e) => session_kind(e),
            },
            CoreError::Storage(_) => ErrorKind::Storage,
            CoreError::Transport(_) | CoreError::Config(_) => ErrorKind::Internal,
        }
    }
}

fn session_kind(error: &SessionError) -> ErrorKind {
    match error {
        SessionError::Validation(_) => ErrorKind::Validation,
        SessionError::Resolution(_) => ErrorKind::Resolution,
        SessionError::Authentication { .. } => ErrorKind::Authentication,
        SessionError::NotAuthenticated => ErrorKind::NotAuthenticated,
        SessionError::MalformedResponse { .. } | SessionError::Transport(_) => ErrorKind::Request,
        SessionError::Storage(_) | SessionError::Serialization(_) => ErrorKind::Storage,
    }
}
