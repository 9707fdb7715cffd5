//! Post error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostError {
    #[error("{0}")]
    Validation(String),

    #[error("Post not authorized ({status}): {message}")]
    Authorization { status: u16, message: String },

    #[error("Post failed ({status}): {body}")]
    Request { status: u16, body: String },

    #[error("{0}")]
    Session(#[from] frontpage_session::SessionError),

    #[error("Post response could not be read: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("Request failed: {0}")]
    Transport(#[from] frontpage_xrpc::TransportError),
}
