//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Resolution(#[from] frontpage_identity::IdentityError),

    #[error("{action} failed ({status}): {message}")]
    Authentication {
        action: &'static str,
        status: u16,
        message: String,
    },

    #[error("Not authenticated. Log in with your handle and app password first.")]
    NotAuthenticated,

    #[error("{action} returned an unexpected response: {source}")]
    MalformedResponse {
        action: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Request failed: {0}")]
    Transport(#[from] frontpage_xrpc::TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] frontpage_storage::StorageError),

    #[error("Stored session could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}
