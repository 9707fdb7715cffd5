//! Identity resolution error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Handle resolution failed ({0})")]
    HandleStatus(u16),

    #[error("Handle resolution response missing DID")]
    MissingDid,

    #[error("DID document lookup failed ({0})")]
    DocumentStatus(u16),

    #[error("Unable to determine personal data server for {0}")]
    NoPersonalDataServer(String),

    #[error("Unsupported DID method: {0}")]
    UnsupportedDid(String),

    #[error("Invalid resolver endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Malformed {what} response: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Identity lookup request failed: {0}")]
    Transport(#[from] frontpage_xrpc::TransportError),
}
