//! Frontpage XRPC plumbing
//!
//! The network transport is an injected collaborator: everything above this
//! crate talks to [`HttpTransport`], never to `reqwest` directly.

mod error;
mod transport;

#[cfg(feature = "test-util")]
pub mod testing;

pub use error::TransportError;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport, XrpcErrorBody};

pub type Result<T> = std::result::Result<T, TransportError>;

/// XRPC method identifiers used by the poster.
pub mod nsid {
    pub const RESOLVE_HANDLE: &str = "com.atproto.identity.resolveHandle";
    pub const CREATE_SESSION: &str = "com.atproto.server.createSession";
    pub const REFRESH_SESSION: &str = "com.atproto.server.refreshSession";
    pub const CREATE_RECORD: &str = "com.atproto.repo.createRecord";
}

/// Build `<base>/xrpc/<nsid>`, tolerating a trailing slash on `base`.
pub fn xrpc_url(base: &str, nsid: &str) -> String {
    format!("{}/xrpc/{}", base.trim_end_matches('/'), nsid)
}
