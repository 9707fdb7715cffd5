//! Frontpage Poster Core
//!
//! Coordination layer for the poster. Owns the credential store, the session
//! lifecycle and the publisher. The UI is stateless and speaks only the
//! command protocol in [`commands`].

pub mod commands;
mod config;
mod error;
mod frontpage;
pub mod host;

pub use commands::{Command, CommandResult, Reply, SessionInfo};
pub use config::Config;
pub use error::{CoreError, ErrorKind};
pub use frontpage::Frontpage;

// Re-export core components
pub use frontpage_identity::{IdentityError, IdentityResolver, ResolvedIdentity, ResolverConfig};
pub use frontpage_post::{CreatedRecord, PostDraft, PostError, PostPublisher};
pub use frontpage_session::{LoginRequest, Session, SessionError, SessionManager, SessionState};
pub use frontpage_storage::{Database, KeyValueStore, MemoryStore, StorageError};
pub use frontpage_xrpc::{HttpTransport, ReqwestTransport, TransportError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging. Output goes to stderr so stdout stays free for replies.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
