//! Frontpage Identity Resolution
//!
//! handle → DID → personal data server. Plain request/decode steps with no
//! retries; any failure is surfaced to the caller immediately.

mod error;
mod handle;
mod resolver;

pub use error::IdentityError;
pub use handle::{normalize_handle, strip_trailing_slashes};
pub use resolver::{
    IdentityResolver, ResolvedIdentity, ResolverConfig, DEFAULT_PLC_DIRECTORY,
    DEFAULT_RESOLVE_HANDLE_ENDPOINT, PDS_SERVICE_TYPE,
};

pub type Result<T> = std::result::Result<T, IdentityError>;
