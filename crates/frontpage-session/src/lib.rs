//! Frontpage Session Management
//!
//! - A Session is the single persisted credential record (one account only)
//! - Sessions are created by login, refreshed in place, destroyed by logout
//! - Every authorized call goes through [`SessionManager::ensure_valid`] first
//! - A failed refresh leaves the stored session in place

mod error;
mod manager;
mod session;
mod store;
pub mod token;

pub use error::SessionError;
pub use manager::{LoginRequest, SessionManager, SessionState};
pub use session::{CreateSessionOutput, RefreshSessionOutput, Session};
pub use store::{SessionStore, SESSION_KEY};

pub type Result<T> = std::result::Result<T, SessionError>;
