//! Frontpage Storage Layer
//!
//! Durable key-value persistence for the credential store.
//! Every write is a single statement, so readers never observe a partial value.

mod database;
mod error;
mod memory;
mod migrations;

pub use database::Database;
pub use error::StorageError;
pub use memory::MemoryStore;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Minimal persistence contract: string values addressed by string keys.
///
/// Implementations must make each call atomic and, for anything other than
/// test doubles, durable across process restarts.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
