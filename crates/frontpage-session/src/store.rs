//! Session persistence

use std::sync::Arc;

use frontpage_storage::KeyValueStore;

use crate::session::Session;
use crate::Result;

/// Storage key of the single session record.
pub const SESSION_KEY: &str = "frontpageAuth";

/// Process-wide holder of the current session. Owns the persisted copy.
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn get(&self) -> Result<Option<Session>> {
        match self.backend.get(SESSION_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serializes fully before touching the backend, so a failed encode
    /// never replaces the stored record.
    pub fn set(&self, session: &Session) -> Result<()> {
        let raw = serde_json::to_string(session)?;
        self.backend.set(SESSION_KEY, &raw)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.remove(SESSION_KEY)?;
        Ok(())
    }
}

impl Clone for SessionStore {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}
