//! Main poster state container

use std::sync::Arc;

use frontpage_identity::IdentityResolver;
use frontpage_post::{CreatedRecord, PostDraft, PostPublisher};
use frontpage_session::{LoginRequest, Session, SessionManager, SessionState, SessionStore};
use frontpage_storage::{Database, KeyValueStore};
use frontpage_xrpc::{HttpTransport, ReqwestTransport};

use crate::config::Config;
use crate::Result;

/// Owns the session lifecycle and the publisher. Every command from the UI
/// flows through here.
pub struct Frontpage {
    config: Config,
    publisher: PostPublisher,
}

impl Frontpage {
    /// Open the credential database and build the HTTP client.
    pub fn new(config: Config) -> Result<Self> {
        let db = Database::open(&config.database_path)?;
        let transport = ReqwestTransport::new(config.request_timeout())?;

        tracing::info!(database = %config.database_path.display(), "Opened credential store");

        Ok(Self::with_parts(config, Arc::new(transport), Arc::new(db)))
    }

    /// Assemble from explicit collaborators.
    pub fn with_parts(
        config: Config,
        transport: Arc<dyn HttpTransport>,
        backend: Arc<dyn KeyValueStore>,
    ) -> Self {
        let resolver = IdentityResolver::new(Arc::clone(&transport), config.resolver_config());
        let sessions = SessionManager::new(
            Arc::clone(&transport),
            resolver,
            SessionStore::new(backend),
        )
        .with_expiry_skew(config.token_expiry_skew_secs);
        let publisher = PostPublisher::new(transport, sessions);

        Self { config, publisher }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session_manager(&self) -> &SessionManager {
        self.publisher.sessions()
    }

    pub fn session_state(&self) -> Result<SessionState> {
        Ok(self.session_manager().state()?)
    }

    pub fn current_session(&self) -> Result<Option<Session>> {
        Ok(self.session_manager().current()?)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<Session> {
        Ok(self.session_manager().login(request).await?)
    }

    pub fn logout(&self) -> Result<()> {
        Ok(self.session_manager().logout()?)
    }

    pub async fn submit_post(&self, draft: &PostDraft) -> Result<CreatedRecord> {
        Ok(self.publisher.create_post(draft).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontpage_storage::MemoryStore;
    use frontpage_xrpc::testing::{jwt_expiring_at, ScriptedTransport};
    use serde_json::json;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_login_then_post() {
        let access = jwt_expiring_at(chrono::Utc::now().timestamp() + 3600);
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_json(200, json!({ "did": "did:plc:abc" }))
                .reply_json(
                    200,
                    json!({ "service": [{ "type": "AtprotoPersonalDataServer", "serviceEndpoint": "https://pds.example" }] }),
                )
                .reply_json(
                    200,
                    json!({ "accessJwt": access, "refreshJwt": "r", "did": "did:plc:abc", "handle": "alice.bsky.social" }),
                )
                .reply_json(200, json!({ "uri": "at://did:plc:abc/fyi.unravel.frontpage.post/1" })),
        );
        let mut config = Config::new(PathBuf::from("/unused"));
        config.plc_directory_url = "https://plc.test/".to_string();
        let app = Frontpage::with_parts(config, transport.clone(), Arc::new(MemoryStore::new()));

        assert_eq!(app.session_state().unwrap(), SessionState::Absent);
        app.login(LoginRequest::new("alice.bsky.social", "app-pass-1"))
            .await
            .unwrap();
        assert_eq!(app.session_state().unwrap(), SessionState::Active);

        let record = app
            .submit_post(&PostDraft::new("Hi", "https://x.com"))
            .await
            .unwrap();
        assert_eq!(record.uri, "at://did:plc:abc/fyi.unravel.frontpage.post/1");

        // Configured directory is used
        assert_eq!(transport.requests()[1].url, "https://plc.test/did%3Aplc%3Aabc");

        app.logout().unwrap();
        assert_eq!(app.current_session().unwrap(), None);
    }

    #[test]
    fn test_new_opens_database_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let app = Frontpage::new(Config::new(dir.path().to_path_buf())).unwrap();

        assert!(dir.path().join("frontpage.db").exists());
        assert_eq!(app.current_session().unwrap(), None);
    }
}
