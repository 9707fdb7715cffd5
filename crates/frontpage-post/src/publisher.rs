//! Authorized record creation

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use frontpage_session::{Session, SessionManager};
use frontpage_xrpc::{nsid, xrpc_url, HttpRequest, HttpResponse, HttpTransport};

use crate::draft::{PostDraft, ValidatedPost};
use crate::error::PostError;
use crate::Result;

pub const FRONTPAGE_COLLECTION: &str = "fyi.unravel.frontpage.post";
pub const POST_RECORD_TYPE: &str = "fyi.unravel.frontpage.post";

/// XRPC errors a PDS returns with HTTP 400 for a stale access token.
const TOKEN_ERRORS: [&str; 2] = ["ExpiredToken", "InvalidToken"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedRecord {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
}

pub struct PostPublisher {
    transport: Arc<dyn HttpTransport>,
    sessions: SessionManager,
}

impl PostPublisher {
    pub fn new(transport: Arc<dyn HttpTransport>, sessions: SessionManager) -> Self {
        Self {
            transport,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Create a post using the stored session. An authorization failure
    /// triggers one refresh and one retry.
    pub async fn create_post(&self, draft: &PostDraft) -> Result<CreatedRecord> {
        let post = draft.validate()?;
        let session = self.sessions.ensure_valid().await?;
        self.publish(&post, session, true).await
    }

    /// Create a post with a caller-supplied session; never refreshes.
    pub async fn create_post_with_session(
        &self,
        draft: &PostDraft,
        session: Session,
    ) -> Result<CreatedRecord> {
        let post = draft.validate()?;
        self.publish(&post, session, false).await
    }

    async fn publish(
        &self,
        post: &ValidatedPost,
        mut session: Session,
        mut may_refresh: bool,
    ) -> Result<CreatedRecord> {
        loop {
            let response = self.send_create_record(&session, post).await?;

            if is_authorization_failure(&response) {
                if may_refresh {
                    may_refresh = false;
                    tracing::warn!(
                        did = %session.did,
                        status = response.status,
                        "Post rejected as unauthorized, refreshing session"
                    );
                    session = self.sessions.refresh(&session).await?;
                    continue;
                }

                return Err(PostError::Authorization {
                    status: response.status,
                    message: response.error_message(),
                });
            }

            if !response.is_success() {
                return Err(PostError::Request {
                    status: response.status,
                    body: response.error_text(),
                });
            }

            let record: CreatedRecord = response.json().map_err(PostError::MalformedResponse)?;
            tracing::info!(did = %session.did, uri = %record.uri, "Created post");
            return Ok(record);
        }
    }

    async fn send_create_record(
        &self,
        session: &Session,
        post: &ValidatedPost,
    ) -> Result<HttpResponse> {
        let body = serde_json::json!({
            "repo": session.did,
            "collection": FRONTPAGE_COLLECTION,
            "record": {
                "$type": POST_RECORD_TYPE,
                "title": post.title(),
                "url": post.url(),
                "createdAt": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            }
        });

        let request = HttpRequest::post(xrpc_url(&session.pds, nsid::CREATE_RECORD))
            .bearer(session.access_jwt.as_str())
            .json(body);

        Ok(self.transport.send(request).await?)
    }
}

fn is_authorization_failure(response: &HttpResponse) -> bool {
    match response.status {
        401 => true,
        400 => response
            .xrpc_error()
            .and_then(|e| e.error)
            .is_some_and(|e| TOKEN_ERRORS.contains(&e.as_str())),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontpage_identity::{IdentityResolver, ResolverConfig};
    use frontpage_session::{SessionError, SessionStore};
    use frontpage_storage::MemoryStore;
    use frontpage_xrpc::testing::{jwt_expiring_at, ScriptedTransport};
    use serde_json::json;

    fn token(offset_secs: i64) -> String {
        jwt_expiring_at(Utc::now().timestamp() + offset_secs)
    }

    fn session_with(access_jwt: String) -> Session {
        Session {
            handle: "alice.bsky.social".to_string(),
            did: "did:plc:abc".to_string(),
            access_jwt,
            refresh_jwt: "refresh-1".to_string(),
            email: None,
            pds: "https://pds.example".to_string(),
            created_at: Utc::now(),
        }
    }

    fn publisher(transport: &Arc<ScriptedTransport>, stored: Option<Session>) -> PostPublisher {
        let resolver = IdentityResolver::new(transport.clone(), ResolverConfig::default());
        let store = SessionStore::new(Arc::new(MemoryStore::new()));
        if let Some(session) = stored {
            store.set(&session).unwrap();
        }
        let sessions = SessionManager::new(transport.clone(), resolver, store);
        PostPublisher::new(transport.clone(), sessions)
    }

    fn created() -> serde_json::Value {
        json!({
            "uri": "at://did:plc:abc/fyi.unravel.frontpage.post/3kabc",
            "cid": "bafyreib"
        })
    }

    #[tokio::test]
    async fn test_create_post_success() {
        let access = token(3600);
        let transport = Arc::new(ScriptedTransport::new().reply_json(200, created()));
        let publisher = publisher(&transport, Some(session_with(access.clone())));

        let record = publisher
            .create_post(&PostDraft::new("Hi", "https://x.com"))
            .await
            .unwrap();

        assert_eq!(record.uri, "at://did:plc:abc/fyi.unravel.frontpage.post/3kabc");
        assert_eq!(record.cid.as_deref(), Some("bafyreib"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "https://pds.example/xrpc/com.atproto.repo.createRecord"
        );
        assert_eq!(requests[0].bearer.as_deref(), Some(access.as_str()));

        let body = requests[0].body.clone().unwrap();
        assert_eq!(body["repo"], "did:plc:abc");
        assert_eq!(body["collection"], FRONTPAGE_COLLECTION);
        assert_eq!(body["record"]["$type"], POST_RECORD_TYPE);
        assert_eq!(body["record"]["title"], "Hi");
        assert_eq!(body["record"]["url"], "https://x.com");
        let created_at = body["record"]["createdAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created_at).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_draft_makes_no_request() {
        let transport = Arc::new(ScriptedTransport::new());
        let publisher = publisher(&transport, Some(session_with(token(3600))));

        let err = publisher
            .create_post(&PostDraft::new("Hi", "definitely not a url"))
            .await
            .unwrap_err();

        assert!(matches!(err, PostError::Validation(_)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_not_authenticated() {
        let transport = Arc::new(ScriptedTransport::new());
        let publisher = publisher(&transport, None);

        let err = publisher
            .create_post(&PostDraft::new("Hi", "https://x.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, PostError::Session(SessionError::NotAuthenticated)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_retries_once_after_refresh() {
        let refreshed_access = token(7200);
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_text(401, r#"{"error":"AuthenticationRequired"}"#)
                .reply_json(200, json!({ "accessJwt": refreshed_access, "refreshJwt": "refresh-2" }))
                .reply_json(200, created()),
        );
        let publisher = publisher(&transport, Some(session_with(token(3600))));

        let record = publisher
            .create_post(&PostDraft::new("Hi", "https://x.com"))
            .await
            .unwrap();
        assert!(record.uri.starts_with("at://"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[1].url.ends_with("com.atproto.server.refreshSession"));
        assert_eq!(requests[2].bearer.as_deref(), Some(refreshed_access.as_str()));
    }

    #[tokio::test]
    async fn test_second_unauthorized_is_fatal() {
        let refreshed_access = token(7200);
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_text(401, "")
                .reply_json(200, json!({ "accessJwt": refreshed_access, "refreshJwt": "refresh-2" }))
                .reply_text(401, r#"{"error":"AuthenticationRequired"}"#)
                .reply_json(200, created()),
        );
        let publisher = publisher(&transport, Some(session_with(token(3600))));

        let err = publisher
            .create_post(&PostDraft::new("Hi", "https://x.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, PostError::Authorization { status: 401, .. }));
        assert_eq!(err.to_string(), "Post not authorized (401): AuthenticationRequired");

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[2].bearer.as_deref(), Some(refreshed_access.as_str()));
        assert_eq!(transport.remaining_replies(), 1);

        // Latest refreshed tokens stay stored
        let stored = publisher.sessions().current().unwrap().unwrap();
        assert_eq!(stored.access_jwt, refreshed_access);
        assert_eq!(stored.refresh_jwt, "refresh-2");
    }

    #[tokio::test]
    async fn test_expired_token_error_triggers_refresh() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_text(400, r#"{"error":"ExpiredToken","message":"Token has expired"}"#)
                .reply_json(200, json!({ "accessJwt": token(7200), "refreshJwt": "refresh-2" }))
                .reply_json(200, created()),
        );
        let publisher = publisher(&transport, Some(session_with(token(3600))));

        publisher
            .create_post(&PostDraft::new("Hi", "https://x.com"))
            .await
            .unwrap();
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_explicit_session_is_not_refreshed() {
        let transport = Arc::new(ScriptedTransport::new().reply_text(401, ""));
        let publisher = publisher(&transport, None);

        let err = publisher
            .create_post_with_session(&PostDraft::new("Hi", "https://x.com"), session_with(token(3600)))
            .await
            .unwrap_err();

        assert!(matches!(err, PostError::Authorization { status: 401, .. }));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_other_failures_are_request_errors() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_text(400, r#"{"error":"InvalidRequest","message":"Record/url must be a uri"}"#)
                .reply_text(502, ""),
        );
        let publisher = publisher(&transport, Some(session_with(token(3600))));
        let draft = PostDraft::new("Hi", "https://x.com");

        match publisher.create_post(&draft).await.unwrap_err() {
            PostError::Request { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("InvalidRequest"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        match publisher.create_post(&draft).await.unwrap_err() {
            PostError::Request { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "Bad Gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_refresh_failure_during_retry_surfaces() {
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply_text(401, "")
                .reply_text(401, r#"{"error":"ExpiredToken","message":"Refresh token has expired"}"#),
        );
        let publisher = publisher(&transport, Some(session_with(token(3600))));

        let err = publisher
            .create_post(&PostDraft::new("Hi", "https://x.com"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PostError::Session(SessionError::Authentication { status: 401, .. })
        ));
        assert_eq!(transport.request_count(), 2);
    }
}
