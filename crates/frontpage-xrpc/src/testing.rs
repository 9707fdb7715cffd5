//! Scripted transport for tests.
//!
//! Replies are served in order; every request is recorded so tests can
//! assert on exactly what went over the wire.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::{HttpRequest, HttpResponse, HttpTransport, Result, TransportError};

enum Reply {
    Response(HttpResponse),
    Fail(String),
}

#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_json(self, status: u16, body: serde_json::Value) -> Self {
        self.reply_text(status, body.to_string())
    }

    pub fn reply_text(self, status: u16, body: impl Into<String>) -> Self {
        self.replies
            .lock()
            .push_back(Reply::Response(HttpResponse::new(status, body)));
        self
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.replies.lock().push_back(Reply::Fail(message.into()));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = request.url.clone();
        self.requests.lock().push(request);

        match self.replies.lock().pop_front() {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(TransportError::Connection(message)),
            None => Err(TransportError::Connection(format!(
                "no scripted reply for {url}"
            ))),
        }
    }
}

/// Unsigned three-part token carrying `claims` as its payload.
pub fn unsigned_jwt(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"ES256K","typ":"at+jwt"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Token whose `exp` claim is `exp` (seconds since the epoch).
pub fn jwt_expiring_at(exp: i64) -> String {
    unsigned_jwt(&serde_json::json!({
        "scope": "com.atproto.access",
        "sub": "did:plc:abc",
        "exp": exp,
    }))
}
