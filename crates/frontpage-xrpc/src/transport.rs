//! HTTP transport abstraction

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Sent as `Authorization: Bearer <token>`
    pub bearer: Option<String>,
    /// Sent as a JSON body
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

// Credentials never end up in logs through Debug
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Error payload returned by XRPC endpoints on failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct XrpcErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> std::result::Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// `None` when the body is not an XRPC error object.
    pub fn xrpc_error(&self) -> Option<XrpcErrorBody> {
        self.json::<XrpcErrorBody>()
            .ok()
            .filter(|e| e.error.is_some() || e.message.is_some())
    }

    /// Body text, or the status reason phrase when the body is empty.
    pub fn error_text(&self) -> String {
        let body = self.body.trim();
        if !body.is_empty() {
            return body.to_string();
        }
        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown status")
            .to_string()
    }

    /// XRPC `message`, then `error`, then [`error_text`](Self::error_text).
    pub fn error_message(&self) -> String {
        self.xrpc_error()
            .and_then(|e| e.message.or(e.error))
            .unwrap_or_else(|| self.error_text())
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Only transport-level failures are errors; any HTTP status is a response.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("frontpage-poster/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "Sending request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::debug!(url = %request.url, status, "Received response");

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_text_falls_back_to_reason() {
        assert_eq!(HttpResponse::new(401, "").error_text(), "Unauthorized");
        assert_eq!(
            HttpResponse::new(400, " {\"error\":\"ExpiredToken\"} ").error_text(),
            "{\"error\":\"ExpiredToken\"}"
        );
    }

    #[test]
    fn test_error_message_precedence() {
        let both = HttpResponse::new(401, r#"{"error":"ExpiredToken","message":"Token has expired"}"#);
        assert_eq!(both.error_message(), "Token has expired");

        let code_only = HttpResponse::new(401, r#"{"error":"AuthenticationRequired"}"#);
        assert_eq!(code_only.error_message(), "AuthenticationRequired");

        assert_eq!(HttpResponse::new(502, "gateway down").error_message(), "gateway down");
        assert_eq!(HttpResponse::new(401, "").error_message(), "Unauthorized");
    }

    #[test]
    fn test_xrpc_error() {
        let response = HttpResponse::new(
            400,
            r#"{"error":"ExpiredToken","message":"Token has expired"}"#,
        );
        let err = response.xrpc_error().unwrap();
        assert_eq!(err.error.as_deref(), Some("ExpiredToken"));

        assert!(HttpResponse::new(500, "gateway down").xrpc_error().is_none());
        assert!(HttpResponse::new(200, r#"{"uri":"at://x"}"#).xrpc_error().is_none());
    }

    #[test]
    fn test_debug_redacts_bearer() {
        let request = HttpRequest::post("https://pds.example/xrpc/x").bearer("secret-token");
        let rendered = format!("{request:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
