//! Session data structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Persisted credential record. Field names match the JSON layout stored by
/// the browser extension so either side can read the other's record.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub handle: String,
    /// Account DID, never changes for the lifetime of the account
    pub did: String,
    pub access_jwt: String,
    pub refresh_jwt: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Personal data server base URL, no trailing slash
    pub pds: String,
    /// Time of the last successful login or refresh
    pub created_at: DateTime<Utc>,
}

/// Body of a successful `com.atproto.server.createSession` call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionOutput {
    pub access_jwt: String,
    pub refresh_jwt: String,
    pub did: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of a successful `com.atproto.server.refreshSession` call.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSessionOutput {
    pub access_jwt: String,
    pub refresh_jwt: String,
    #[serde(default)]
    pub did: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
}

impl Session {
    pub fn from_login(output: CreateSessionOutput, requested_handle: &str, pds: String) -> Self {
        Self {
            handle: output
                .handle
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| requested_handle.to_string()),
            did: output.did,
            access_jwt: output.access_jwt,
            refresh_jwt: output.refresh_jwt,
            email: output.email,
            pds,
            created_at: Utc::now(),
        }
    }

    /// Copy of this session carrying the refreshed credentials.
    pub fn refreshed(&self, output: RefreshSessionOutput) -> Self {
        Self {
            handle: output.handle.unwrap_or_else(|| self.handle.clone()),
            did: output.did.unwrap_or_else(|| self.did.clone()),
            access_jwt: output.access_jwt,
            refresh_jwt: output.refresh_jwt,
            email: self.email.clone(),
            pds: self.pds.clone(),
            created_at: Utc::now(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("handle", &self.handle)
            .field("did", &self.did)
            .field("email", &self.email)
            .field("pds", &self.pds)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn login_output(handle: Option<&str>) -> CreateSessionOutput {
        CreateSessionOutput {
            access_jwt: "access-1".to_string(),
            refresh_jwt: "refresh-1".to_string(),
            did: "did:plc:abc".to_string(),
            handle: handle.map(str::to_string),
            email: None,
        }
    }

    #[test]
    fn test_from_login_falls_back_to_requested_handle() {
        let session = Session::from_login(login_output(None), "alice.bsky.social", "https://pds.example".into());
        assert_eq!(session.handle, "alice.bsky.social");

        let session = Session::from_login(
            login_output(Some("alice.example")),
            "alice.bsky.social",
            "https://pds.example".into(),
        );
        assert_eq!(session.handle, "alice.example");
    }

    #[test]
    fn test_refreshed_keeps_identity() {
        let session = Session::from_login(login_output(None), "alice.bsky.social", "https://pds.example".into());
        let refreshed = session.refreshed(RefreshSessionOutput {
            access_jwt: "access-2".to_string(),
            refresh_jwt: "refresh-2".to_string(),
            did: None,
            handle: None,
        });

        assert_eq!(refreshed.did, session.did);
        assert_eq!(refreshed.handle, session.handle);
        assert_eq!(refreshed.pds, session.pds);
        assert_eq!(refreshed.access_jwt, "access-2");
        assert_eq!(refreshed.refresh_jwt, "refresh-2");
        assert!(refreshed.created_at >= session.created_at);
    }

    #[test]
    fn test_json_layout() {
        let session = Session::from_login(login_output(Some("alice.bsky.social")), "x", "https://pds.example".into());
        let value = serde_json::to_value(&session).unwrap();

        for field in ["handle", "did", "accessJwt", "refreshJwt", "email", "pds", "createdAt"] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        assert_eq!(value["email"], json!(null));
    }

    #[test]
    fn test_debug_hides_tokens() {
        let session = Session::from_login(login_output(None), "alice.bsky.social", "https://pds.example".into());
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("access-1"));
        assert!(!rendered.contains("refresh-1"));
    }
}
