//! Session Manager
//!
//! Drives the session through
//! `Absent → Authenticating → Active → Refreshing → Active … → Absent`.
//! A refresh that fails leaves the stored session as it was.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use url::Url;

use frontpage_identity::{normalize_handle, strip_trailing_slashes, IdentityResolver};
use frontpage_xrpc::{nsid, xrpc_url, HttpRequest, HttpResponse, HttpTransport};

use crate::error::SessionError;
use crate::session::{CreateSessionOutput, RefreshSessionOutput, Session};
use crate::store::SessionStore;
use crate::token::{self, DEFAULT_EXPIRY_SKEW_SECS};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Absent,
    Authenticating,
    Active,
    Refreshing,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Absent => "absent",
            SessionState::Authenticating => "authenticating",
            SessionState::Active => "active",
            SessionState::Refreshing => "refreshing",
        }
    }
}

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub handle: String,
    /// App password
    pub password: String,
    /// Personal data server override; resolved from the handle when absent
    #[serde(default)]
    pub pds: Option<String>,
}

impl LoginRequest {
    pub fn new(handle: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            password: password.into(),
            pds: None,
        }
    }

    pub fn with_pds(mut self, pds: impl Into<String>) -> Self {
        self.pds = Some(pds.into());
        self
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("handle", &self.handle)
            .field("pds", &self.pds)
            .finish_non_exhaustive()
    }
}

/// Transient phases of in-flight operations, newest last.
#[derive(Default)]
struct Phases {
    next_id: u64,
    entries: Vec<(u64, SessionState)>,
}

impl Phases {
    fn current(&self) -> Option<SessionState> {
        self.entries.last().map(|(_, state)| *state)
    }
}

/// Marks a transient phase for as long as it is alive. Dropping removes only
/// this guard's entry, so overlapping operations keep their own phase.
struct PhaseGuard {
    phases: Arc<Mutex<Phases>>,
    id: u64,
}

impl PhaseGuard {
    fn enter(phases: &Arc<Mutex<Phases>>, state: SessionState) -> Self {
        let mut guard = phases.lock();
        let id = guard.next_id;
        guard.next_id += 1;
        guard.entries.push((id, state));
        Self {
            phases: Arc::clone(phases),
            id,
        }
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        self.phases.lock().entries.retain(|(id, _)| *id != self.id);
    }
}

pub struct SessionManager {
    transport: Arc<dyn HttpTransport>,
    resolver: IdentityResolver,
    store: SessionStore,
    expiry_skew_secs: i64,
    phases: Arc<Mutex<Phases>>,
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        resolver: IdentityResolver,
        store: SessionStore,
    ) -> Self {
        Self {
            transport,
            resolver,
            store,
            expiry_skew_secs: DEFAULT_EXPIRY_SKEW_SECS,
            phases: Arc::new(Mutex::new(Phases::default())),
        }
    }

    pub fn with_expiry_skew(mut self, secs: i64) -> Self {
        self.expiry_skew_secs = secs;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The most recently entered in-flight phase, else whether a session is stored.
    pub fn state(&self) -> Result<SessionState> {
        if let Some(phase) = self.phases.lock().current() {
            return Ok(phase);
        }
        Ok(match self.store.get()? {
            Some(_) => SessionState::Active,
            None => SessionState::Absent,
        })
    }

    pub fn current(&self) -> Result<Option<Session>> {
        self.store.get()
    }

    /// Exchange handle and app password for a session and persist it.
    pub async fn login(&self, request: LoginRequest) -> Result<Session> {
        let handle = normalize_handle(&request.handle);
        let password = request.password.trim();
        if handle.is_empty() || password.is_empty() {
            return Err(SessionError::Validation(
                "Handle and app password are required.".to_string(),
            ));
        }
        let pds_override = parse_pds_override(request.pds.as_deref())?;

        let _phase = PhaseGuard::enter(&self.phases, SessionState::Authenticating);

        let pds = match pds_override {
            Some(pds) => pds,
            None => {
                let did = self.resolver.resolve_handle(&handle).await?;
                self.resolver.lookup_home_server(&did).await?
            }
        };

        let body = serde_json::json!({
            "identifier": handle,
            "password": password,
        });
        let response = self
            .transport
            .send(HttpRequest::post(xrpc_url(&pds, nsid::CREATE_SESSION)).json(body))
            .await?;

        if !response.is_success() {
            tracing::warn!(handle = %handle, pds = %pds, status = response.status, "Login rejected");
            return Err(authentication_error("Login", &response));
        }

        let output: CreateSessionOutput =
            response
                .json()
                .map_err(|source| SessionError::MalformedResponse {
                    action: "Login",
                    source,
                })?;

        let session = Session::from_login(output, &handle, pds);
        self.store.set(&session)?;

        tracing::info!(
            handle = %session.handle,
            did = %session.did,
            pds = %session.pds,
            "Logged in"
        );

        Ok(session)
    }

    /// Trade the refresh token for new credentials. The only path that
    /// replaces the tokens of an existing session.
    pub async fn refresh(&self, current: &Session) -> Result<Session> {
        let _phase = PhaseGuard::enter(&self.phases, SessionState::Refreshing);

        let request = HttpRequest::post(xrpc_url(&current.pds, nsid::REFRESH_SESSION))
            .bearer(current.refresh_jwt.as_str());
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            tracing::warn!(did = %current.did, status = response.status, "Session refresh rejected");
            return Err(authentication_error("Session refresh", &response));
        }

        let output: RefreshSessionOutput =
            response
                .json()
                .map_err(|source| SessionError::MalformedResponse {
                    action: "Session refresh",
                    source,
                })?;

        let updated = current.refreshed(output);
        self.store.set(&updated)?;

        tracing::info!(did = %updated.did, "Refreshed session");

        Ok(updated)
    }

    /// The stored session, refreshed first if its access token is expired
    /// or unreadable.
    pub async fn ensure_valid(&self) -> Result<Session> {
        let session = self.store.get()?.ok_or(SessionError::NotAuthenticated)?;

        if token::is_expired(&session.access_jwt, self.expiry_skew_secs) {
            tracing::debug!(did = %session.did, "Access token expired");
            return self.refresh(&session).await;
        }

        Ok(session)
    }

    pub fn logout(&self) -> Result<()> {
        self.store.clear()?;
        tracing::info!("Logged out");
        Ok(())
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            resolver: self.resolver.clone(),
            store: self.store.clone(),
            expiry_skew_secs: self.expiry_skew_secs,
            phases: Arc::clone(&self.phases),
        }
    }
}

/// Blank means "resolve from the handle".
fn parse_pds_override(raw: Option<&str>) -> Result<Option<String>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let pds = strip_trailing_slashes(raw);
    match Url::parse(pds) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(Some(pds.to_string()))
        }
        _ => Err(SessionError::Validation(format!(
            "Personal data server URL is invalid: {raw}"
        ))),
    }
}

fn authentication_error(action: &'static str, response: &HttpResponse) -> SessionError {
    SessionError::Authentication {
        action,
        status: response.status,
        message: response.error_message(),
    }
}
