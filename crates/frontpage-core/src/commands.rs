//! UI commands
//!
//! The options page and popup talk to the core only through these messages.
//! Replies are `{ok: true, result}` or `{ok: false, error, kind}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use frontpage_post::{CreatedRecord, PostDraft};
use frontpage_session::{LoginRequest, Session, SessionState};

use crate::error::{CoreError, ErrorKind};
use crate::frontpage::Frontpage;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Command {
    #[serde(rename = "frontpage-submit")]
    Submit(PostDraft),
    #[serde(rename = "frontpage-login")]
    Login(LoginRequest),
    #[serde(rename = "frontpage-logout")]
    Logout,
    #[serde(rename = "frontpage-get-auth")]
    GetAuth,
    #[serde(rename = "frontpage-get-status")]
    GetStatus,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Submit(_) => "frontpage-submit",
            Command::Login(_) => "frontpage-login",
            Command::Logout => "frontpage-logout",
            Command::GetAuth => "frontpage-get-auth",
            Command::GetStatus => "frontpage-get-status",
        }
    }
}

/// Session as shown to the UI. Tokens stay inside the core.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub handle: String,
    pub did: String,
    pub pds: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Session> for SessionInfo {
    fn from(session: Session) -> Self {
        Self {
            handle: session.handle,
            did: session.did,
            pds: session.pds,
            email: session.email,
            created_at: session.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Record(CreatedRecord),
    Session(Option<SessionInfo>),
    Status { state: SessionState },
}

#[derive(Debug, Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            result: Some(data),
            error: None,
            kind: None,
        }
    }

    pub fn done() -> Self {
        Self {
            ok: true,
            result: None,
            error: None,
            kind: None,
        }
    }

    pub fn err(error: &CoreError) -> Self {
        Self::failure(error.to_string(), error.kind())
    }

    pub fn failure(error: String, kind: ErrorKind) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error),
            kind: Some(kind),
        }
    }
}

impl Frontpage {
    pub async fn dispatch(&self, command: Command) -> CommandResult<Reply> {
        let name = command.name();
        tracing::debug!(command = name, "Dispatching command");

        let outcome = match command {
            Command::Submit(draft) => self
                .submit_post(&draft)
                .await
                .map(|record| Some(Reply::Record(record))),
            Command::Login(request) => self
                .login(request)
                .await
                .map(|session| Some(Reply::Session(Some(session.into())))),
            Command::Logout => self.logout().map(|()| None),
            Command::GetAuth => self
                .current_session()
                .map(|session| Some(Reply::Session(session.map(SessionInfo::from)))),
            Command::GetStatus => self
                .session_state()
                .map(|state| Some(Reply::Status { state })),
        };

        match outcome {
            Ok(Some(reply)) => CommandResult::ok(reply),
            Ok(None) => CommandResult::done(),
            Err(e) => {
                tracing::warn!(command = name, kind = ?e.kind(), error = %e, "Command failed");
                CommandResult::err(&e)
            }
        }
    }

    /// Parse one JSON message, dispatch it and render the JSON reply.
    pub async fn handle_message(&self, raw: &str) -> String {
        let result = match serde_json::from_str::<Command>(raw) {
            Ok(command) => self.dispatch(command).await,
            Err(e) => CommandResult::failure(
                format!("Unrecognized command: {e}"),
                ErrorKind::Validation,
            ),
        };

        serde_json::to_string(&result).unwrap_or_else(|e| {
            serde_json::json!({ "ok": false, "error": e.to_string(), "kind": ErrorKind::Internal })
                .to_string()
        })
    }
}
