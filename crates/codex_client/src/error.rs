//! Gateway error types and their mapping to client reactions.
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Failure of a single gateway call.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Missing, invalid or expired bearer token, or refused credentials.
    /// Carries the server-provided text.
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// The gateway refused the credentials (admin key rejected).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found")]
    NotFound,

    /// Validation failure; `message` is the server-provided text.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid gateway URL: {0}")]
    InvalidUrl(String),

    /// A user session is needed but none was supplied.
    #[error("Login required")]
    NoSession,
}

/// How the client reacts to a failed call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureAction {
    /// Clear the user session and ask for a new login.
    #[error("Session expired or missing; please log in again")]
    ReLogin,
    /// Clear the admin session and return to the admin login.
    #[error("Admin session rejected; please log in to the admin console again")]
    AdminReLogin,
    /// Transient problem; show a notice and keep state as is.
    #[error("{0}")]
    Notice(String),
    /// Server refused the input; show its message and keep state as is.
    #[error("{0}")]
    ShowMessage(String),
}

impl GatewayError {
    /// Build an error from a non-success status and its body text.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message_for_response(status, body);
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound,
            s if s.is_server_error() => Self::Server {
                status: s.as_u16(),
                message,
            },
            s => Self::Rejected {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// Map the error onto the user session reaction.
    pub fn classify(&self) -> FailureAction {
        match self {
            Self::Unauthorized(_) | Self::NoSession => FailureAction::ReLogin,
            Self::Forbidden(message) => FailureAction::ShowMessage(message.clone()),
            Self::NotFound => FailureAction::ShowMessage("Snippet not found".to_string()),
            Self::Rejected { message, .. } => FailureAction::ShowMessage(message.clone()),
            Self::Server { .. } | Self::Transport(_) | Self::Decode(_) | Self::InvalidUrl(_) => {
                FailureAction::Notice(self.to_string())
            }
        }
    }

    /// Map the error onto the admin console reaction.
    pub fn classify_admin(&self) -> FailureAction {
        match self {
            Self::Unauthorized(_) | Self::Forbidden(_) | Self::NoSession => {
                FailureAction::AdminReLogin
            }
            other => other.classify(),
        }
    }

    /// Map a failed login or signup. A 401 there means the credentials were
    /// refused, so the server's text is shown instead of forcing a re-login.
    pub fn classify_credentials(&self) -> FailureAction {
        match self {
            Self::Unauthorized(message) => FailureAction::ShowMessage(message.clone()),
            other => other.classify(),
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::NoSession)
    }
}

/// Extract a human-readable message from an error response body.
///
/// Prefers the JSON `error` (then `message`) field, falls back to the raw
/// body, then to the status reason.
pub fn error_message_for_response(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value
            .get("error")
            .or_else(|| value.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
    }

    body.to_string()
}
