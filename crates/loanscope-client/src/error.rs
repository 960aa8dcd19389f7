//! Failure taxonomy for every backend interaction.
//!
//! Backend-originated variants carry the HTTP status and the backend's
//! `detail` text verbatim so views can show it unchanged.

use loanscope_common::ValidationError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Credential missing, invalid or expired (401). Ends the session.
    #[error("authentication rejected: {detail}")]
    AuthRejected { detail: String },

    /// Authenticated but not permitted (403, or refused locally by the capability check)
    #[error("forbidden: {detail}")]
    Forbidden { detail: String },

    #[error("not found: {detail}")]
    NotFound { detail: String },

    /// Malformed input, rejected before sending (`status == None`) or by the backend
    #[error("{detail}")]
    Validation { status: Option<u16>, detail: String },

    /// Any other non-success status
    #[error("server returned {status}: {detail}")]
    Server { status: u16, detail: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The credential could not be written to or removed from its store
    #[error("credential storage error: {0}")]
    Storage(String),

    /// A commit for the same draft is still pending
    #[error("a save is already in progress")]
    CommitInFlight,

    /// The draft was submitted before the entity was loaded
    #[error("nothing to save yet")]
    NotLoaded,
}

impl ApiError {
    /// Classify a non-success response
    pub fn from_status(status: StatusCode, detail: String) -> Self {
        match status.as_u16() {
            401 => Self::AuthRejected { detail },
            403 => Self::Forbidden { detail },
            404 => Self::NotFound { detail },
            400 | 422 => Self::Validation {
                status: Some(status.as_u16()),
                detail,
            },
            code => Self::Server {
                status: code,
                detail,
            },
        }
    }

    pub fn forbidden(action: &str) -> Self {
        Self::Forbidden {
            detail: format!("You don't have permission to {}", action),
        }
    }

    /// HTTP status of a backend-originated failure
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::AuthRejected { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Validation { status, .. } => *status,
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, Self::AuthRejected { .. })
    }

    /// Text suitable for showing to the user as-is
    pub fn detail(&self) -> String {
        match self {
            Self::AuthRejected { detail }
            | Self::Forbidden { detail }
            | Self::NotFound { detail }
            | Self::Validation { detail, .. }
            | Self::Server { detail, .. } => detail.clone(),
            Self::Transport(_) => "Could not reach the server".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation {
            status: None,
            detail: err.to_string(),
        }
    }
}

/// Pull the human-readable message out of an error body.
///
/// FastAPI-style `{"detail": "..."}` yields the string; a structured detail
/// (validation lists) is rendered as compact JSON; anything else falls back
/// to the raw body or the status reason.
pub(crate) fn extract_detail(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        match value.get("detail") {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(other) => return other.to_string(),
            None => {}
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let cases = [
            (401, "AuthRejected"),
            (403, "Forbidden"),
            (404, "NotFound"),
            (400, "Validation"),
            (422, "Validation"),
            (500, "Server"),
        ];
        for (code, expected) in cases {
            let err = ApiError::from_status(StatusCode::from_u16(code).unwrap(), "x".into());
            let name = format!("{:?}", err);
            assert!(name.starts_with(expected), "{code} -> {name}");
            assert_eq!(err.status(), Some(code));
        }
    }

    #[test]
    fn test_only_401_is_auth_rejection() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "Invalid token".into())
            .is_auth_rejected());
        assert!(!ApiError::from_status(StatusCode::FORBIDDEN, "nope".into()).is_auth_rejected());
    }

    #[test]
    fn test_extract_detail_string() {
        let detail = extract_detail(
            StatusCode::BAD_REQUEST,
            r#"{"detail": "Wrong username or password"}"#,
        );
        assert_eq!(detail, "Wrong username or password");
    }

    #[test]
    fn test_extract_detail_structured() {
        let detail = extract_detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": [{"loc": ["body", "title"], "msg": "field required"}]}"#,
        );
        assert!(detail.contains("field required"), "got: {detail}");
    }

    #[test]
    fn test_extract_detail_fallbacks() {
        assert_eq!(extract_detail(StatusCode::BAD_GATEWAY, "upstream down\n"), "upstream down");
        assert_eq!(extract_detail(StatusCode::NOT_FOUND, ""), "Not Found");
    }

    #[test]
    fn test_local_validation_has_no_status() {
        let err = ApiError::from(ValidationError { field: "title" });
        assert_eq!(err.status(), None);
        assert_eq!(err.detail(), "title can't be empty");
    }
}
