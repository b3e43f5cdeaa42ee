//! Backend failures and their user-facing form.
//!
//! Every call across the transport boundary fails with one [`ApiFailure`].
//! [`ApiFailure::user_message`] turns it into the text shown to the shopper
//! and [`ApiFailure::category`] into the class callers branch on.

use serde::Serialize;
use thiserror::Error;

pub const INVALID_REQUEST_MESSAGE: &str = "Invalid request. Please check your input and try again.";
pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required. Please log in and try again.";
pub const NOT_FOUND_MESSAGE: &str = "The requested resource was not found.";
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Body of a non-success response, classified once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureBody {
    /// JSON body carrying a `message` field.
    Message(String),
    /// A bare string body (plain text or a JSON string).
    Text(String),
    /// JSON body without a usable message.
    Json(serde_json::Value),
    /// No body.
    Empty,
}

impl FailureBody {
    /// Classify a raw response body.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }

        match serde_json::from_str::<serde_json::Value>(trimmed) {
            Ok(serde_json::Value::String(text)) => Self::Text(text),
            Ok(value) => match value.get("message").and_then(serde_json::Value::as_str) {
                Some(message) if !message.trim().is_empty() => Self::Message(message.to_string()),
                _ => Self::Json(value),
            },
            Err(_) => Self::Text(trimmed.to_string()),
        }
    }
}

/// A failed call to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiFailure {
    /// No response was received.
    #[error("network failure{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Network { message: Option<String> },

    /// The backend answered with a non-success status.
    #[error("backend responded with status {status}")]
    Status { status: u16, body: FailureBody },

    /// A success response whose body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Malformed(String),
}

/// Failure classes callers use to pick a recovery strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Network,
    Validation,
    Auth,
    Server,
    Unknown,
}

impl ApiFailure {
    /// Build a status failure from the raw response body.
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: FailureBody::parse(body),
        }
    }

    /// HTTP status, when a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Network { .. } | Self::Malformed(_) => None,
        }
    }

    /// The message to show the shopper.
    ///
    /// First match wins: the backend's own `message`, the transport's
    /// description, a bare string body, then a fixed message by status.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Status {
                body: FailureBody::Message(message) | FailureBody::Text(message),
                ..
            } => message.clone(),
            Self::Network {
                message: Some(message),
            } => message.clone(),
            Self::Status { status, .. } => status_message(*status).to_string(),
            Self::Network { message: None } | Self::Malformed(_) => GENERIC_MESSAGE.to_string(),
        }
    }

    /// No response was received.
    #[must_use]
    pub const fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// 401 or 403.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// 400 or 422.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.status(), Some(400 | 422))
    }

    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        if self.is_network() {
            return FailureCategory::Network;
        }
        if self.is_auth() {
            return FailureCategory::Auth;
        }
        if self.is_validation() {
            return FailureCategory::Validation;
        }
        match self.status() {
            Some(status) if status >= 500 => FailureCategory::Server,
            _ => FailureCategory::Unknown,
        }
    }
}

/// Normalize any backend failure into the text shown to the shopper.
#[must_use]
pub fn normalize(failure: &ApiFailure) -> String {
    failure.user_message()
}

const fn status_message(status: u16) -> &'static str {
    match status {
        400 => INVALID_REQUEST_MESSAGE,
        401 => AUTH_REQUIRED_MESSAGE,
        404 => NOT_FOUND_MESSAGE,
        500.. => SERVER_ERROR_MESSAGE,
        _ => GENERIC_MESSAGE,
    }
}
