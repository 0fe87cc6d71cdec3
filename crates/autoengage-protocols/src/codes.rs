//! Stable error codes shared across the engine, stores, and exports.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of error codes attached to failed URL attempts.
///
/// The serialized form is stable: exports, persisted state, and UI surfaces
/// all carry these exact strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Session returned HTTP 401 on an action call.
    #[serde(rename = "AUTH_401")]
    Auth401,
    /// Session token exists but is expired or revoked.
    #[serde(rename = "AUTH_EXPIRED")]
    AuthExpired,
    /// Platform rate limiting detected (HTTP 429 or equivalent page state).
    #[serde(rename = "RATE_LIMIT")]
    RateLimit,
    /// Page failed to load within the watchdog window.
    #[serde(rename = "NETWORK_TIMEOUT")]
    NetworkTimeout,
    /// Expected page element was not found after the page settled.
    #[serde(rename = "DOM_NOT_FOUND")]
    DomNotFound,
    /// The action was dispatched but its effect could not be verified.
    #[serde(rename = "ACTION_VERIFICATION_FAILED")]
    ActionVerificationFailed,
    /// The automation tab was closed mid-flight.
    #[serde(rename = "TAB_CLOSED")]
    TabClosed,
    /// The in-page actuator raised an internal error.
    #[serde(rename = "CONTENT_SCRIPT_ERROR")]
    ContentScriptError,
    /// The URL was already liked and commented before we touched it.
    #[serde(rename = "ALREADY_PROCESSED")]
    AlreadyProcessed,
    /// Anything that does not map onto a more specific code.
    #[serde(rename = "UNKNOWN_ERROR")]
    UnknownError,
}

impl ErrorCode {
    /// Stable string form as carried in exports and persisted state.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Auth401 => "AUTH_401",
            ErrorCode::AuthExpired => "AUTH_EXPIRED",
            ErrorCode::RateLimit => "RATE_LIMIT",
            ErrorCode::NetworkTimeout => "NETWORK_TIMEOUT",
            ErrorCode::DomNotFound => "DOM_NOT_FOUND",
            ErrorCode::ActionVerificationFailed => "ACTION_VERIFICATION_FAILED",
            ErrorCode::TabClosed => "TAB_CLOSED",
            ErrorCode::ContentScriptError => "CONTENT_SCRIPT_ERROR",
            ErrorCode::AlreadyProcessed => "ALREADY_PROCESSED",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Whether a failure with this code is worth retrying at all.
    ///
    /// Auth failures and already-processed detections never recover on
    /// their own, so retrying them only burns attempts.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ErrorCode::Auth401 | ErrorCode::AuthExpired | ErrorCode::AlreadyProcessed
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A coded error attached to a URL attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionError {
    /// Stable code from the fixed taxonomy.
    pub code: ErrorCode,
    /// Human-readable detail for logs and exports.
    pub message: String,
}

impl ActionError {
    /// Create a new coded error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ActionError {}
