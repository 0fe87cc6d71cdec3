//! Page actuator trait and its request/outcome messages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codes::ActionError;
use crate::gating::SkipReason;
use crate::tab::TabId;

/// One dispatched unit of work against a loaded page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// The post URL being processed.
    pub url: String,
    /// Comment text to post when commenting is enabled.
    pub comment: String,
    /// Simulate effects instead of performing them.
    pub dry_run: bool,
    /// Whether to like the post.
    pub enable_like: bool,
    /// Whether to comment on the post.
    pub enable_comment: bool,
    /// Queue position, for log correlation.
    pub index: usize,
}

/// What the actuator reports back after working a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorOutcome {
    /// One of "success", "skipped", "error", "dry_run".
    pub status: String,
    /// A like was applied (or observed already present).
    pub liked: bool,
    /// A comment was posted (or observed already present).
    pub commented: bool,
    /// No action was performed.
    pub skipped: bool,
    /// Why the page was skipped, when it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
    /// What went wrong, when something did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
}

impl ActuatorOutcome {
    /// Actions were performed; flags record which effects now hold.
    pub fn success(liked: bool, commented: bool) -> Self {
        Self {
            status: "success".to_string(),
            liked,
            commented,
            skipped: false,
            reason: None,
            error: None,
        }
    }

    /// Nothing was done; the effect flags record what was already present.
    pub fn skipped(reason: SkipReason, liked: bool, commented: bool) -> Self {
        Self {
            status: "skipped".to_string(),
            liked,
            commented,
            skipped: true,
            reason: Some(reason),
            error: None,
        }
    }

    /// The attempt failed. Flags preserve any partial effect that landed.
    pub fn failure(error: ActionError, liked: bool, commented: bool) -> Self {
        Self {
            status: "error".to_string(),
            liked,
            commented,
            skipped: false,
            reason: None,
            error: Some(error),
        }
    }

    /// Dry-run: report the effects as applied without touching the page.
    pub fn simulated(liked: bool, commented: bool) -> Self {
        Self {
            status: "dry_run".to_string(),
            liked,
            commented,
            skipped: false,
            reason: None,
            error: None,
        }
    }

    /// Whether this outcome counts as a successful terminal state.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Errors from the actuation transport itself, before any outcome exists.
#[derive(Debug, Error)]
pub enum ActuatorError {
    /// The page could not be reached at all.
    #[error("page unreachable: {0}")]
    Unreachable(String),

    /// The dispatch was rejected by the page side.
    #[error("action rejected: {0}")]
    Rejected(String),
}

/// Performs like/comment actions against the page loaded in a tab.
#[async_trait]
pub trait PageActuator: Send + Sync {
    /// Work the page in `tab` according to `request`.
    ///
    /// A transport-level `Err` means the outcome never arrived; an `Ok`
    /// outcome may still describe a failed attempt via its `error` field.
    async fn process(&self, tab: TabId, request: ActionRequest)
        -> Result<ActuatorOutcome, ActuatorError>;
}
