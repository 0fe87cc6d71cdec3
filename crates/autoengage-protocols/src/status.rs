//! Run/URL status types, statistics, and the activity log entry shape.

use crate::codes::ActionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of the whole automation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    /// No run in progress.
    Idle,
    /// Actively working through the queue.
    Running,
    /// Suspended by the operator; position is retained.
    Paused,
    /// All URLs reached a terminal state.
    Completed,
}

impl RunPhase {
    /// Whether a run is in progress (running or paused).
    pub fn is_active(&self) -> bool {
        matches!(self, RunPhase::Running | RunPhase::Paused)
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::Running => "running",
            RunPhase::Paused => "paused",
            RunPhase::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Per-URL lifecycle phase.
///
/// `Processing` spans the whole attempt: navigation, page settle, action
/// dispatch, and the wait for the outcome. `Retrying` means a backoff
/// delay is pending before the next attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlPhase {
    /// Not yet reached by the queue.
    Pending,
    /// Attempt in flight (navigating, settling, or awaiting the outcome).
    Processing,
    /// Attempt failed; waiting out the backoff before trying again.
    Retrying,
    /// Finished successfully (actions applied, or a skip recorded).
    Completed,
    /// All attempts exhausted without success.
    Failed,
}

impl UrlPhase {
    /// Whether this phase will never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UrlPhase::Completed | UrlPhase::Failed)
    }

    /// Whether an attempt is currently in flight.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, UrlPhase::Processing)
    }
}

impl fmt::Display for UrlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UrlPhase::Pending => "pending",
            UrlPhase::Processing => "processing",
            UrlPhase::Retrying => "retrying",
            UrlPhase::Completed => "completed",
            UrlPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Full per-URL record tracked for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlStatus {
    /// Current phase.
    pub phase: UrlPhase,
    /// Number of failed attempts so far; incremented on every error.
    pub attempts: u32,
    /// Whether a like was applied (or observed already present).
    pub liked: bool,
    /// Whether a comment was posted (or observed already present).
    pub commented: bool,
    /// Whether the URL was skipped without performing any action.
    pub skipped: bool,
    /// Last error recorded for this URL, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ActionError>,
    /// When processing of this URL first started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When this URL reached a terminal phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl UrlStatus {
    /// Fresh record for a URL that has not been reached yet.
    pub fn pending() -> Self {
        Self {
            phase: UrlPhase::Pending,
            attempts: 0,
            liked: false,
            commented: false,
            skipped: false,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }
}

impl Default for UrlStatus {
    fn default() -> Self {
        Self::pending()
    }
}

/// Monotone counters over the run.
///
/// `processed + failed + skipped` relate to terminal URLs; `liked` and
/// `commented` count applied effects (a skipped URL increments neither).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Statistics {
    /// Size of the URL queue.
    pub total: usize,
    /// URLs that finished successfully (including skips).
    pub processed: usize,
    /// URLs that exhausted all attempts.
    pub failed: usize,
    /// URLs that finished without performing any action.
    pub skipped: usize,
    /// Likes applied.
    pub liked: usize,
    /// Comments posted.
    pub commented: usize,
}

impl Statistics {
    /// Counters for a fresh run over `total` URLs.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }
}

/// Final report produced when a run completes or is stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Size of the URL queue.
    pub total: usize,
    /// URLs that finished successfully (including skips).
    pub processed: usize,
    /// URLs that exhausted all attempts.
    pub failed: usize,
    /// URLs that finished without performing any action.
    pub skipped: usize,
    /// Likes applied.
    pub liked: usize,
    /// Comments posted.
    pub commented: usize,
    /// Wall-clock duration of the run in whole seconds.
    pub completion_time_seconds: i64,
    /// `round(100 * processed / total)`, or 0 when the queue was empty.
    pub success_rate: u32,
}

impl Summary {
    /// Build a summary from final counters and the run's start time.
    pub fn from_statistics(stats: &Statistics, started_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let success_rate = if stats.total == 0 {
            0
        } else {
            ((stats.processed as f64 / stats.total as f64) * 100.0).round() as u32
        };
        Self {
            total: stats.total,
            processed: stats.processed,
            failed: stats.failed,
            skipped: stats.skipped,
            liked: stats.liked,
            commented: stats.commented,
            completion_time_seconds: (now - started_at).num_seconds(),
            success_rate,
        }
    }
}

/// Category of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Routine progress message.
    Info,
    /// Successful action on a URL.
    Success,
    /// Non-fatal anomaly (retry scheduled, skip, ...).
    Warning,
    /// Failure worth the operator's attention.
    Error,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogKind::Info => "info",
            LogKind::Success => "success",
            LogKind::Warning => "warning",
            LogKind::Error => "error",
        };
        f.write_str(s)
    }
}

/// One entry in the bounded activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Entry category.
    pub kind: LogKind,
    /// Human-readable message.
    pub message: String,
    /// Optional structured payload (URL, error code, counters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl LogEntry {
    /// New entry stamped with the current time.
    pub fn new(kind: LogKind, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            message: message.into(),
            data: None,
        }
    }

    /// Attach a structured payload.
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
