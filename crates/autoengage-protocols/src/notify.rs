//! Outbound notifications from the engine to whatever UI is listening.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::codes::ActionError;
use crate::status::{LogEntry, Statistics, Summary, UrlStatus};

/// Progress and lifecycle notifications emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineNotification {
    /// The queue moved: an attempt started or a URL reached a terminal
    /// state.
    Progress {
        /// Queue position of the URL.
        index: usize,
        /// Its final record.
        status: UrlStatus,
        /// Counters after the update.
        statistics: Statistics,
    },
    /// The whole run finished.
    Completed {
        /// Final report.
        summary: Summary,
    },
    /// The run was paused by the operator.
    Paused,
    /// The run resumed from pause.
    Resumed,
    /// A run-level error (not tied to a single URL attempt).
    Error {
        /// The error that occurred.
        error: ActionError,
    },
    /// An activity log entry was appended.
    Log {
        /// The appended entry.
        entry: LogEntry,
    },
}

/// Receives engine notifications and drives the visible indicator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification. Delivery is best-effort.
    async fn notify(&self, notification: EngineNotification);

    /// Update the progress indicator, or clear it with `None`.
    async fn set_indicator(&self, text: Option<String>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_tagging() {
        let json = serde_json::to_value(EngineNotification::Paused).unwrap();
        assert_eq!(json["kind"], "paused");

        let json = serde_json::to_value(EngineNotification::Progress {
            index: 2,
            status: UrlStatus::pending(),
            statistics: Statistics::new(5),
        })
        .unwrap();
        assert_eq!(json["kind"], "progress");
        assert_eq!(json["index"], 2);
        assert_eq!(json["statistics"]["total"], 5);
    }

    #[test]
    fn test_notification_roundtrip() {
        let original = EngineNotification::Resumed;
        let json = serde_json::to_string(&original).unwrap();
        let back: EngineNotification = serde_json::from_str(&json).unwrap();
        assert_eq!(back, original);
    }
}
