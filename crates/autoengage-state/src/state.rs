//! The durable automation state aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use autoengage_protocols::{
    ActionError, LogEntry, RunPhase, RunSettings, StartRequest, Statistics, Summary, TabId,
    UrlPhase, UrlStatus,
};

use crate::alarm::PendingAlarm;
use crate::log::ActivityLog;

/// The single durable aggregate tracking one automation run.
///
/// The store owns it; the engine reads, mutates, and writes it back around
/// every transition. Invariants: statuses behind the cursor are terminal,
/// ahead of it pending; `current_index <= urls.len()`; `statistics` only
/// ever accumulates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationState {
    /// Run-level lifecycle phase.
    pub phase: RunPhase,
    /// Queue of post URLs, immutable once a run starts.
    pub urls: Vec<String>,
    /// Cursor into `urls`, monotonically non-decreasing within a run.
    pub current_index: usize,
    /// Run configuration, fixed for the run's duration.
    pub settings: RunSettings,
    /// The single tab owned by this run, when one is open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
    /// One record per `urls[i]`, same length and order.
    pub url_statuses: Vec<UrlStatus>,
    /// Monotone counters over the run.
    pub statistics: Statistics,
    /// Bounded activity log.
    pub activity_log: ActivityLog,
    /// When the run started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Durable wake-up pending at the time of the last save, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_alarm: Option<PendingAlarm>,
}

impl AutomationState {
    /// The idle/empty shape: no run, nothing queued.
    pub fn idle() -> Self {
        Self {
            phase: RunPhase::Idle,
            urls: Vec::new(),
            current_index: 0,
            settings: RunSettings::default(),
            tab_id: None,
            url_statuses: Vec::new(),
            statistics: Statistics::default(),
            activity_log: ActivityLog::new(),
            started_at: None,
            pending_alarm: None,
        }
    }

    /// Fresh running state for `request`, cursor at zero, all URLs pending.
    pub fn new_run(request: StartRequest, now: DateTime<Utc>) -> Self {
        let total = request.urls.len();
        Self {
            phase: RunPhase::Running,
            url_statuses: vec![UrlStatus::pending(); total],
            statistics: Statistics::new(total),
            urls: request.urls,
            current_index: 0,
            settings: request.settings,
            tab_id: None,
            activity_log: ActivityLog::new(),
            started_at: Some(now),
            pending_alarm: None,
        }
    }

    /// URL under the cursor, `None` once the queue is exhausted.
    pub fn current_url(&self) -> Option<&str> {
        self.urls.get(self.current_index).map(|s| s.as_str())
    }

    /// Status record at `index`.
    pub fn status(&self, index: usize) -> Option<&UrlStatus> {
        self.url_statuses.get(index)
    }

    /// Whether the cursor has moved past the last URL.
    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.urls.len()
    }

    /// Mark the current URL as processing; first attempt stamps `started_at`.
    pub fn begin_processing(&mut self, now: DateTime<Utc>) {
        let index = self.current_index;
        if let Some(status) = self.url_statuses.get_mut(index) {
            status.phase = UrlPhase::Processing;
            if status.started_at.is_none() {
                status.started_at = Some(now);
            }
        }
    }

    /// Mark the current URL completed and accumulate its effects.
    ///
    /// Returns the final record for notification fan-out.
    pub fn complete_current(
        &mut self,
        liked: bool,
        commented: bool,
        skipped: bool,
        now: DateTime<Utc>,
    ) -> Option<UrlStatus> {
        let index = self.current_index;
        let status = self.url_statuses.get_mut(index)?;
        status.phase = UrlPhase::Completed;
        status.liked = liked;
        status.commented = commented;
        status.skipped = skipped;
        status.error = None;
        status.finished_at = Some(now);

        self.statistics.processed += 1;
        if liked {
            self.statistics.liked += 1;
        }
        if commented {
            self.statistics.commented += 1;
        }
        if skipped {
            self.statistics.skipped += 1;
        }
        Some(status.clone())
    }

    /// Record an error against the current URL and bump its attempt counter.
    ///
    /// Returns the new attempt count; the caller decides retry vs. fail.
    pub fn record_error(&mut self, error: ActionError) -> u32 {
        let index = self.current_index;
        match self.url_statuses.get_mut(index) {
            Some(status) => {
                status.attempts += 1;
                status.error = Some(error);
                status.attempts
            }
            None => 0,
        }
    }

    /// Park the current URL while a retry backoff runs.
    pub fn mark_retrying(&mut self) {
        let index = self.current_index;
        if let Some(status) = self.url_statuses.get_mut(index) {
            status.phase = UrlPhase::Retrying;
        }
    }

    /// Mark the current URL permanently failed.
    ///
    /// Returns the final record for notification fan-out.
    pub fn fail_current(&mut self, now: DateTime<Utc>) -> Option<UrlStatus> {
        let index = self.current_index;
        let status = self.url_statuses.get_mut(index)?;
        status.phase = UrlPhase::Failed;
        status.finished_at = Some(now);
        self.statistics.failed += 1;
        Some(status.clone())
    }

    /// Move the cursor to the next URL.
    pub fn advance_cursor(&mut self) {
        if self.current_index < self.urls.len() {
            self.current_index += 1;
        }
    }

    /// Append an activity log entry.
    pub fn push_log(&mut self, entry: LogEntry) {
        self.activity_log.push(entry);
    }

    /// Final report for the run as it stands now.
    pub fn summary(&self, now: DateTime<Utc>) -> Summary {
        Summary::from_statistics(&self.statistics, self.started_at.unwrap_or(now), now)
    }

    /// Reset to the idle shape, keeping the activity log.
    pub fn reset_preserving_logs(&mut self) {
        let log = std::mem::take(&mut self.activity_log);
        *self = Self::idle();
        self.activity_log = log;
    }
}

impl Default for AutomationState {
    fn default() -> Self {
        Self::idle()
    }
}
