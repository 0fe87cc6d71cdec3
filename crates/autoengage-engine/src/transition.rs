//! Pure state transitions.
//!
//! Every engine event runs through one of these functions: they mutate the
//! in-memory snapshot and return the [`Command`]s the actor must execute.
//! No I/O happens here, so every behavior is testable with synthetic
//! snapshots and no collaborators.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, warn};

use autoengage_protocols::{
    ActionError, ActuatorOutcome, EngineNotification, ErrorCode, LogEntry, LogKind, RunPhase,
    StartRequest, TabId,
};
use autoengage_state::{AlarmKind, AutomationState, PendingAlarm};

use crate::backoff;
use crate::config::EngineConfig;
use crate::event::{TimerClass, TimerEvent};

/// Instructions returned by a transition for the actor to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Point the owned tab at `url`, opening one if needed.
    Navigate {
        /// Queue position being processed.
        index: usize,
        /// Destination.
        url: String,
    },
    /// Close a tab, tolerating "already closed".
    CloseTab {
        /// The tab to close.
        tab_id: TabId,
    },
    /// Dispatch the actuator against the loaded page.
    Dispatch {
        /// Queue position being processed.
        index: usize,
        /// The tab holding the page.
        tab_id: TabId,
    },
    /// Arm a timer; arming a class replaces its previous timer.
    Arm {
        /// How long until the fire.
        delay: Duration,
        /// What fires.
        event: TimerEvent,
    },
    /// Cancel one timer class.
    Cancel {
        /// The class to cancel.
        class: TimerClass,
    },
    /// Cancel every pending timer.
    CancelAllTimers,
    /// Emit a notification.
    Notify(EngineNotification),
    /// Update or clear the progress indicator.
    SetIndicator(Option<String>),
}

/// Per-attempt flags that do not survive a restart.
///
/// `dispatched` guards against double-dispatching the actuator when late
/// tab-load signals arrive after the settle delay already ran.
#[derive(Debug, Default)]
pub struct VolatileFlags {
    /// An actuator call is in flight for the current attempt.
    pub dispatched: bool,
}

/// Append a log entry to the state and the matching notification command.
fn log(
    state: &mut AutomationState,
    commands: &mut Vec<Command>,
    kind: LogKind,
    message: impl Into<String>,
    data: Option<serde_json::Value>,
) {
    let mut entry = LogEntry::new(kind, message);
    if let Some(data) = data {
        entry = entry.with_data(data);
    }
    state.push_log(entry.clone());
    commands.push(Command::Notify(EngineNotification::Log { entry }));
}

/// Arm a timer, recording a durable alarm when the delay is long enough
/// that a restart must not lose it.
fn arm(
    state: &mut AutomationState,
    cfg: &EngineConfig,
    commands: &mut Vec<Command>,
    now: DateTime<Utc>,
    delay: Duration,
    event: TimerEvent,
) {
    let durable = match event {
        TimerEvent::Watchdog { index } => Some((AlarmKind::Watchdog, index)),
        TimerEvent::Advance { index } => Some((AlarmKind::Advance, index)),
        TimerEvent::Settle { .. } => None,
    };
    if let Some((kind, index)) = durable {
        if cfg.needs_durable_alarm(delay) {
            state.pending_alarm = Some(PendingAlarm::after(kind, index, now, delay));
        }
    }
    commands.push(Command::Arm { delay, event });
}

/// Progress indicator text: terminal URLs over total.
fn indicator(state: &AutomationState) -> Command {
    let done = state.statistics.processed + state.statistics.failed;
    Command::SetIndicator(Some(format!("{}/{}", done, state.statistics.total)))
}

/// Shared teardown: cancel timers, close the owned tab, reset to idle
/// keeping the activity log, clear the indicator.
fn finish(state: &mut AutomationState, commands: &mut Vec<Command>) {
    commands.push(Command::CancelAllTimers);
    state.pending_alarm = None;
    if let Some(tab_id) = state.tab_id.take() {
        commands.push(Command::CloseTab { tab_id });
    }
    state.reset_preserving_logs();
    commands.push(Command::SetIndicator(None));
}

/// The core driver: process the URL under the cursor, or wrap up the run.
fn advance(
    state: &mut AutomationState,
    volatile: &mut VolatileFlags,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
    commands: &mut Vec<Command>,
) {
    if state.phase != RunPhase::Running {
        debug!("Advance skipped: phase {}", state.phase);
        return;
    }

    if state.is_exhausted() {
        state.phase = RunPhase::Completed;
        let summary = state.summary(now);
        log(
            state,
            commands,
            LogKind::Success,
            format!(
                "Automation complete: {}/{} processed",
                summary.processed, summary.total
            ),
            Some(json!(summary)),
        );
        commands.push(Command::Notify(EngineNotification::Completed { summary }));
        finish(state, commands);
        return;
    }

    let url = match state.current_url() {
        Some(u) => u.to_string(),
        None => return,
    };
    let index = state.current_index;
    let total = state.urls.len();

    volatile.dispatched = false;
    state.begin_processing(now);
    let attempt = state.status(index).map(|s| s.attempts + 1).unwrap_or(1);

    let message = if attempt > 1 {
        format!(
            "Opened: {url} (attempt {attempt}/{})",
            state.settings.total_attempts()
        )
    } else {
        format!("Opened: {url}")
    };
    log(
        state,
        commands,
        LogKind::Info,
        message,
        Some(json!({
            "url": url,
            "index": index + 1,
            "total": total,
            "attempt": attempt,
        })),
    );
    if let Some(status) = state.status(index) {
        commands.push(Command::Notify(EngineNotification::Progress {
            index,
            status: status.clone(),
            statistics: state.statistics,
        }));
    }
    commands.push(indicator(state));
    commands.push(Command::Navigate { index, url });
    arm(
        state,
        cfg,
        commands,
        now,
        Duration::from_secs(state.settings.url_timeout_secs),
        TimerEvent::Watchdog { index },
    );
}

/// Schedule the inter-URL delay ahead of the next advance.
fn schedule_next(
    state: &mut AutomationState,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
    commands: &mut Vec<Command>,
) {
    if state.phase != RunPhase::Running {
        return;
    }
    let delay_secs = backoff::inter_url_delay(&state.settings);
    log(
        state,
        commands,
        LogKind::Info,
        format!("Waiting {delay_secs}s before next post..."),
        None,
    );
    arm(
        state,
        cfg,
        commands,
        now,
        Duration::from_secs(delay_secs),
        TimerEvent::Advance {
            index: state.current_index,
        },
    );
}

/// Record a failed attempt: either park the URL for a backoff retry or
/// fail it terminally and move on.
fn handle_url_error(
    state: &mut AutomationState,
    volatile: &mut VolatileFlags,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
    error: ActionError,
    commands: &mut Vec<Command>,
) {
    volatile.dispatched = false;
    commands.push(Command::Cancel {
        class: TimerClass::Watchdog,
    });
    state.pending_alarm = None;

    let url = state.current_url().unwrap_or_default().to_string();
    let index = state.current_index;
    let attempts = state.record_error(error.clone());
    commands.push(Command::Notify(EngineNotification::Error {
        error: error.clone(),
    }));

    if attempts <= state.settings.max_retries {
        let delay = backoff::retry_backoff(attempts);
        let total_attempts = state.settings.total_attempts();
        state.mark_retrying();
        log(
            state,
            commands,
            LogKind::Warning,
            format!(
                "Retrying in {}s (attempt {}/{}): {}",
                delay.as_secs(),
                attempts + 1,
                total_attempts,
                url
            ),
            Some(json!({
                "url": url,
                "code": error.code,
                "message": error.message,
            })),
        );
        if state.phase == RunPhase::Running {
            arm(state, cfg, commands, now, delay, TimerEvent::Advance { index });
        }
    } else {
        let status = state.fail_current(now);
        log(
            state,
            commands,
            LogKind::Error,
            format!("Failed: {url}"),
            Some(json!({
                "url": url,
                "code": error.code,
                "message": error.message,
                "attempts": attempts,
            })),
        );
        if let Some(status) = status {
            commands.push(Command::Notify(EngineNotification::Progress {
                index,
                status,
                statistics: state.statistics,
            }));
        }
        commands.push(indicator(state));
        state.advance_cursor();
        if state.phase == RunPhase::Running {
            arm(
                state,
                cfg,
                commands,
                now,
                cfg.failure_advance(),
                TimerEvent::Advance {
                    index: state.current_index,
                },
            );
        }
    }
}

/// Begin a fresh run. No-op while one is already active.
pub fn on_start(
    state: &mut AutomationState,
    volatile: &mut VolatileFlags,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
    request: StartRequest,
) -> Vec<Command> {
    if state.phase.is_active() {
        warn!("Start ignored: a run is already {}", state.phase);
        return Vec::new();
    }

    let mut commands = Vec::new();
    if let Err(e) = request.validate() {
        let error = ActionError::new(ErrorCode::UnknownError, e.to_string());
        log(
            state,
            &mut commands,
            LogKind::Error,
            format!("Failed to start automation: {e}"),
            Some(json!({ "code": error.code })),
        );
        commands.push(Command::Notify(EngineNotification::Error { error }));
        finish(state, &mut commands);
        return commands;
    }

    let total = request.urls.len();
    let dry_run = request.settings.dry_run;
    *state = AutomationState::new_run(request, now);

    let suffix = if dry_run { " (DRY-RUN)" } else { "" };
    log(
        state,
        &mut commands,
        LogKind::Info,
        format!("Starting automation with {total} URLs{suffix}"),
        None,
    );
    advance(state, volatile, cfg, now, &mut commands);
    commands
}

/// Suspend the run at the current URL.
pub fn on_pause(state: &mut AutomationState) -> Vec<Command> {
    if state.phase != RunPhase::Running {
        warn!("Pause ignored: phase {}", state.phase);
        return Vec::new();
    }

    let mut commands = Vec::new();
    state.phase = RunPhase::Paused;
    state.pending_alarm = None;
    commands.push(Command::CancelAllTimers);
    log(state, &mut commands, LogKind::Info, "Automation paused", None);
    commands.push(Command::Notify(EngineNotification::Paused));
    commands.push(Command::SetIndicator(Some("⏸".to_string())));
    commands
}

/// Continue a paused run at the same URL, attempts preserved.
pub fn on_resume(
    state: &mut AutomationState,
    volatile: &mut VolatileFlags,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
) -> Vec<Command> {
    if state.phase != RunPhase::Paused {
        warn!("Resume ignored: phase {}", state.phase);
        return Vec::new();
    }

    let mut commands = Vec::new();
    state.phase = RunPhase::Running;
    log(state, &mut commands, LogKind::Info, "Automation resumed", None);
    commands.push(Command::Notify(EngineNotification::Resumed));
    commands.push(Command::SetIndicator(None));
    advance(state, volatile, cfg, now, &mut commands);
    commands
}

/// Abort from any state and reset to idle, keeping the activity log.
pub fn on_stop(state: &mut AutomationState, now: DateTime<Utc>) -> Vec<Command> {
    let mut commands = Vec::new();
    if state.phase.is_active() {
        let summary = state.summary(now);
        log(
            state,
            &mut commands,
            LogKind::Warning,
            "Automation stopped",
            Some(json!(summary)),
        );
    }
    finish(state, &mut commands);
    commands
}

/// The owned tab finished loading; arm the settle delay.
pub fn on_tab_loaded(
    state: &mut AutomationState,
    volatile: &VolatileFlags,
    cfg: &EngineConfig,
    tab_id: TabId,
) -> Vec<Command> {
    if state.phase != RunPhase::Running {
        return Vec::new();
    }
    if state.tab_id != Some(tab_id) {
        debug!("Load signal from unowned tab {} ignored", tab_id);
        return Vec::new();
    }
    if volatile.dispatched {
        return Vec::new();
    }
    let index = state.current_index;
    let in_flight = state
        .status(index)
        .map(|s| s.phase.is_in_flight())
        .unwrap_or(false);
    if !in_flight {
        return Vec::new();
    }

    debug!("Tab {} loaded for URL {}", tab_id, index);
    vec![Command::Arm {
        delay: cfg.settle_delay(),
        event: TimerEvent::Settle { index, tab_id },
    }]
}

/// The owned tab disappeared; drop the handle and let the watchdog
/// convert any stalled attempt into a retryable error.
pub fn on_tab_removed(state: &mut AutomationState, tab_id: TabId) -> Vec<Command> {
    if state.tab_id == Some(tab_id) {
        debug!("Owned tab {} was closed externally", tab_id);
        state.tab_id = None;
    }
    Vec::new()
}

/// The settle delay ran out; dispatch the actuator exactly once.
pub fn on_settle_elapsed(
    state: &mut AutomationState,
    volatile: &mut VolatileFlags,
    index: usize,
    tab_id: TabId,
) -> Vec<Command> {
    if state.phase != RunPhase::Running {
        return Vec::new();
    }
    if index != state.current_index || state.tab_id != Some(tab_id) {
        debug!("Stale settle for URL {} discarded", index);
        return Vec::new();
    }
    if volatile.dispatched {
        return Vec::new();
    }
    let in_flight = state
        .status(index)
        .map(|s| s.phase.is_in_flight())
        .unwrap_or(false);
    if !in_flight {
        return Vec::new();
    }

    volatile.dispatched = true;
    vec![Command::Dispatch { index, tab_id }]
}

/// The actuator reported an outcome for an attempt.
pub fn on_post_processed(
    state: &mut AutomationState,
    volatile: &mut VolatileFlags,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
    index: usize,
    outcome: ActuatorOutcome,
) -> Vec<Command> {
    if !state.phase.is_active() {
        return Vec::new();
    }
    if index != state.current_index {
        debug!("Stale outcome for URL {} discarded", index);
        return Vec::new();
    }
    let in_flight = state
        .status(index)
        .map(|s| s.phase.is_in_flight())
        .unwrap_or(false);
    if !in_flight {
        return Vec::new();
    }

    let mut commands = Vec::new();

    if let Some(error) = outcome.error.clone() {
        handle_url_error(state, volatile, cfg, now, error, &mut commands);
        return commands;
    }

    volatile.dispatched = false;
    commands.push(Command::Cancel {
        class: TimerClass::Watchdog,
    });
    state.pending_alarm = None;

    let url = state.current_url().unwrap_or_default().to_string();
    let started = state.status(index).and_then(|s| s.started_at);
    let status = match state.complete_current(outcome.liked, outcome.commented, outcome.skipped, now)
    {
        Some(s) => s,
        None => return commands,
    };

    if outcome.skipped {
        let reason = outcome
            .reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        log(
            state,
            &mut commands,
            LogKind::Warning,
            format!("Skipped: {url}"),
            Some(json!({ "url": url, "reason": reason })),
        );
    } else {
        let effects = match (status.liked, status.commented) {
            (true, true) => "Liked + Commented",
            (true, false) => "Liked",
            (false, true) => "Commented",
            (false, false) => "No action",
        };
        let duration_secs = started.map(|t| (now - t).num_seconds()).unwrap_or(0);
        log(
            state,
            &mut commands,
            LogKind::Success,
            format!("Done: {url} | {effects}"),
            Some(json!({
                "url": url,
                "status": outcome.status,
                "duration_secs": duration_secs,
            })),
        );
    }

    commands.push(Command::Notify(EngineNotification::Progress {
        index,
        status,
        statistics: state.statistics,
    }));
    commands.push(indicator(state));
    state.advance_cursor();
    schedule_next(state, cfg, now, &mut commands);
    commands
}

/// An attempt failed before any outcome existed.
pub fn on_url_failed(
    state: &mut AutomationState,
    volatile: &mut VolatileFlags,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
    index: usize,
    error: ActionError,
) -> Vec<Command> {
    if !state.phase.is_active() {
        return Vec::new();
    }
    if index != state.current_index {
        debug!("Stale failure for URL {} discarded", index);
        return Vec::new();
    }
    let in_flight = state
        .status(index)
        .map(|s| s.phase.is_in_flight())
        .unwrap_or(false);
    if !in_flight {
        return Vec::new();
    }

    let mut commands = Vec::new();
    handle_url_error(state, volatile, cfg, now, error, &mut commands);
    commands
}

/// The per-URL watchdog ran out while the attempt was still in flight.
pub fn on_watchdog_fired(
    state: &mut AutomationState,
    volatile: &mut VolatileFlags,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
    index: usize,
) -> Vec<Command> {
    if state.phase != RunPhase::Running {
        return Vec::new();
    }
    if index != state.current_index {
        debug!("Stale watchdog for URL {} discarded", index);
        return Vec::new();
    }
    let in_flight = state
        .status(index)
        .map(|s| s.phase.is_in_flight())
        .unwrap_or(false);
    if !in_flight {
        return Vec::new();
    }

    let timeout = state.settings.url_timeout_secs;
    let mut commands = Vec::new();
    handle_url_error(
        state,
        volatile,
        cfg,
        now,
        ActionError::new(
            ErrorCode::NetworkTimeout,
            format!("Timeout after {timeout}s"),
        ),
        &mut commands,
    );
    commands
}

/// A scheduled advance is due (retry, inter-URL delay, or failure advance).
pub fn on_advance_due(
    state: &mut AutomationState,
    volatile: &mut VolatileFlags,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
    index: usize,
) -> Vec<Command> {
    if state.phase != RunPhase::Running {
        return Vec::new();
    }
    if index != state.current_index {
        debug!("Stale advance for URL {} discarded", index);
        return Vec::new();
    }
    if let Some(status) = state.status(index) {
        if status.phase.is_in_flight() || status.phase.is_terminal() {
            return Vec::new();
        }
    }

    state.pending_alarm = None;
    let mut commands = Vec::new();
    advance(state, volatile, cfg, now, &mut commands);
    commands
}

/// Rebuild volatile machinery from a freshly loaded snapshot.
///
/// A durable alarm is re-armed for its remaining duration; a run that died
/// mid-flight with no alarm pending is advanced immediately. A persisted
/// `Completed` collapses to idle.
pub fn on_recover(
    state: &mut AutomationState,
    volatile: &mut VolatileFlags,
    cfg: &EngineConfig,
    now: DateTime<Utc>,
) -> Vec<Command> {
    volatile.dispatched = false;
    let mut commands = Vec::new();

    match state.phase {
        RunPhase::Idle => {}
        RunPhase::Completed => {
            debug!("Collapsing persisted completed run to idle");
            state.reset_preserving_logs();
        }
        RunPhase::Paused => {
            debug!(
                "Recovered paused run at URL {}/{}",
                state.current_index,
                state.urls.len()
            );
            commands.push(Command::SetIndicator(Some("⏸".to_string())));
        }
        RunPhase::Running => match state.pending_alarm {
            Some(alarm) if alarm.index == state.current_index => {
                let remaining = alarm.remaining(now);
                debug!(
                    "Re-arming persisted {:?} alarm with {:?} remaining",
                    alarm.kind, remaining
                );
                let event = match alarm.kind {
                    AlarmKind::Watchdog => TimerEvent::Watchdog { index: alarm.index },
                    AlarmKind::Advance => TimerEvent::Advance { index: alarm.index },
                };
                commands.push(Command::Arm {
                    delay: remaining,
                    event,
                });
            }
            _ => {
                state.pending_alarm = None;
                advance(state, volatile, cfg, now, &mut commands);
            }
        },
    }
    commands
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
