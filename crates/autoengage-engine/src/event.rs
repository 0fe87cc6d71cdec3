//! The closed event set consumed by the engine actor.

use std::fmt;

use tokio::sync::oneshot;

use autoengage_protocols::{ActionError, ActuatorOutcome, ExportFormat, StartRequest, TabId};
use autoengage_state::AutomationState;

/// Operator-facing control requests.
#[derive(Debug)]
pub enum ControlRequest {
    /// Begin a fresh run.
    Start(StartRequest),
    /// Abort the run and reset to idle.
    Stop,
    /// Suspend at the current URL.
    Pause,
    /// Continue a paused run at the same URL.
    Resume,
    /// Snapshot the current state.
    GetStatus {
        /// Where to send the snapshot.
        reply: oneshot::Sender<AutomationState>,
    },
    /// Render the activity log.
    ExportLogs {
        /// Requested output shape.
        format: ExportFormat,
        /// Where to send the rendered document.
        reply: oneshot::Sender<String>,
    },
}

/// Everything that can wake the engine.
#[derive(Debug)]
pub enum EngineEvent {
    /// Operator control.
    Control(ControlRequest),
    /// The driver reports a tab finished loading.
    TabLoaded {
        /// The tab that loaded.
        tab_id: TabId,
    },
    /// The driver reports a tab was closed externally.
    TabRemoved {
        /// The tab that disappeared.
        tab_id: TabId,
    },
    /// The post-load settle delay ran out.
    SettleElapsed {
        /// Queue position the delay was armed for.
        index: usize,
        /// Tab the delay was armed for.
        tab_id: TabId,
    },
    /// The per-URL watchdog ran out.
    WatchdogFired {
        /// Queue position the watchdog was armed for.
        index: usize,
    },
    /// A scheduled advance (retry backoff, inter-URL delay, or
    /// failure advance) is due.
    AdvanceDue {
        /// Queue position the advance was armed for.
        index: usize,
    },
    /// The actuator finished working a page.
    PostProcessed {
        /// Queue position of the attempt.
        index: usize,
        /// What the actuator reported.
        outcome: ActuatorOutcome,
    },
    /// An attempt failed before any outcome existed (navigation or
    /// dispatch transport failure).
    UrlFailed {
        /// Queue position of the attempt.
        index: usize,
        /// The coded failure.
        error: ActionError,
    },
    /// Drain and exit the actor loop.
    Shutdown,
}

/// Timer classes; arming a class replaces any timer already in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerClass {
    /// Post-load settle delay.
    Settle,
    /// Per-URL watchdog.
    Watchdog,
    /// Retry backoff, inter-URL delay, or failure advance.
    Advance,
}

impl fmt::Display for TimerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerClass::Settle => "settle",
            TimerClass::Watchdog => "watchdog",
            TimerClass::Advance => "advance",
        };
        f.write_str(s)
    }
}

/// What a timer injects back into the loop when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Fire a [`EngineEvent::SettleElapsed`].
    Settle {
        /// Queue position.
        index: usize,
        /// Tab the settle was armed for.
        tab_id: TabId,
    },
    /// Fire a [`EngineEvent::WatchdogFired`].
    Watchdog {
        /// Queue position.
        index: usize,
    },
    /// Fire a [`EngineEvent::AdvanceDue`].
    Advance {
        /// Queue position.
        index: usize,
    },
}

impl TimerEvent {
    /// The timer class this event belongs to.
    pub fn class(&self) -> TimerClass {
        match self {
            TimerEvent::Settle { .. } => TimerClass::Settle,
            TimerEvent::Watchdog { .. } => TimerClass::Watchdog,
            TimerEvent::Advance { .. } => TimerClass::Advance,
        }
    }

    /// Convert into the engine event delivered on fire.
    pub fn into_event(self) -> EngineEvent {
        match self {
            TimerEvent::Settle { index, tab_id } => EngineEvent::SettleElapsed { index, tab_id },
            TimerEvent::Watchdog { index } => EngineEvent::WatchdogFired { index },
            TimerEvent::Advance { index } => EngineEvent::AdvanceDue { index },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_event_class() {
        assert_eq!(
            TimerEvent::Settle {
                index: 0,
                tab_id: TabId(1)
            }
            .class(),
            TimerClass::Settle
        );
        assert_eq!(TimerEvent::Watchdog { index: 0 }.class(), TimerClass::Watchdog);
        assert_eq!(TimerEvent::Advance { index: 0 }.class(), TimerClass::Advance);
    }

    #[test]
    fn test_timer_event_into_event() {
        let event = TimerEvent::Advance { index: 3 }.into_event();
        assert!(matches!(event, EngineEvent::AdvanceDue { index: 3 }));

        let event = TimerEvent::Watchdog { index: 1 }.into_event();
        assert!(matches!(event, EngineEvent::WatchdogFired { index: 1 }));
    }

    #[test]
    fn test_timer_class_display() {
        assert_eq!(TimerClass::Settle.to_string(), "settle");
        assert_eq!(TimerClass::Watchdog.to_string(), "watchdog");
        assert_eq!(TimerClass::Advance.to_string(), "advance");
    }
}
