//! Durable alarms that outlive the process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a durable alarm wakes the engine up to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    /// Abort the URL at `index` if it is still in flight.
    Watchdog,
    /// Move on to the URL at `index` (retry or next in queue).
    Advance,
}

/// A wake-up persisted with the automation state.
///
/// Long waits are recorded here rather than held only in a process-local
/// timer, so a restart re-arms them for the remaining duration instead of
/// losing them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAlarm {
    /// What to do when the alarm fires.
    pub kind: AlarmKind,
    /// Queue position the alarm refers to.
    pub index: usize,
    /// Absolute fire time.
    pub fire_at: DateTime<Utc>,
}

impl PendingAlarm {
    /// Alarm firing `delay` from `now`.
    pub fn after(kind: AlarmKind, index: usize, now: DateTime<Utc>, delay: Duration) -> Self {
        let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX);
        Self {
            kind,
            index,
            fire_at: now + delay,
        }
    }

    /// Time left until the alarm fires, zero if already due.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.fire_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the alarm should have fired by `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.fire_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_after() {
        let now = Utc::now();
        let alarm = PendingAlarm::after(AlarmKind::Advance, 3, now, Duration::from_secs(90));
        assert_eq!(alarm.kind, AlarmKind::Advance);
        assert_eq!(alarm.index, 3);
        assert_eq!((alarm.fire_at - now).num_seconds(), 90);
    }

    #[test]
    fn test_remaining_clamps_to_zero() {
        let now = Utc::now();
        let alarm = PendingAlarm::after(AlarmKind::Watchdog, 0, now, Duration::from_secs(10));

        let later = now + chrono::Duration::seconds(60);
        assert_eq!(alarm.remaining(later), Duration::ZERO);
        assert!(alarm.is_due(later));
    }

    #[test]
    fn test_remaining_partial() {
        let now = Utc::now();
        let alarm = PendingAlarm::after(AlarmKind::Advance, 1, now, Duration::from_secs(120));

        let midway = now + chrono::Duration::seconds(45);
        assert_eq!(alarm.remaining(midway), Duration::from_secs(75));
        assert!(!alarm.is_due(midway));
    }

    #[test]
    fn test_serde_roundtrip() {
        let alarm = PendingAlarm::after(
            AlarmKind::Watchdog,
            7,
            Utc::now(),
            Duration::from_secs(300),
        );
        let json = serde_json::to_string(&alarm).unwrap();
        let back: PendingAlarm = serde_json::from_str(&json).unwrap();
        assert_eq!(back, alarm);
    }
}
