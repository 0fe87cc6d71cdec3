//! Configuration for the engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Engine configuration.
///
/// These are deployment knobs, distinct from the per-run `RunSettings`
/// carried in each start request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Delay between a tab-load signal and the action dispatch, in
    /// milliseconds. Lets late DOM work finish before acting.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Pause after a URL fails terminally before moving on, in seconds.
    #[serde(default = "default_failure_advance_secs")]
    pub failure_advance_secs: u64,

    /// Delays at or above this many seconds are persisted as durable
    /// alarms so a restart re-arms them for the remainder.
    #[serde(default = "default_alarm_threshold_secs")]
    pub alarm_threshold_secs: u64,

    /// Event channel capacity.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_settle_delay_ms() -> u64 {
    2000
}

fn default_failure_advance_secs() -> u64 {
    3
}

fn default_alarm_threshold_secs() -> u64 {
    60
}

fn default_event_capacity() -> usize {
    64
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            failure_advance_secs: default_failure_advance_secs(),
            alarm_threshold_secs: default_alarm_threshold_secs(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl EngineConfig {
    /// Settle delay as a Duration.
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Failure-advance delay as a Duration.
    pub fn failure_advance(&self) -> Duration {
        Duration::from_secs(self.failure_advance_secs)
    }

    /// Whether a delay is long enough to warrant a durable alarm.
    pub fn needs_durable_alarm(&self, delay: Duration) -> bool {
        delay >= Duration::from_secs(self.alarm_threshold_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.settle_delay_ms, 2000);
        assert_eq!(config.failure_advance_secs, 3);
        assert_eq!(config.alarm_threshold_secs, 60);
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn test_durations() {
        let config = EngineConfig::default();
        assert_eq!(config.settle_delay(), Duration::from_millis(2000));
        assert_eq!(config.failure_advance(), Duration::from_secs(3));
    }

    #[test]
    fn test_durable_alarm_threshold() {
        let config = EngineConfig::default();
        assert!(!config.needs_durable_alarm(Duration::from_secs(30)));
        assert!(config.needs_durable_alarm(Duration::from_secs(60)));
        assert!(config.needs_durable_alarm(Duration::from_secs(300)));
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: EngineConfig = serde_json::from_str(r#"{"settle_delay_ms": 500}"#).unwrap();
        assert_eq!(config.settle_delay_ms, 500);
        assert_eq!(config.failure_advance_secs, 3);
    }
}
