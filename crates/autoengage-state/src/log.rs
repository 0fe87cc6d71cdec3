//! Bounded activity log.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use autoengage_protocols::LogEntry;

/// Maximum entries the activity log retains.
pub const LOG_CAPACITY: usize = 100;

/// Append-only log of run activity, bounded at [`LOG_CAPACITY`] entries.
///
/// When full, appending evicts the oldest entry. Entries are kept oldest
/// first, which is also the order exports emit them in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
}

impl ActivityLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, evicting the oldest when at capacity.
    pub fn push(&mut self, entry: LogEntry) {
        if self.entries.len() == LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Snapshot of all entries, oldest first.
    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoengage_protocols::LogKind;

    #[test]
    fn test_push_and_order() {
        let mut log = ActivityLog::new();
        log.push(LogEntry::new(LogKind::Info, "first"));
        log.push(LogEntry::new(LogKind::Info, "second"));

        let messages: Vec<_> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_eviction_at_capacity() {
        let mut log = ActivityLog::new();
        for i in 0..105 {
            log.push(LogEntry::new(LogKind::Info, format!("entry {i}")));
        }

        assert_eq!(log.len(), LOG_CAPACITY);
        // The five oldest entries are gone
        let first = log.entries().next().unwrap();
        assert_eq!(first.message, "entry 5");
        let last = log.entries().last().unwrap();
        assert_eq!(last.message, "entry 104");
    }

    #[test]
    fn test_clear() {
        let mut log = ActivityLog::new();
        log.push(LogEntry::new(LogKind::Info, "something"));
        assert!(!log.is_empty());
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut log = ActivityLog::new();
        log.push(LogEntry::new(LogKind::Warning, "Retrying in 5s"));

        let json = serde_json::to_string(&log).unwrap();
        let back: ActivityLog = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.entries().next().unwrap().message, "Retrying in 5s");
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut log = ActivityLog::new();
        log.push(LogEntry::new(LogKind::Info, "hello"));
        let json = serde_json::to_value(&log).unwrap();
        assert!(json.is_array());
    }
}
