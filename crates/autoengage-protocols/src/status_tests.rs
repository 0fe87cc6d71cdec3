use super::*;
use chrono::Duration;

#[test]
fn test_run_phase_display() {
    assert_eq!(RunPhase::Idle.to_string(), "idle");
    assert_eq!(RunPhase::Running.to_string(), "running");
    assert_eq!(RunPhase::Paused.to_string(), "paused");
    assert_eq!(RunPhase::Completed.to_string(), "completed");
}

#[test]
fn test_run_phase_is_active() {
    assert!(RunPhase::Running.is_active());
    assert!(RunPhase::Paused.is_active());
    assert!(!RunPhase::Idle.is_active());
    assert!(!RunPhase::Completed.is_active());
}

#[test]
fn test_url_phase_terminal() {
    assert!(UrlPhase::Completed.is_terminal());
    assert!(UrlPhase::Failed.is_terminal());
    assert!(!UrlPhase::Pending.is_terminal());
    assert!(!UrlPhase::Processing.is_terminal());
    assert!(!UrlPhase::Retrying.is_terminal());
}

#[test]
fn test_url_phase_in_flight() {
    assert!(UrlPhase::Processing.is_in_flight());
    assert!(!UrlPhase::Pending.is_in_flight());
    assert!(!UrlPhase::Retrying.is_in_flight());
    assert!(!UrlPhase::Completed.is_in_flight());
    assert!(!UrlPhase::Failed.is_in_flight());
}

#[test]
fn test_url_phase_serde() {
    let json = serde_json::to_string(&UrlPhase::Retrying).unwrap();
    assert_eq!(json, "\"retrying\"");
    let back: UrlPhase = serde_json::from_str("\"failed\"").unwrap();
    assert_eq!(back, UrlPhase::Failed);
}

#[test]
fn test_url_status_pending() {
    let status = UrlStatus::pending();
    assert_eq!(status.phase, UrlPhase::Pending);
    assert_eq!(status.attempts, 0);
    assert!(!status.liked);
    assert!(!status.commented);
    assert!(!status.skipped);
    assert!(status.error.is_none());
    assert!(status.started_at.is_none());
    assert!(status.finished_at.is_none());
}

#[test]
fn test_url_status_omits_empty_optionals() {
    let json = serde_json::to_value(UrlStatus::pending()).unwrap();
    let obj = json.as_object().unwrap();
    assert!(!obj.contains_key("error"));
    assert!(!obj.contains_key("started_at"));
    assert!(!obj.contains_key("finished_at"));
}

#[test]
fn test_statistics_new() {
    let stats = Statistics::new(42);
    assert_eq!(stats.total, 42);
    assert_eq!(stats.processed, 0);
    assert_eq!(stats.failed, 0);
    assert_eq!(stats.skipped, 0);
    assert_eq!(stats.liked, 0);
    assert_eq!(stats.commented, 0);
}

#[test]
fn test_summary_success_rate() {
    let started = Utc::now();
    let now = started + Duration::seconds(90);

    let stats = Statistics {
        total: 3,
        processed: 2,
        failed: 1,
        skipped: 0,
        liked: 2,
        commented: 1,
    };
    let summary = Summary::from_statistics(&stats, started, now);
    // 2/3 = 66.67 rounds to 67
    assert_eq!(summary.success_rate, 67);
    assert_eq!(summary.completion_time_seconds, 90);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);
}

#[test]
fn test_summary_empty_queue_rate_is_zero() {
    let started = Utc::now();
    let stats = Statistics::new(0);
    let summary = Summary::from_statistics(&stats, started, started);
    assert_eq!(summary.success_rate, 0);
}

#[test]
fn test_summary_full_success_rate() {
    let started = Utc::now();
    let stats = Statistics {
        total: 4,
        processed: 4,
        failed: 0,
        skipped: 1,
        liked: 3,
        commented: 3,
    };
    let summary = Summary::from_statistics(&stats, started, started);
    assert_eq!(summary.success_rate, 100);
}

#[test]
fn test_log_entry_builder() {
    let entry = LogEntry::new(LogKind::Success, "Done: https://example.com/post/1")
        .with_data(serde_json::json!({"url": "https://example.com/post/1"}));
    assert_eq!(entry.kind, LogKind::Success);
    assert_eq!(entry.message, "Done: https://example.com/post/1");
    assert!(entry.data.is_some());
}

#[test]
fn test_log_entry_omits_missing_data() {
    let entry = LogEntry::new(LogKind::Info, "Automation stopped");
    let json = serde_json::to_value(&entry).unwrap();
    assert!(!json.as_object().unwrap().contains_key("data"));
}

#[test]
fn test_log_kind_serde() {
    assert_eq!(serde_json::to_string(&LogKind::Warning).unwrap(), "\"warning\"");
    let back: LogKind = serde_json::from_str("\"error\"").unwrap();
    assert_eq!(back, LogKind::Error);
}
