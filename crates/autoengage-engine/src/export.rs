//! Activity log export rendering.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use autoengage_protocols::{ExportFormat, ExportPayload, LogEntry};

/// Render the export payload in the requested format.
pub fn render(format: ExportFormat, payload: &ExportPayload, now: DateTime<Utc>) -> String {
    match format {
        ExportFormat::Csv => render_csv(payload),
        ExportFormat::Json => render_json(payload, now),
    }
}

/// Quote a CSV field, doubling any internal quotes.
fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn csv_row(entry: &LogEntry) -> String {
    let data = entry
        .data
        .as_ref()
        .map(|d| d.to_string())
        .unwrap_or_default();
    [
        csv_field(&entry.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)),
        csv_field(&entry.kind.to_string()),
        csv_field(&entry.message),
        csv_field(&data),
    ]
    .join(",")
}

fn render_csv(payload: &ExportPayload) -> String {
    let mut lines = Vec::with_capacity(payload.logs.len() + 1);
    lines.push("Timestamp,Type,Message,Data".to_string());
    for entry in &payload.logs {
        lines.push(csv_row(entry));
    }
    lines.join("\n")
}

fn render_json(payload: &ExportPayload, now: DateTime<Utc>) -> String {
    let document = json!({
        "export_time": now.to_rfc3339_opts(SecondsFormat::Secs, true),
        "statistics": payload.statistics,
        "logs": payload.logs,
    });
    // A json! document of serializable parts cannot fail to render.
    serde_json::to_string_pretty(&document).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoengage_protocols::{LogKind, Statistics};
    use serde_json::json;

    fn payload(logs: Vec<LogEntry>) -> ExportPayload {
        ExportPayload {
            statistics: Statistics {
                total: 2,
                processed: 1,
                failed: 1,
                skipped: 0,
                liked: 1,
                commented: 0,
            },
            logs,
        }
    }

    #[test]
    fn test_csv_header_and_rows() {
        let entry = LogEntry::new(LogKind::Info, "Opened: https://example.com/post/1");
        let csv = render(ExportFormat::Csv, &payload(vec![entry]), Utc::now());

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Timestamp,Type,Message,Data"));
        let row = lines.next().unwrap();
        assert!(row.contains("\"info\""));
        assert!(row.contains("\"Opened: https://example.com/post/1\""));
        assert!(row.ends_with(",\"\""));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_csv_doubles_internal_quotes() {
        let entry = LogEntry::new(LogKind::Error, r#"Failed: button "Like" missing"#);
        let csv = render(ExportFormat::Csv, &payload(vec![entry]), Utc::now());

        assert!(csv.contains(r#""Failed: button ""Like"" missing""#));
    }

    #[test]
    fn test_csv_data_column_carries_json() {
        let entry = LogEntry::new(LogKind::Warning, "Skipped: https://example.com/post/2")
            .with_data(json!({"reason": "already_processed"}));
        let csv = render(ExportFormat::Csv, &payload(vec![entry]), Utc::now());

        // The JSON payload's own quotes are doubled inside the quoted field.
        assert!(csv.contains(r#""{""reason"":""already_processed""}""#));
    }

    #[test]
    fn test_json_document_shape() {
        let entry = LogEntry::new(LogKind::Success, "Done: https://example.com/post/1 | Liked");
        let now = Utc::now();
        let rendered = render(ExportFormat::Json, &payload(vec![entry]), now);

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["statistics"]["total"], 2);
        assert_eq!(value["statistics"]["processed"], 1);
        assert_eq!(value["logs"][0]["kind"], "success");
        assert_eq!(
            value["export_time"],
            now.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }

    #[test]
    fn test_empty_log_still_renders() {
        let csv = render(ExportFormat::Csv, &payload(vec![]), Utc::now());
        assert_eq!(csv, "Timestamp,Type,Message,Data");

        let json_doc = render(ExportFormat::Json, &payload(vec![]), Utc::now());
        let value: serde_json::Value = serde_json::from_str(&json_doc).unwrap();
        assert_eq!(value["logs"], json!([]));
    }
}
