//! Run settings, start requests, and export formats.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::status::{LogEntry, Statistics};

fn default_min_delay() -> u64 {
    5
}

fn default_max_delay() -> u64 {
    15
}

fn default_url_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_enabled() -> bool {
    true
}

/// Operator-tunable knobs for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// Comment text posted on each URL when commenting is enabled.
    #[serde(default)]
    pub comment: String,
    /// Lower bound of the random inter-URL delay, in seconds.
    #[serde(default = "default_min_delay")]
    pub min_delay_secs: u64,
    /// Upper bound of the random inter-URL delay, in seconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,
    /// Watchdog window for a single URL, in seconds.
    #[serde(default = "default_url_timeout")]
    pub url_timeout_secs: u64,
    /// Retries allowed after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Simulate effects instead of performing them.
    #[serde(default)]
    pub dry_run: bool,
    /// Whether to like posts.
    #[serde(default = "default_enabled")]
    pub enable_like: bool,
    /// Whether to comment on posts.
    #[serde(default = "default_enabled")]
    pub enable_comment: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            comment: String::new(),
            min_delay_secs: default_min_delay(),
            max_delay_secs: default_max_delay(),
            url_timeout_secs: default_url_timeout(),
            max_retries: default_max_retries(),
            dry_run: false,
            enable_like: true,
            enable_comment: true,
        }
    }
}

impl RunSettings {
    /// Check internal consistency of the settings.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.min_delay_secs > self.max_delay_secs {
            return Err(SettingsError::DelayRange {
                min: self.min_delay_secs,
                max: self.max_delay_secs,
            });
        }
        if self.enable_comment && self.comment.trim().is_empty() {
            return Err(SettingsError::EmptyComment);
        }
        Ok(())
    }

    /// Total attempts a URL may consume: the first try plus retries.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Errors from validating run settings or start requests.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    /// The URL queue was empty.
    #[error("no URLs provided")]
    NoUrls,

    /// min delay exceeds max delay.
    #[error("invalid delay range: min {min}s > max {max}s")]
    DelayRange { min: u64, max: u64 },

    /// Commenting enabled but no comment text given.
    #[error("commenting is enabled but the comment text is empty")]
    EmptyComment,
}

/// Everything needed to begin a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartRequest {
    /// Queue of post URLs, processed in order.
    pub urls: Vec<String>,
    /// Knobs for this run.
    #[serde(default)]
    pub settings: RunSettings,
}

impl StartRequest {
    /// Create a request with default settings.
    pub fn new(urls: Vec<String>) -> Self {
        Self {
            urls,
            settings: RunSettings::default(),
        }
    }

    /// Check the request is runnable.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.urls.is_empty() {
            return Err(SettingsError::NoUrls);
        }
        self.settings.validate()
    }
}

/// Output shape for activity log exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// RFC 4180 style CSV, all fields quoted.
    Csv,
    /// Pretty-printed JSON document.
    Json,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        };
        f.write_str(s)
    }
}

/// Material handed to the export renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPayload {
    /// Counters at export time.
    pub statistics: Statistics,
    /// Activity log entries, oldest first.
    pub logs: Vec<LogEntry>,
}
