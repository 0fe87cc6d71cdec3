//! Browser tab control trait and identifiers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identifier of the single automation tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// Errors from tab operations.
#[derive(Debug, Error)]
pub enum TabError {
    /// The referenced tab no longer exists.
    #[error("tab {0} not found")]
    NotFound(TabId),

    /// A new tab could not be opened.
    #[error("failed to open tab: {0}")]
    CreateFailed(String),

    /// Navigation was refused or failed to start.
    #[error("failed to navigate tab {tab}: {reason}")]
    NavigateFailed { tab: TabId, reason: String },
}

/// Owns the single browser tab a run drives.
///
/// Load completion is not reported through this trait; the driver feeds
/// tab lifecycle events into the engine separately.
#[async_trait]
pub trait TabController: Send + Sync {
    /// Open a fresh tab at `url` and return its id.
    async fn open(&self, url: &str) -> Result<TabId, TabError>;

    /// Point an existing tab at `url`.
    async fn navigate(&self, tab: TabId, url: &str) -> Result<(), TabError>;

    /// Close a tab. Closing an already-gone tab is not an error.
    async fn close(&self, tab: TabId) -> Result<(), TabError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_id_display() {
        assert_eq!(TabId(7).to_string(), "tab-7");
    }

    #[test]
    fn test_tab_error_display() {
        assert_eq!(TabError::NotFound(TabId(3)).to_string(), "tab tab-3 not found");
        assert_eq!(
            TabError::CreateFailed("browser gone".to_string()).to_string(),
            "failed to open tab: browser gone"
        );
        assert_eq!(
            TabError::NavigateFailed {
                tab: TabId(1),
                reason: "bad url".to_string()
            }
            .to_string(),
            "failed to navigate tab tab-1: bad url"
        );
    }

    #[test]
    fn test_tab_id_serde() {
        let json = serde_json::to_string(&TabId(42)).unwrap();
        assert_eq!(json, "42");
        let back: TabId = serde_json::from_str("42").unwrap();
        assert_eq!(back, TabId(42));
    }
}
