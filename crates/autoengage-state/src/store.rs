//! Automation state storage.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use crate::error::StateError;
use crate::state::AutomationState;

/// File name of the single persisted record.
const STATE_FILE: &str = "automation_state.json";

/// Automation state storage trait.
///
/// Holds at most one record: the current `AutomationState`. The engine
/// saves after every transition and loads once at startup.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state, if any.
    async fn load(&self) -> Result<Option<AutomationState>, StateError>;

    /// Persist the state, replacing any previous record.
    async fn save(&self, state: &AutomationState) -> Result<(), StateError>;

    /// Remove the persisted record.
    async fn clear(&self) -> Result<(), StateError>;
}

/// In-memory state store for testing and embedding.
pub struct MemoryStateStore {
    state: tokio::sync::RwLock<Option<AutomationState>>,
}

impl MemoryStateStore {
    /// Create a new memory store.
    pub fn new() -> Self {
        Self {
            state: tokio::sync::RwLock::new(None),
        }
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<Option<AutomationState>, StateError> {
        let state = self.state.read().await;
        Ok(state.clone())
    }

    async fn save(&self, state: &AutomationState) -> Result<(), StateError> {
        let mut slot = self.state.write().await;
        *slot = Some(state.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StateError> {
        let mut slot = self.state.write().await;
        *slot = None;
        Ok(())
    }
}

/// File system based state store for persistence across restarts.
///
/// The state lives in a single JSON file:
/// ```text
/// {storage_path}/
/// └── automation_state.json
/// ```
pub struct FileStateStore {
    /// Base storage path.
    storage_path: PathBuf,
}

impl FileStateStore {
    /// Create a new file-based state store.
    ///
    /// # Arguments
    /// * `storage_path` - Base directory for the state file
    pub async fn new(storage_path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let storage_path = storage_path.into();

        // Ensure base directory exists
        fs::create_dir_all(&storage_path).await?;

        debug!("FileStateStore initialized at {:?}", storage_path);

        Ok(Self { storage_path })
    }

    /// Path of the state file.
    fn state_path(&self) -> PathBuf {
        self.storage_path.join(STATE_FILE)
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<Option<AutomationState>, StateError> {
        let path = self.state_path();

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;

        let state: AutomationState = serde_json::from_str(&content).map_err(|e| {
            StateError::Serialization(format!("Failed to deserialize state: {}", e))
        })?;

        Ok(Some(state))
    }

    async fn save(&self, state: &AutomationState) -> Result<(), StateError> {
        let path = self.state_path();

        let content = serde_json::to_string_pretty(state).map_err(|e| {
            StateError::Serialization(format!("Failed to serialize state: {}", e))
        })?;

        fs::write(&path, content).await?;

        debug!(
            "Saved automation state (phase {}, cursor {}) to {:?}",
            state.phase, state.current_index, path
        );
        Ok(())
    }

    async fn clear(&self) -> Result<(), StateError> {
        let path = self.state_path();

        if path.exists() {
            fs::remove_file(&path).await?;
            debug!("Cleared automation state at {:?}", path);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoengage_protocols::{RunPhase, RunSettings, StartRequest};
    use chrono::Utc;
    use tempfile::TempDir;

    fn sample_state() -> AutomationState {
        let request = StartRequest {
            urls: vec!["https://example.com/post/1".to_string()],
            settings: RunSettings {
                comment: "Great post!".to_string(),
                ..Default::default()
            },
        };
        AutomationState::new_run(request, Utc::now())
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStateStore::new();
        assert!(store.load().await.unwrap().is_none());

        let state = sample_state();
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.phase, RunPhase::Running);
        assert_eq!(loaded.urls, state.urls);

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::new(temp_dir.path()).await.unwrap();

        let state = sample_state();
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.phase, RunPhase::Running);
        assert_eq!(loaded.current_index, 0);
        assert_eq!(loaded.statistics.total, 1);
    }

    #[tokio::test]
    async fn test_file_store_load_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::new(temp_dir.path()).await.unwrap();

        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_save_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::new(temp_dir.path()).await.unwrap();

        let mut state = sample_state();
        store.save(&state).await.unwrap();

        state.advance_cursor();
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.current_index, 1);
    }

    #[tokio::test]
    async fn test_file_store_clear() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::new(temp_dir.path()).await.unwrap();

        store.save(&sample_state()).await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());

        // Clearing again is fine
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStateStore::new(temp_dir.path()).await.unwrap();

        fs::write(temp_dir.path().join(STATE_FILE), "not json")
            .await
            .unwrap();

        let result = store.load().await;
        assert!(matches!(result, Err(StateError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_file_store_survives_restart() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = FileStateStore::new(temp_dir.path()).await.unwrap();
            store.save(&sample_state()).await.unwrap();
        }

        // New store instance over the same directory sees the record
        let store = FileStateStore::new(temp_dir.path()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.urls.len(), 1);
    }
}
