//! Typed access to the records the coordinator persists.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::criteria::SearchCriteria;
use crate::executor::TabId;

use super::schema::{keys, PersistedProgress, SearchState, PROGRESS_VERSION, SEARCH_STATE_VERSION};
use super::store::{KeyValueStore, StoreError};

/// Typed facade over a [`KeyValueStore`].
#[derive(Clone)]
pub struct StateStore {
    kv: Arc<dyn KeyValueStore>,
}

impl StateStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// The underlying store.
    pub fn raw(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.kv.get(key)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::Serialization {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    fn read_versioned<T: DeserializeOwned>(
        &self,
        key: &str,
        supported: u32,
    ) -> Result<Option<T>, StoreError> {
        if let Some(value) = self.kv.get(key)? {
            if let Some(version) = value.get("version").and_then(Value::as_u64) {
                if version > u64::from(supported) {
                    return Err(StoreError::UnsupportedVersion {
                        key: key.to_string(),
                        version: u32::try_from(version).unwrap_or(u32::MAX),
                    });
                }
            }
        }
        self.read(key)
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|e| StoreError::Serialization {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.kv.set(key, &value)
    }

    // =========================================================================
    // Purchase progress
    // =========================================================================

    pub fn load_progress(&self) -> Result<Option<PersistedProgress>, StoreError> {
        self.read_versioned(keys::PURCHASE_PROGRESS, PROGRESS_VERSION)
    }

    /// Progress for `tab_id` only; a checkpoint left by another tab is ignored.
    pub fn load_progress_for(&self, tab_id: TabId) -> Result<Option<PersistedProgress>, StoreError> {
        Ok(self.load_progress()?.filter(|p| p.is_for(tab_id)))
    }

    /// Write a checkpoint, stamping it with the current time.
    pub fn save_progress(&self, progress: &PersistedProgress) -> Result<(), StoreError> {
        let mut stamped = progress.clone();
        stamped.version = PROGRESS_VERSION;
        stamped.timestamp = Utc::now();
        self.write(keys::PURCHASE_PROGRESS, &stamped)
    }

    pub fn clear_progress(&self) -> Result<(), StoreError> {
        self.kv.remove(keys::PURCHASE_PROGRESS)
    }

    // =========================================================================
    // Last status and state
    // =========================================================================

    pub fn load_search_state(&self) -> Result<Option<SearchState>, StoreError> {
        self.read_versioned(keys::LAST_SEARCH_STATE, SEARCH_STATE_VERSION)
    }

    pub fn save_search_state(&self, state: &SearchState) -> Result<(), StoreError> {
        self.write(keys::LAST_SEARCH_STATE, state)
    }

    pub fn load_status(&self) -> Result<Option<String>, StoreError> {
        self.read(keys::LAST_SEARCH_STATUS)
    }

    pub fn save_status(&self, status: &str) -> Result<(), StoreError> {
        self.write(keys::LAST_SEARCH_STATUS, &status)
    }

    // =========================================================================
    // Workspace and preferences
    // =========================================================================

    pub fn load_owned_tabs(&self) -> Result<BTreeSet<TabId>, StoreError> {
        Ok(self.read(keys::OWNED_TABS)?.unwrap_or_default())
    }

    pub fn save_owned_tabs(&self, tabs: &BTreeSet<TabId>) -> Result<(), StoreError> {
        self.write(keys::OWNED_TABS, tabs)
    }

    pub fn load_last_criteria(&self) -> Result<Option<SearchCriteria>, StoreError> {
        self.read(keys::LAST_CRITERIA)
    }

    pub fn save_last_criteria(&self, criteria: &SearchCriteria) -> Result<(), StoreError> {
        self.write(keys::LAST_CRITERIA, criteria)
    }

    /// Test mode opens the payment panel without paying. Off unless set.
    pub fn test_mode(&self) -> Result<bool, StoreError> {
        Ok(self.read(keys::TEST_MODE)?.unwrap_or(false))
    }

    pub fn set_test_mode(&self, enabled: bool) -> Result<(), StoreError> {
        self.write(keys::TEST_MODE, &enabled)
    }
}
