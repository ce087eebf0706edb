//! Mock tab controller for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::executor::TabId;
use crate::tabs::{TabController, TabError, TabInfo};

/// Mock implementation of the TabController trait.
///
/// Keeps an in-memory tab list. Created tabs get ids from 1000 upward.
/// Every mutating call is recorded so tests can assert on it.
#[derive(Debug)]
pub struct MockTabController {
    tabs: Arc<RwLock<BTreeMap<TabId, String>>>,
    next_id: Arc<RwLock<i64>>,
    activated: Arc<RwLock<Vec<TabId>>>,
    removed: Arc<RwLock<Vec<TabId>>>,
    created: Arc<RwLock<Vec<String>>>,
    reloaded: Arc<RwLock<Vec<TabId>>>,
    failure: Arc<RwLock<Option<TabError>>>,
}

impl Default for MockTabController {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTabController {
    pub fn new() -> Self {
        Self {
            tabs: Arc::new(RwLock::new(BTreeMap::new())),
            next_id: Arc::new(RwLock::new(1000)),
            activated: Arc::new(RwLock::new(Vec::new())),
            removed: Arc::new(RwLock::new(Vec::new())),
            created: Arc::new(RwLock::new(Vec::new())),
            reloaded: Arc::new(RwLock::new(Vec::new())),
            failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Add an existing tab.
    pub async fn add_tab(&self, tab_id: TabId, url: &str) {
        self.tabs.write().await.insert(tab_id, url.to_string());
    }

    /// Navigate a tab to another URL.
    pub async fn set_url(&self, tab_id: TabId, url: &str) {
        self.tabs.write().await.insert(tab_id, url.to_string());
    }

    /// Make every call fail with `error` until cleared.
    pub async fn fail_all(&self, error: TabError) {
        *self.failure.write().await = Some(error);
    }

    pub async fn clear_failure(&self) {
        *self.failure.write().await = None;
    }

    pub async fn tab_ids(&self) -> Vec<TabId> {
        self.tabs.read().await.keys().copied().collect()
    }

    pub async fn activated(&self) -> Vec<TabId> {
        self.activated.read().await.clone()
    }

    pub async fn removed(&self) -> Vec<TabId> {
        self.removed.read().await.clone()
    }

    /// URLs of tabs opened through `create`.
    pub async fn created(&self) -> Vec<String> {
        self.created.read().await.clone()
    }

    pub async fn reloaded(&self) -> Vec<TabId> {
        self.reloaded.read().await.clone()
    }

    async fn check_failure(&self) -> Result<(), TabError> {
        match self.failure.read().await.clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TabController for MockTabController {
    async fn get(&self, tab_id: TabId) -> Result<Option<TabInfo>, TabError> {
        self.check_failure().await?;
        Ok(self.tabs.read().await.get(&tab_id).map(|url| TabInfo {
            id: tab_id,
            url: url.clone(),
        }))
    }

    async fn query(&self, url_prefix: &str) -> Result<Vec<TabInfo>, TabError> {
        self.check_failure().await?;
        Ok(self
            .tabs
            .read()
            .await
            .iter()
            .filter(|(_, url)| url.starts_with(url_prefix))
            .map(|(id, url)| TabInfo {
                id: *id,
                url: url.clone(),
            })
            .collect())
    }

    async fn create(&self, url: &str) -> Result<TabInfo, TabError> {
        self.check_failure().await?;
        let id = {
            let mut next = self.next_id.write().await;
            let id = TabId(*next);
            *next += 1;
            id
        };
        self.tabs.write().await.insert(id, url.to_string());
        self.created.write().await.push(url.to_string());
        Ok(TabInfo {
            id,
            url: url.to_string(),
        })
    }

    async fn activate(&self, tab_id: TabId) -> Result<(), TabError> {
        self.check_failure().await?;
        if !self.tabs.read().await.contains_key(&tab_id) {
            return Err(TabError::NotFound(tab_id));
        }
        self.activated.write().await.push(tab_id);
        Ok(())
    }

    async fn remove(&self, tab_id: TabId) -> Result<(), TabError> {
        self.check_failure().await?;
        if self.tabs.write().await.remove(&tab_id).is_none() {
            return Err(TabError::NotFound(tab_id));
        }
        self.removed.write().await.push(tab_id);
        Ok(())
    }

    async fn reload(&self, tab_id: TabId) -> Result<(), TabError> {
        self.check_failure().await?;
        if !self.tabs.read().await.contains_key(&tab_id) {
            return Err(TabError::NotFound(tab_id));
        }
        self.reloaded.write().await.push(tab_id);
        Ok(())
    }
}
