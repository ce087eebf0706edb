//! Types for browser tab control.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, WorkflowConfig};
use crate::executor::TabId;

/// Errors that can occur during tab operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TabError {
    #[error("Tab {0} not found")]
    NotFound(TabId),

    #[error("Browser unreachable: {0}")]
    Transport(String),

    #[error("Tab operation failed: {0}")]
    Failed(String),
}

impl TabError {
    pub fn is_transport(&self) -> bool {
        matches!(self, TabError::Transport(_))
    }
}

/// A browser tab as reported by the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: TabId,
    pub url: String,
}

/// Browser tab operations needed by the coordinator.
#[async_trait]
pub trait TabController: Send + Sync {
    /// `Ok(None)` when the tab no longer exists.
    async fn get(&self, tab_id: TabId) -> Result<Option<TabInfo>, TabError>;

    /// Tabs whose URL starts with `url_prefix`.
    async fn query(&self, url_prefix: &str) -> Result<Vec<TabInfo>, TabError>;

    /// Open a new active tab.
    async fn create(&self, url: &str) -> Result<TabInfo, TabError>;

    async fn activate(&self, tab_id: TabId) -> Result<(), TabError>;

    async fn remove(&self, tab_id: TabId) -> Result<(), TabError>;

    async fn reload(&self, tab_id: TabId) -> Result<(), TabError>;
}

/// Compiled view of the workflow URLs.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub target_url: String,
    pub search_page_prefix: String,
    search_page: Regex,
    login_page: Regex,
}

impl Workflow {
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, ConfigError> {
        let compile = |field: &str, pattern: &str| {
            Regex::new(pattern).map_err(|e| {
                ConfigError::ValidationError(format!("{} is not a valid pattern: {}", field, e))
            })
        };
        Ok(Self {
            target_url: config.target_url.clone(),
            search_page_prefix: config.search_page_prefix.clone(),
            search_page: compile("workflow.search_page_pattern", &config.search_page_pattern)?,
            login_page: compile("workflow.login_page_pattern", &config.login_page_pattern)?,
        })
    }

    pub fn is_search_page(&self, url: &str) -> bool {
        self.search_page.is_match(url)
    }

    pub fn is_login_page(&self, url: &str) -> bool {
        self.login_page.is_match(url)
    }

    /// Whether an owned tab may sit on `url` without interrupting a session.
    pub fn is_allowed(&self, url: &str) -> bool {
        self.is_search_page(url) || self.is_login_page(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_workflow_classifies_urls() {
        let workflow = Workflow::from_config(&WorkflowConfig::default()).unwrap();
        assert!(workflow.is_search_page("https://www.stoloto.ru/ruslotto/game?viewType=tickets"));
        assert!(workflow.is_login_page("https://www.stoloto.ru/auth?back=/ruslotto"));
        assert!(workflow.is_allowed("https://www.stoloto.ru/login"));
        assert!(!workflow.is_allowed("https://www.stoloto.ru/news"));
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let config = WorkflowConfig {
            search_page_pattern: "(".to_string(),
            ..WorkflowConfig::default()
        };
        let err = Workflow::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("search_page_pattern"));
    }
}
