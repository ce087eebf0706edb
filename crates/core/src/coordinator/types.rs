//! Types for the session coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::criteria::CriteriaError;
use crate::executor::{ExecutorError, TabId};
use crate::storage::StoreError;
use crate::tabs::TabError;

/// Errors returned to whoever sent a panel command.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The criteria cannot be searched for.
    #[error("invalid criteria: {0}")]
    InvalidCriteria(#[from] CriteriaError),

    /// A session is already tracked for the tab.
    #[error("a search is already running in tab {0}")]
    AlreadyRunning(TabId),

    /// Page executor error.
    #[error("page executor error: {0}")]
    Executor(#[from] ExecutorError),

    /// Tab controller error.
    #[error("tab error: {0}")]
    Tab(#[from] TabError),

    /// State store error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Where a tracked session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// An engine task is driving the page.
    Running,
    /// The engine lost the page to an expected reload; waiting for the
    /// executor to announce readiness again.
    AwaitingReload,
}

/// Point-in-time view of the coordinator, for diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    pub sessions: Vec<SessionSummary>,
    pub owned_tabs: Vec<TabId>,
    pub ready_tabs: Vec<TabId>,
    pub scheduled_reloads: Vec<TabId>,
}

/// One tracked session in a [`CoordinatorStatus`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub tab_id: TabId,
    pub phase: SessionPhase,
    pub tickets_checked: u32,
    pub tickets_found: u32,
    pub tickets_purchased: u32,
    pub tickets_to_buy: u32,
    pub started_at: DateTime<Utc>,
}
