//! Versioned records kept in the key-value store.
//!
//! Every record carries a `version`. Missing fields fall back to defaults so
//! older blobs (including the camelCase layout written by earlier releases)
//! still load; a version newer than this build understands is rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::criteria::SearchCriteria;
use crate::executor::TabId;
use crate::ticket::Ticket;

/// Storage keys.
pub mod keys {
    pub const LAST_SEARCH_STATUS: &str = "last_search_status";
    pub const LAST_SEARCH_STATE: &str = "last_search_state";
    pub const PURCHASE_PROGRESS: &str = "purchase_progress";
    pub const OWNED_TABS: &str = "owned_tabs";
    pub const LAST_CRITERIA: &str = "last_criteria";
    pub const TEST_MODE: &str = "test_mode";
}

pub const PROGRESS_VERSION: u32 = 1;
pub const SEARCH_STATE_VERSION: u32 = 1;

fn default_progress_version() -> u32 {
    PROGRESS_VERSION
}

fn default_search_state_version() -> u32 {
    SEARCH_STATE_VERSION
}

/// Durable purchase checkpoint, written before every reload and after every payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedProgress {
    #[serde(default = "default_progress_version")]
    pub version: u32,
    #[serde(alias = "tabId")]
    pub tab_id: TabId,
    pub criteria: SearchCriteria,
    #[serde(default, alias = "ticketsChecked")]
    pub tickets_checked: u32,
    #[serde(default, alias = "ticketsFound")]
    pub tickets_found: u32,
    #[serde(default, alias = "ticketsPurchased")]
    pub tickets_purchased: u32,
    #[serde(default, alias = "totalTicketsToBuy")]
    pub total_tickets_to_buy: u32,
    /// Milliseconds since the epoch on the wire.
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl PersistedProgress {
    pub fn new(tab_id: TabId, criteria: SearchCriteria, total_tickets_to_buy: u32) -> Self {
        Self {
            version: PROGRESS_VERSION,
            tab_id,
            criteria,
            tickets_checked: 0,
            tickets_found: 0,
            tickets_purchased: 0,
            total_tickets_to_buy,
            timestamp: Utc::now(),
        }
    }

    pub fn is_for(&self, tab_id: TabId) -> bool {
        self.tab_id == tab_id
    }
}

/// Lifecycle status shown to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Running,
    Completed,
    Stopped,
    Error,
}

impl SearchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStatus::Running => "running",
            SearchStatus::Completed => "completed",
            SearchStatus::Stopped => "stopped",
            SearchStatus::Error => "error",
        }
    }
}

/// Who ended a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoppedBy {
    User,
    Success,
    Error,
}

/// Per-tab status record, also persisted as the last search state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    #[serde(default = "default_search_state_version")]
    pub version: u32,
    pub status: SearchStatus,
    #[serde(default, alias = "stoppedAt")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "stoppedBy")]
    pub stopped_by: Option<StoppedBy>,
    #[serde(default, alias = "ticketsChecked")]
    pub tickets_checked: u32,
    #[serde(default, alias = "ticketsFound")]
    pub tickets_found: u32,
    #[serde(default, alias = "ticketsPurchased")]
    pub tickets_purchased: u32,
    #[serde(default, alias = "errorMessage")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    #[serde(default)]
    pub criteria: Option<SearchCriteria>,
}

impl SearchState {
    fn base(status: SearchStatus, criteria: Option<SearchCriteria>) -> Self {
        Self {
            version: SEARCH_STATE_VERSION,
            status,
            stopped_at: None,
            stopped_by: None,
            tickets_checked: 0,
            tickets_found: 0,
            tickets_purchased: 0,
            error_message: None,
            message: None,
            tickets: Vec::new(),
            criteria,
        }
    }

    pub fn running(criteria: SearchCriteria) -> Self {
        Self {
            message: Some("Search started...".to_string()),
            ..Self::base(SearchStatus::Running, Some(criteria))
        }
    }

    pub fn stopped(criteria: Option<SearchCriteria>, checked: u32, purchased: u32) -> Self {
        Self {
            stopped_at: Some(Utc::now()),
            stopped_by: Some(StoppedBy::User),
            tickets_checked: checked,
            tickets_purchased: purchased,
            message: Some("Search stopped by user".to_string()),
            ..Self::base(SearchStatus::Stopped, criteria)
        }
    }

    pub fn completed(
        criteria: Option<SearchCriteria>,
        checked: u32,
        found: u32,
        purchased: u32,
        tickets: Vec<Ticket>,
    ) -> Self {
        Self {
            stopped_at: Some(Utc::now()),
            stopped_by: Some(StoppedBy::Success),
            tickets_checked: checked,
            tickets_found: found,
            tickets_purchased: purchased,
            message: Some(format!("Found: {}, Purchased: {}", found, purchased)),
            tickets,
            ..Self::base(SearchStatus::Completed, criteria)
        }
    }

    pub fn error(
        criteria: Option<SearchCriteria>,
        message: impl Into<String>,
        checked: u32,
        found: u32,
        purchased: u32,
    ) -> Self {
        let message = message.into();
        Self {
            stopped_at: Some(Utc::now()),
            stopped_by: Some(StoppedBy::Error),
            tickets_checked: checked,
            tickets_found: found,
            tickets_purchased: purchased,
            error_message: Some(message.clone()),
            message: Some(message),
            ..Self::base(SearchStatus::Error, criteria)
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SearchStatus::Running
    }
}
