//! Messages exchanged with the control panel.

use serde::{Deserialize, Serialize};

use crate::criteria::SearchCriteria;
use crate::executor::TabId;
use crate::storage::SearchState;
use crate::ticket::{Ticket, UserData};

/// A request from the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelCommand {
    /// The panel became visible; prepare the workspace tab.
    PanelOpened,
    StartSearch { criteria: SearchCriteria },
    StopSearch { tab_id: TabId },
    CheckSearchStatus { tab_id: TabId },
    ScheduleReload { tab_id: TabId, delay_ms: u64 },
    CheckPageLoaded { tab_id: TabId },
    GetUserData { tab_id: TabId },
}

impl PanelCommand {
    pub fn name(&self) -> &'static str {
        match self {
            PanelCommand::PanelOpened => "panel_opened",
            PanelCommand::StartSearch { .. } => "start_search",
            PanelCommand::StopSearch { .. } => "stop_search",
            PanelCommand::CheckSearchStatus { .. } => "check_search_status",
            PanelCommand::ScheduleReload { .. } => "schedule_reload",
            PanelCommand::CheckPageLoaded { .. } => "check_page_loaded",
            PanelCommand::GetUserData { .. } => "get_user_data",
        }
    }
}

/// The direct answer to a [`PanelCommand`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelReply {
    Workspace {
        tab_id: TabId,
    },
    SearchStarted {
        tab_id: TabId,
    },
    Ack,
    SearchStatus {
        is_searching: bool,
        page_ready: bool,
        search_state: Option<SearchState>,
    },
    PageLoaded {
        loaded: bool,
    },
    UserData {
        user_data: UserData,
    },
}

/// A notification pushed to every connected panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelEvent {
    /// Human-readable status line.
    SearchStatus { status: String },
    SearchProgress { tab_id: TabId, checked: u32 },
    PurchaseProgress { tab_id: TabId, purchased: u32, found: u32 },
    TicketFound { tab_id: TabId, tickets: Vec<Ticket> },
    SearchStopped { tab_id: TabId },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tab_id: Option<TabId>,
        error: String,
    },
    TabClosed { tab_id: TabId },
    ClosePanel,
    UserDataUpdated { tab_id: TabId, user_data: UserData },
    AuthChanged { tab_id: TabId },
}

impl PanelEvent {
    /// Label used in metrics.
    pub fn event_type(&self) -> &'static str {
        match self {
            PanelEvent::SearchStatus { .. } => "search_status",
            PanelEvent::SearchProgress { .. } => "search_progress",
            PanelEvent::PurchaseProgress { .. } => "purchase_progress",
            PanelEvent::TicketFound { .. } => "ticket_found",
            PanelEvent::SearchStopped { .. } => "search_stopped",
            PanelEvent::Error { .. } => "error",
            PanelEvent::TabClosed { .. } => "tab_closed",
            PanelEvent::ClosePanel => "close_panel",
            PanelEvent::UserDataUpdated { .. } => "user_data_updated",
            PanelEvent::AuthChanged { .. } => "auth_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_start_search_parses() {
        let cmd: PanelCommand = serde_json::from_value(json!({
            "type": "start_search",
            "criteria": {"search_numbers": [5, 14], "mode": "same_half", "tickets_to_buy": 2}
        }))
        .unwrap();
        match cmd {
            PanelCommand::StartSearch { criteria } => {
                assert_eq!(criteria.search_numbers, vec![5, 14]);
                assert_eq!(criteria.tickets_to_buy, 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_mode_fails_to_parse() {
        let result: Result<PanelCommand, _> = serde_json::from_value(json!({
            "type": "start_search",
            "criteria": {"search_numbers": [5], "mode": "diagonal"}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_error_event_omits_missing_tab() {
        let json = serde_json::to_value(PanelEvent::Error {
            tab_id: None,
            error: "boom".into(),
        })
        .unwrap();
        assert_eq!(json, json!({"type": "error", "error": "boom"}));
    }
}
