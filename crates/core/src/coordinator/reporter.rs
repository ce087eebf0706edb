//! Engine progress sink that persists state and notifies the panel.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use crate::engine::ProgressReporter;
use crate::executor::TabId;
use crate::panel::PanelBroadcaster;
use crate::storage::{SearchState, StateStore};

/// Implementation of ProgressReporter that keeps the tab's search state current.
///
/// Per-ticket progress only goes to the panel; the state record is persisted
/// once per page so a busy search does not hammer the store.
pub(crate) struct SessionReporter {
    pub(crate) tab_id: TabId,
    pub(crate) store: StateStore,
    pub(crate) panel: PanelBroadcaster,
    pub(crate) search_states: Arc<RwLock<HashMap<TabId, SearchState>>>,
}

impl SessionReporter {
    async fn update_state<F>(&self, persist: bool, update: F)
    where
        F: FnOnce(&mut SearchState),
    {
        let snapshot = {
            let mut states = self.search_states.write().await;
            match states.get_mut(&self.tab_id) {
                Some(state) if state.is_running() => {
                    update(state);
                    state.clone()
                }
                _ => return,
            }
        };
        if persist {
            if let Err(e) = self.store.save_search_state(&snapshot) {
                warn!(tab_id = %self.tab_id, error = %e, "Failed to persist search state");
            }
        }
    }
}

#[async_trait]
impl ProgressReporter for SessionReporter {
    async fn ticket_checked(&self, tab_id: TabId, checked: u32) {
        self.panel.search_progress(tab_id, checked);
        self.update_state(false, |state| state.tickets_checked = checked)
            .await;
    }

    async fn page_completed(&self, _tab_id: TabId, checked: u32) {
        self.update_state(true, |state| state.tickets_checked = checked)
            .await;
    }

    async fn status(&self, message: &str) {
        self.panel.status(message);
        if let Err(e) = self.store.save_status(message) {
            warn!(tab_id = %self.tab_id, error = %e, "Failed to persist status");
        }
        let message = message.to_string();
        self.update_state(false, |state| state.message = Some(message))
            .await;
    }

    async fn purchase_progress(&self, tab_id: TabId, purchased: u32, found: u32) {
        self.panel.purchase_progress(tab_id, purchased, found);
        self.update_state(true, |state| {
            state.tickets_purchased = purchased;
            state.tickets_found = found;
        })
        .await;
    }
}
