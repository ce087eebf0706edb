//! Session coordinator implementation.
//!
//! Owns every per-tab session and decides what happens when engines finish,
//! the page reloads, or the tab navigates away or closes:
//! - Start/stop: one session per tab, engine work on a spawned task
//! - Completion: only the session still tracked for the tab may write state
//! - Reloads: expected churn parks the session until the page is ready again

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::criteria::SearchCriteria;
use crate::engine::{
    EngineConfig, EngineError, PurchaseEngine, PurchaseOutcome, SearchEngine, SearchResult,
    Session,
};
use crate::executor::{ExecutorClient, ExecutorEvent, PageExecutor, TabId};
use crate::metrics;
use crate::panel::{PanelBroadcaster, PanelCommand, PanelEvent, PanelReply};
use crate::storage::{PersistedProgress, SearchState, StateStore};
use crate::tabs::{open_workspace, TabController, Workflow};
use crate::ticket::UserData;

use super::reporter::SessionReporter;
use super::types::{CoordinatorError, CoordinatorStatus, SessionPhase, SessionSummary};

const LEFT_PAGE: &str = "Search interrupted: left the page";
const TAB_CLOSED: &str = "Search interrupted: tab was closed";
const PAGE_RELOADED: &str = "Search interrupted: the page was reloaded";

struct TrackedSession {
    session: Arc<Session>,
    phase: SessionPhase,
}

/// How an engine task ended without error.
enum EngineOutcome {
    Search(SearchResult),
    Purchase(PurchaseOutcome),
}

/// The session coordinator - owns session lifecycle for every tab.
///
/// Cloning is cheap: all state is shared.
#[derive(Clone)]
pub struct SessionCoordinator {
    executor: Arc<dyn PageExecutor>,
    tabs: Arc<dyn TabController>,
    workflow: Workflow,
    engine_config: EngineConfig,
    store: StateStore,
    panel: PanelBroadcaster,

    // Runtime state
    sessions: Arc<RwLock<HashMap<TabId, TrackedSession>>>,
    search_states: Arc<RwLock<HashMap<TabId, SearchState>>>,
    scheduled_reloads: Arc<RwLock<HashMap<TabId, JoinHandle<()>>>>,
    owned_tabs: Arc<RwLock<BTreeSet<TabId>>>,
    ready_tabs: Arc<RwLock<HashSet<TabId>>>,
}

impl SessionCoordinator {
    /// Create a coordinator, restoring the owned tab set from the store.
    pub fn new(
        executor: Arc<dyn PageExecutor>,
        tabs: Arc<dyn TabController>,
        workflow: Workflow,
        engine_config: EngineConfig,
        store: StateStore,
        panel: PanelBroadcaster,
    ) -> Result<Self, CoordinatorError> {
        let owned = store.load_owned_tabs()?;
        if !owned.is_empty() {
            info!(count = owned.len(), "Restored owned tabs");
        }

        Ok(Self {
            executor,
            tabs,
            workflow,
            engine_config,
            store,
            panel,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            search_states: Arc::new(RwLock::new(HashMap::new())),
            scheduled_reloads: Arc::new(RwLock::new(HashMap::new())),
            owned_tabs: Arc::new(RwLock::new(owned)),
            ready_tabs: Arc::new(RwLock::new(HashSet::new())),
        })
    }

    pub fn panel(&self) -> &PanelBroadcaster {
        &self.panel
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Dispatch a panel command.
    pub async fn handle_command(
        &self,
        command: PanelCommand,
    ) -> Result<PanelReply, CoordinatorError> {
        debug!(command = command.name(), "Panel command");
        match command {
            PanelCommand::PanelOpened => {
                let tab_id = self.panel_opened().await?;
                Ok(PanelReply::Workspace { tab_id })
            }
            PanelCommand::StartSearch { criteria } => {
                let tab_id = self.start_search(criteria).await?;
                Ok(PanelReply::SearchStarted { tab_id })
            }
            PanelCommand::StopSearch { tab_id } => {
                self.stop_search(tab_id).await;
                Ok(PanelReply::Ack)
            }
            PanelCommand::CheckSearchStatus { tab_id } => Ok(self.check_search_status(tab_id).await),
            PanelCommand::ScheduleReload { tab_id, delay_ms } => {
                self.schedule_reload(tab_id, Duration::from_millis(delay_ms))
                    .await;
                Ok(PanelReply::Ack)
            }
            PanelCommand::CheckPageLoaded { tab_id } => {
                let loaded = self.check_page_loaded(tab_id).await?;
                Ok(PanelReply::PageLoaded { loaded })
            }
            PanelCommand::GetUserData { tab_id } => {
                let user_data = self.get_user_data(tab_id).await?;
                Ok(PanelReply::UserData { user_data })
            }
        }
    }

    /// Dispatch an event pushed by the executor in `tab_id`.
    pub async fn handle_event(&self, tab_id: TabId, event: ExecutorEvent) {
        match event {
            ExecutorEvent::PageReady => self.page_ready(tab_id).await,
            ExecutorEvent::UserDataUpdated { user_data } => {
                self.panel
                    .broadcast(PanelEvent::UserDataUpdated { tab_id, user_data });
            }
            ExecutorEvent::AuthChanged => {
                info!(tab_id = %tab_id, "Authorization changed");
                self.panel.broadcast(PanelEvent::AuthChanged { tab_id });
            }
        }
    }

    /// Prepare the workspace tab for a freshly opened panel.
    pub async fn panel_opened(&self) -> Result<TabId, CoordinatorError> {
        self.prepare_workspace().await
    }

    /// Validate `criteria`, prepare the workspace and spawn an engine on it.
    ///
    /// Returns as soon as the engine task is spawned.
    pub async fn start_search(&self, criteria: SearchCriteria) -> Result<TabId, CoordinatorError> {
        if let Err(e) = criteria.validate() {
            warn!(error = %e, "Rejected search criteria");
            self.panel.error(None, e.to_string());
            return Err(e.into());
        }
        self.store.save_last_criteria(&criteria)?;

        let tab_id = self.prepare_workspace().await?;

        let session = {
            let mut sessions = self.sessions.write().await;
            if sessions.contains_key(&tab_id) {
                warn!(tab_id = %tab_id, "Search already running");
                self.panel
                    .error(Some(tab_id), "A search is already running in this tab");
                return Err(CoordinatorError::AlreadyRunning(tab_id));
            }
            let session = Arc::new(Session::new(tab_id, criteria.clone()));
            sessions.insert(
                tab_id,
                TrackedSession {
                    session: Arc::clone(&session),
                    phase: SessionPhase::Running,
                },
            );
            session
        };

        let resumed = self.reconcile_progress(tab_id, &criteria);

        let (kind, status) = if let Some(progress) = resumed {
            (
                "purchase",
                format!(
                    "Resuming purchase: {} of {} tickets already bought...",
                    progress.tickets_purchased, progress.total_tickets_to_buy
                ),
            )
        } else if criteria.is_purchase_mode() {
            (
                "purchase",
                format!(
                    "Searching for tickets to buy ({})...",
                    criteria.tickets_to_buy
                ),
            )
        } else {
            ("search", "Search started...".to_string())
        };
        let state = SearchState::running(criteria.clone());
        self.record_state(tab_id, state, &status).await;

        metrics::SESSIONS_STARTED.with_label_values(&[kind]).inc();
        metrics::ACTIVE_SESSIONS.inc();
        info!(
            tab_id = %tab_id,
            kind,
            numbers = ?criteria.search_numbers,
            mode = criteria.mode.as_str(),
            "Search started"
        );

        self.spawn_engine(session);
        Ok(tab_id)
    }

    /// Stop the session in `tab_id`, if any.
    pub async fn stop_search(&self, tab_id: TabId) {
        info!(tab_id = %tab_id, "Stop requested");
        self.cancel_reload(tab_id).await;
        self.clear_progress_for(tab_id);

        let parked = {
            let mut sessions = self.sessions.write().await;
            match sessions.get(&tab_id) {
                Some(tracked) => {
                    tracked.session.stop();
                    if tracked.phase == SessionPhase::AwaitingReload {
                        sessions.remove(&tab_id).map(|t| t.session)
                    } else {
                        None
                    }
                }
                None => {
                    debug!(tab_id = %tab_id, "No session to stop");
                    None
                }
            }
        };

        // No engine is running for a parked session, so finish it here.
        if let Some(session) = parked {
            self.finish_stopped(&session).await;
        }
    }

    /// The executor in `tab_id` announced that the page is ready.
    pub async fn page_ready(&self, tab_id: TabId) {
        self.ready_tabs.write().await.insert(tab_id);
        let had_reload = self.consume_reload_marker(tab_id).await;
        debug!(tab_id = %tab_id, had_reload, "Page ready");

        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&tab_id) {
            Some(tracked) if tracked.phase == SessionPhase::Running => {
                debug!(tab_id = %tab_id, "Engine running, nothing to do");
            }
            Some(tracked) => {
                info!(tab_id = %tab_id, "Resuming session after reload");
                tracked.phase = SessionPhase::Running;
                let session = Arc::clone(&tracked.session);
                drop(sessions);
                self.panel.status("Page reloaded, resuming search...");
                self.spawn_engine(session);
            }
            None => {
                // Hold the lock so concurrent announcements see the cleared checkpoint.
                let progress = match self.store.load_progress_for(tab_id) {
                    Ok(progress) => progress,
                    Err(e) => {
                        warn!(tab_id = %tab_id, error = %e, "Failed to read purchase checkpoint");
                        None
                    }
                };
                let Some(progress) = progress else {
                    return;
                };
                warn!(
                    tab_id = %tab_id,
                    purchased = progress.tickets_purchased,
                    total = progress.total_tickets_to_buy,
                    "Page reloaded while a purchase was in progress"
                );
                if let Err(e) = self.store.clear_progress() {
                    warn!(tab_id = %tab_id, error = %e, "Failed to clear purchase checkpoint");
                }
                drop(sessions);

                let state = SearchState::error(
                    Some(progress.criteria),
                    PAGE_RELOADED,
                    progress.tickets_checked,
                    progress.tickets_found,
                    progress.tickets_purchased,
                );
                self.record_state(tab_id, state, PAGE_RELOADED).await;
                self.panel.error(Some(tab_id), PAGE_RELOADED);
                metrics::SESSION_OUTCOMES
                    .with_label_values(&["interrupted"])
                    .inc();
            }
        }
    }

    /// An owned tab navigated to `url`.
    pub async fn tab_updated(&self, tab_id: TabId, url: &str) {
        if !self.owned_tabs.read().await.contains(&tab_id) {
            return;
        }
        if self.workflow.is_allowed(url) {
            debug!(tab_id = %tab_id, url, "Owned tab navigated within the workflow");
            return;
        }
        warn!(tab_id = %tab_id, url, "Owned tab left the search page");
        self.teardown(tab_id, LEFT_PAGE).await;
    }

    /// A tab was closed.
    pub async fn tab_removed(&self, tab_id: TabId) {
        let owned = self.owned_tabs.read().await.contains(&tab_id);
        let tracked = self.sessions.read().await.contains_key(&tab_id);
        if owned {
            self.panel.broadcast(PanelEvent::TabClosed { tab_id });
        }
        if owned || tracked {
            info!(tab_id = %tab_id, "Workspace tab closed");
            self.teardown(tab_id, TAB_CLOSED).await;
        }
        self.search_states.write().await.remove(&tab_id);
    }

    /// Current status for `tab_id`, falling back to the last persisted state.
    pub async fn check_search_status(&self, tab_id: TabId) -> PanelReply {
        let is_searching = self.sessions.read().await.contains_key(&tab_id);
        let page_ready = self.ready_tabs.read().await.contains(&tab_id);
        let mut search_state = self.search_states.read().await.get(&tab_id).cloned();
        if search_state.is_none() {
            search_state = match self.store.load_search_state() {
                Ok(state) => state,
                Err(e) => {
                    warn!(error = %e, "Failed to read last search state");
                    None
                }
            };
        }
        PanelReply::SearchStatus {
            is_searching,
            page_ready,
            search_state,
        }
    }

    /// Reload `tab_id` after `delay`, replacing any earlier timer.
    ///
    /// The marker outlives the timer: it is consumed by the next readiness
    /// announcement, so transport errors caused by the reload are expected.
    pub async fn schedule_reload(&self, tab_id: TabId, delay: Duration) {
        let tabs = Arc::clone(&self.tabs);
        let ready_tabs = Arc::clone(&self.ready_tabs);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            ready_tabs.write().await.remove(&tab_id);
            match tabs.reload(tab_id).await {
                Ok(()) => info!(tab_id = %tab_id, "Scheduled reload fired"),
                Err(e) => warn!(tab_id = %tab_id, error = %e, "Scheduled reload failed"),
            }
        });

        let previous = self.scheduled_reloads.write().await.insert(tab_id, handle);
        if let Some(previous) = previous {
            previous.abort();
        }
        debug!(tab_id = %tab_id, delay_ms = delay.as_millis() as u64, "Reload scheduled");
    }

    pub async fn check_page_loaded(&self, tab_id: TabId) -> Result<bool, CoordinatorError> {
        let client = ExecutorClient::new(Arc::clone(&self.executor), tab_id);
        Ok(client.check_page_loaded().await?)
    }

    pub async fn get_user_data(&self, tab_id: TabId) -> Result<UserData, CoordinatorError> {
        let client = ExecutorClient::new(Arc::clone(&self.executor), tab_id);
        Ok(client.get_user_data().await?)
    }

    pub async fn is_searching(&self, tab_id: TabId) -> bool {
        self.sessions.read().await.contains_key(&tab_id)
    }

    pub async fn phase(&self, tab_id: TabId) -> Option<SessionPhase> {
        self.sessions.read().await.get(&tab_id).map(|t| t.phase)
    }

    pub async fn owned_tabs(&self) -> BTreeSet<TabId> {
        self.owned_tabs.read().await.clone()
    }

    pub async fn is_reload_scheduled(&self, tab_id: TabId) -> bool {
        self.scheduled_reloads.read().await.contains_key(&tab_id)
    }

    /// Snapshot of all runtime state.
    pub async fn status(&self) -> CoordinatorStatus {
        let sessions = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(tab_id, tracked)| SessionSummary {
                tab_id: *tab_id,
                phase: tracked.phase,
                tickets_checked: tracked.session.tickets_checked(),
                tickets_found: tracked.session.tickets_found(),
                tickets_purchased: tracked.session.tickets_purchased(),
                tickets_to_buy: tracked.session.criteria().tickets_to_buy,
                started_at: tracked.session.started_at(),
            })
            .collect();
        let mut ready_tabs: Vec<TabId> = self.ready_tabs.read().await.iter().copied().collect();
        ready_tabs.sort();
        let mut scheduled_reloads: Vec<TabId> =
            self.scheduled_reloads.read().await.keys().copied().collect();
        scheduled_reloads.sort();

        CoordinatorStatus {
            sessions,
            owned_tabs: self.owned_tabs.read().await.iter().copied().collect(),
            ready_tabs,
            scheduled_reloads,
        }
    }

    async fn prepare_workspace(&self) -> Result<TabId, CoordinatorError> {
        let mut owned = self.owned_tabs.write().await;
        let tab_id = open_workspace(self.tabs.as_ref(), &self.workflow, &mut owned).await?;
        self.store.save_owned_tabs(&owned)?;
        Ok(tab_id)
    }

    fn spawn_engine(&self, session: Arc<Session>) {
        let this = self.clone();
        tokio::spawn(async move {
            let outcome = this.run_engine(&session).await;
            this.complete(session, outcome).await;
        });
    }

    async fn run_engine(&self, session: &Arc<Session>) -> Result<EngineOutcome, EngineError> {
        let tab_id = session.tab_id();
        let criteria = session.criteria().clone();
        let reporter = Arc::new(SessionReporter {
            tab_id,
            store: self.store.clone(),
            panel: self.panel.clone(),
            search_states: Arc::clone(&self.search_states),
        });

        if criteria.is_purchase_mode() {
            let engine = PurchaseEngine::new(
                Arc::clone(&self.executor),
                Arc::clone(session),
                self.engine_config.clone(),
                self.store.clone(),
                reporter,
            );
            let outcome = engine.execute(&criteria, criteria.tickets_to_buy).await?;
            Ok(EngineOutcome::Purchase(outcome))
        } else {
            let engine = SearchEngine::new(
                ExecutorClient::new(Arc::clone(&self.executor), tab_id),
                Arc::clone(session),
                self.engine_config.clone(),
                reporter,
            );
            let result = engine
                .execute(&criteria, None, Duration::ZERO, session.tickets_checked())
                .await?;
            Ok(EngineOutcome::Search(result))
        }
    }

    /// Apply an engine result, unless the session was torn down meanwhile.
    async fn complete(&self, session: Arc<Session>, outcome: Result<EngineOutcome, EngineError>) {
        let tab_id = session.tab_id();
        let mut sessions = self.sessions.write().await;
        let is_current = sessions
            .get(&tab_id)
            .is_some_and(|tracked| Arc::ptr_eq(&tracked.session, &session));
        if !is_current {
            debug!(tab_id = %tab_id, "Dropping result of a session no longer tracked");
            return;
        }

        if let Err(e) = &outcome {
            if e.is_transport() && self.scheduled_reloads.read().await.contains_key(&tab_id) {
                info!(tab_id = %tab_id, error = %e, "Page reloading, waiting to resume");
                if let Some(tracked) = sessions.get_mut(&tab_id) {
                    tracked.phase = SessionPhase::AwaitingReload;
                }
                metrics::SESSION_OUTCOMES
                    .with_label_values(&["awaiting_reload"])
                    .inc();
                return;
            }
        }

        sessions.remove(&tab_id);
        drop(sessions);

        match outcome {
            Ok(EngineOutcome::Search(SearchResult::Stopped { .. }))
            | Ok(EngineOutcome::Purchase(PurchaseOutcome::Stopped(_))) => {
                self.finish_stopped(&session).await;
            }
            Ok(EngineOutcome::Search(SearchResult::Found {
                tickets,
                total_matching,
                tickets_checked,
            })) => {
                let found = total_matching as u32;
                let state = SearchState::completed(
                    Some(session.criteria().clone()),
                    tickets_checked,
                    found,
                    0,
                    tickets.clone(),
                );
                self.finish_completed(tab_id, state, tickets).await;
            }
            Ok(EngineOutcome::Purchase(PurchaseOutcome::Completed(totals))) => {
                let state = SearchState::completed(
                    Some(session.criteria().clone()),
                    totals.tickets_checked,
                    totals.tickets_found,
                    totals.tickets_purchased,
                    Vec::new(),
                );
                self.finish_completed(tab_id, state, Vec::new()).await;
            }
            Err(e) => self.finish_error(&session, &e).await,
        }
    }

    async fn finish_stopped(&self, session: &Session) {
        let tab_id = session.tab_id();
        let checked = session.tickets_checked();
        let purchased = session.tickets_purchased();
        let status = if session.criteria().is_purchase_mode() {
            format!(
                "Search stopped. Checked: {}, Purchased: {}",
                checked, purchased
            )
        } else {
            format!("Search stopped. Checked: {}", checked)
        };

        // The engine may have checkpointed after the stop landed.
        self.clear_progress_for(tab_id);

        let state = SearchState::stopped(Some(session.criteria().clone()), checked, purchased);
        self.record_state(tab_id, state, &status).await;
        self.panel.search_stopped(tab_id);

        metrics::SESSION_OUTCOMES.with_label_values(&["stopped"]).inc();
        metrics::ACTIVE_SESSIONS.dec();
        info!(tab_id = %tab_id, checked, purchased, "Search stopped");
    }

    async fn finish_completed(
        &self,
        tab_id: TabId,
        state: SearchState,
        tickets: Vec<crate::ticket::Ticket>,
    ) {
        let status = format!(
            "Search complete. Found: {}, Purchased: {}",
            state.tickets_found, state.tickets_purchased
        );
        info!(
            tab_id = %tab_id,
            checked = state.tickets_checked,
            found = state.tickets_found,
            purchased = state.tickets_purchased,
            "Search complete"
        );

        self.clear_progress_for(tab_id);
        self.record_state(tab_id, state, &status).await;
        self.panel.ticket_found(tab_id, tickets);

        metrics::SESSION_OUTCOMES
            .with_label_values(&["completed"])
            .inc();
        metrics::ACTIVE_SESSIONS.dec();
    }

    async fn finish_error(&self, session: &Session, error: &EngineError) {
        let tab_id = session.tab_id();
        let message = if error.is_transport() {
            LEFT_PAGE.to_string()
        } else {
            format!("Error: {}", error)
        };
        let checked = error
            .tickets_checked()
            .unwrap_or_else(|| session.tickets_checked());
        error!(tab_id = %tab_id, error = %error, checked, "Search failed");

        let state = SearchState::error(
            Some(session.criteria().clone()),
            message.clone(),
            checked,
            session.tickets_found(),
            session.tickets_purchased(),
        );
        self.record_state(tab_id, state, &message).await;
        self.clear_progress_for(tab_id);
        self.panel.error(Some(tab_id), message);

        metrics::SESSION_OUTCOMES.with_label_values(&["error"]).inc();
        metrics::ACTIVE_SESSIONS.dec();
    }

    /// Interrupt whatever runs in `tab_id` and forget the tab.
    async fn teardown(&self, tab_id: TabId, reason: &str) {
        let removed = self.sessions.write().await.remove(&tab_id);
        if let Some(tracked) = removed {
            let session = tracked.session;
            session.stop();
            warn!(tab_id = %tab_id, reason, "Session interrupted");

            let state = SearchState::error(
                Some(session.criteria().clone()),
                reason,
                session.tickets_checked(),
                session.tickets_found(),
                session.tickets_purchased(),
            );
            self.record_state(tab_id, state, reason).await;
            self.panel.error(Some(tab_id), reason);

            metrics::SESSION_OUTCOMES
                .with_label_values(&["interrupted"])
                .inc();
            metrics::ACTIVE_SESSIONS.dec();
        }

        self.clear_progress_for(tab_id);
        self.cancel_reload(tab_id).await;
        self.panel.broadcast(PanelEvent::ClosePanel);

        {
            let mut owned = self.owned_tabs.write().await;
            if owned.remove(&tab_id) {
                if let Err(e) = self.store.save_owned_tabs(&owned) {
                    warn!(tab_id = %tab_id, error = %e, "Failed to persist owned tabs");
                }
            }
        }
        self.ready_tabs.write().await.remove(&tab_id);
    }

    /// Keep the tab's state in memory and persist it with its status line.
    async fn record_state(&self, tab_id: TabId, state: SearchState, status: &str) {
        if let Err(e) = self.store.save_search_state(&state) {
            warn!(tab_id = %tab_id, error = %e, "Failed to persist search state");
        }
        if let Err(e) = self.store.save_status(status) {
            warn!(tab_id = %tab_id, error = %e, "Failed to persist status");
        }
        self.search_states.write().await.insert(tab_id, state);
        self.panel.status(status);
    }

    /// Keep the checkpoint only when it continues the purchase being started.
    ///
    /// Returns the checkpoint the engine will resume from.
    fn reconcile_progress(
        &self,
        tab_id: TabId,
        criteria: &SearchCriteria,
    ) -> Option<PersistedProgress> {
        let progress = match self.store.load_progress() {
            Ok(Some(progress)) => progress,
            Ok(None) => return None,
            Err(e) => {
                warn!(tab_id = %tab_id, error = %e, "Failed to read purchase checkpoint");
                return None;
            }
        };

        let continues = criteria.is_purchase_mode()
            && progress.is_for(tab_id)
            && progress.criteria == *criteria
            && progress.total_tickets_to_buy == criteria.tickets_to_buy;
        if continues {
            info!(
                tab_id = %tab_id,
                purchased = progress.tickets_purchased,
                total = progress.total_tickets_to_buy,
                "Continuing purchase from checkpoint"
            );
            return Some(progress);
        }

        debug!(tab_id = %tab_id, owner = %progress.tab_id, "Discarding stale purchase checkpoint");
        if let Err(e) = self.store.clear_progress() {
            warn!(tab_id = %tab_id, error = %e, "Failed to clear purchase checkpoint");
        }
        None
    }

    fn clear_progress_for(&self, tab_id: TabId) {
        match self.store.load_progress_for(tab_id) {
            Ok(Some(_)) => {
                if let Err(e) = self.store.clear_progress() {
                    warn!(tab_id = %tab_id, error = %e, "Failed to clear purchase checkpoint");
                }
            }
            Ok(None) => {}
            Err(e) => warn!(tab_id = %tab_id, error = %e, "Failed to read purchase checkpoint"),
        }
    }

    async fn cancel_reload(&self, tab_id: TabId) {
        if let Some(handle) = self.scheduled_reloads.write().await.remove(&tab_id) {
            handle.abort();
            debug!(tab_id = %tab_id, "Scheduled reload cancelled");
        }
    }

    async fn consume_reload_marker(&self, tab_id: TabId) -> bool {
        match self.scheduled_reloads.write().await.remove(&tab_id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}
