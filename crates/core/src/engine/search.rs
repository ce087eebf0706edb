//! One search pass: reload, filter, then page through tickets until a match.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::criteria::SearchCriteria;
use crate::executor::{ExecutorClient, ExecutorError};
use crate::metrics;
use crate::ticket;

use super::config::EngineConfig;
use super::session::Session;
use super::types::{EngineError, ProgressReporter, SearchResult};

/// Runs search passes for one session.
pub struct SearchEngine {
    client: ExecutorClient,
    session: Arc<Session>,
    config: EngineConfig,
    reporter: Arc<dyn ProgressReporter>,
}

fn executor_error(tickets_checked: u32) -> impl FnOnce(ExecutorError) -> EngineError {
    move |source| EngineError::Executor {
        source,
        tickets_checked,
    }
}

impl SearchEngine {
    pub fn new(
        client: ExecutorClient,
        session: Arc<Session>,
        config: EngineConfig,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            client,
            session,
            config,
            reporter,
        }
    }

    /// Run one pass.
    ///
    /// `max_tickets_to_select` caps how many matches are clicked (`None`
    /// clicks them all). `initial_reload_delay` is waited out before the
    /// reload. Counting continues from `initial_tickets_checked`.
    pub async fn execute(
        &self,
        criteria: &SearchCriteria,
        max_tickets_to_select: Option<usize>,
        initial_reload_delay: Duration,
        initial_tickets_checked: u32,
    ) -> Result<SearchResult, EngineError> {
        let tab_id = self.session.tab_id();
        let mut checked = initial_tickets_checked;

        if !initial_reload_delay.is_zero() {
            info!(
                tab_id = %tab_id,
                delay_ms = initial_reload_delay.as_millis() as u64,
                "Waiting before reload"
            );
            if !self.session.sleep_unless_stopped(initial_reload_delay).await {
                info!(tab_id = %tab_id, "Stopped during reload wait");
                return Ok(SearchResult::Stopped {
                    tickets_checked: checked,
                });
            }
        }
        if !self.session.is_running() {
            return Ok(SearchResult::Stopped {
                tickets_checked: checked,
            });
        }

        debug!(tab_id = %tab_id, "Reloading page before search");
        self.client.reload_page().await;

        if !self.wait_for_page_ready(checked).await? {
            info!(tab_id = %tab_id, "Stopped while waiting for the page");
            return Ok(SearchResult::Stopped {
                tickets_checked: checked,
            });
        }

        let filter_numbers = criteria.filter_numbers(self.config.filter_max_numbers);
        debug!(tab_id = %tab_id, numbers = ?filter_numbers, "Applying filter");
        self.client
            .open_filter_modal()
            .await
            .map_err(executor_error(checked))?;
        self.client
            .select_numbers(filter_numbers)
            .await
            .map_err(executor_error(checked))?;
        self.client
            .apply_filter()
            .await
            .map_err(executor_error(checked))?;

        let mut page = 1u32;
        while self.session.is_running() {
            let tickets = self
                .client
                .get_tickets()
                .await
                .map_err(executor_error(checked))?;
            debug!(tab_id = %tab_id, page, count = tickets.len(), "Evaluating page");

            let mut matches = Vec::new();
            for candidate in tickets {
                checked += 1;
                self.session.set_tickets_checked(checked);
                metrics::TICKETS_CHECKED.inc();
                self.reporter.ticket_checked(tab_id, checked).await;
                if ticket::matches(&candidate, criteria) {
                    matches.push(candidate);
                }
            }

            if !matches.is_empty() {
                return self.select(matches, max_tickets_to_select, checked).await;
            }

            if !self.session.is_running() {
                break;
            }

            let has_next = self
                .client
                .has_next_page()
                .await
                .map_err(executor_error(checked))?;
            if !has_next {
                info!(tab_id = %tab_id, checked, "Reached the last page without a match");
                return Err(EngineError::NoTicketsFound {
                    tickets_checked: checked,
                });
            }

            self.client
                .next_page()
                .await
                .map_err(executor_error(checked))?;
            page += 1;
            self.reporter.page_completed(tab_id, checked).await;
        }

        info!(tab_id = %tab_id, checked, "Search stopped");
        Ok(SearchResult::Stopped {
            tickets_checked: checked,
        })
    }

    /// Click the leading matches, pausing between clicks.
    async fn select(
        &self,
        matches: Vec<ticket::Ticket>,
        max_tickets_to_select: Option<usize>,
        checked: u32,
    ) -> Result<SearchResult, EngineError> {
        let tab_id = self.session.tab_id();
        let total_matching = matches.len();
        let limit = max_tickets_to_select.map_or(total_matching, |m| m.min(total_matching));
        info!(tab_id = %tab_id, total_matching, selecting = limit, "Matching tickets found");

        let mut clicked = Vec::with_capacity(limit);
        for candidate in matches.into_iter().take(limit) {
            if !self.session.is_running() {
                info!(tab_id = %tab_id, clicked = clicked.len(), "Stopped between clicks");
                break;
            }
            self.client
                .click_ticket(&candidate.ticket_id)
                .await
                .map_err(executor_error(checked))?;
            clicked.push(candidate);
            tokio::time::sleep(self.config.click_pause()).await;
        }

        if clicked.is_empty() {
            return Ok(SearchResult::Stopped {
                tickets_checked: checked,
            });
        }

        tokio::time::sleep(self.config.post_select_settle()).await;
        Ok(SearchResult::Found {
            tickets: clicked,
            total_matching,
            tickets_checked: checked,
        })
    }

    /// Poll readiness after a reload. `Ok(false)` means the session was stopped.
    async fn wait_for_page_ready(&self, checked: u32) -> Result<bool, EngineError> {
        let tab_id = self.session.tab_id();
        if !self
            .session
            .sleep_unless_stopped(self.config.page_ready_initial_delay())
            .await
        {
            return Ok(false);
        }

        let max_attempts = self.config.page_ready_max_attempts;
        for attempt in 1..=max_attempts {
            if !self.session.is_running() {
                return Ok(false);
            }
            match self.client.check_page_loaded().await {
                Ok(true) => {
                    debug!(tab_id = %tab_id, attempt, "Page ready");
                    return Ok(true);
                }
                Ok(false) => debug!(tab_id = %tab_id, attempt, "Page not ready yet"),
                Err(e) => debug!(tab_id = %tab_id, attempt, error = %e, "Readiness probe failed"),
            }
            if attempt < max_attempts
                && !self
                    .session
                    .sleep_unless_stopped(self.config.page_ready_poll_interval())
                    .await
            {
                return Ok(false);
            }
        }

        Err(EngineError::PageNotReady {
            attempts: max_attempts,
            tickets_checked: checked,
        })
    }
}
