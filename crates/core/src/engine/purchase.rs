//! Repeat search passes and pay for the matches until the quota is met.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::criteria::SearchCriteria;
use crate::executor::{ExecutorClient, PageExecutor};
use crate::metrics;
use crate::storage::{PersistedProgress, StateStore};

use super::config::EngineConfig;
use super::search::SearchEngine;
use super::session::Session;
use super::types::{EngineError, ProgressReporter, PurchaseOutcome, PurchaseTotals, SearchResult};

/// Drives the purchase cycle for one session.
pub struct PurchaseEngine {
    client: ExecutorClient,
    search: SearchEngine,
    session: Arc<Session>,
    config: EngineConfig,
    store: StateStore,
    reporter: Arc<dyn ProgressReporter>,
}

impl PurchaseEngine {
    pub fn new(
        executor: Arc<dyn PageExecutor>,
        session: Arc<Session>,
        config: EngineConfig,
        store: StateStore,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        let client = ExecutorClient::new(executor, session.tab_id());
        let search = SearchEngine::new(
            client.clone(),
            Arc::clone(&session),
            config.clone(),
            Arc::clone(&reporter),
        );
        Self {
            client,
            search,
            session,
            config,
            store,
            reporter,
        }
    }

    /// Buy `total_tickets_to_buy` tickets, resuming from any checkpoint left
    /// for this tab.
    pub async fn execute(
        &self,
        criteria: &SearchCriteria,
        total_tickets_to_buy: u32,
    ) -> Result<PurchaseOutcome, EngineError> {
        let tab_id = self.session.tab_id();
        let mut totals = PurchaseTotals::default();

        if let Some(progress) = self.store.load_progress_for(tab_id)? {
            totals = PurchaseTotals {
                tickets_purchased: progress.tickets_purchased,
                tickets_checked: progress.tickets_checked,
                tickets_found: progress.tickets_found,
            };
            info!(
                tab_id = %tab_id,
                purchased = totals.tickets_purchased,
                total = total_tickets_to_buy,
                checked = totals.tickets_checked,
                "Resuming purchase from checkpoint"
            );
        }
        self.mirror(&totals);

        let mut first_pass = true;
        while self.session.is_running() && totals.tickets_purchased < total_tickets_to_buy {
            let remaining = total_tickets_to_buy - totals.tickets_purchased;
            let delay = if first_pass {
                Duration::ZERO
            } else {
                self.config.reload_delay()
            };
            first_pass = false;

            debug!(
                tab_id = %tab_id,
                purchased = totals.tickets_purchased,
                remaining,
                "Starting purchase pass"
            );
            if !delay.is_zero() {
                self.reporter
                    .status(&format!(
                        "Waiting {}s before reloading to find {} more tickets...",
                        delay.as_secs(),
                        remaining
                    ))
                    .await;
            }

            // The pass reloads the page; checkpoint first so it can resume.
            self.checkpoint(criteria, total_tickets_to_buy, &totals)?;

            let result = self
                .search
                .execute(
                    criteria,
                    Some(remaining as usize),
                    delay,
                    totals.tickets_checked,
                )
                .await?;

            let (selected, total_matching) = match result {
                SearchResult::Stopped { tickets_checked } => {
                    totals.tickets_checked = tickets_checked;
                    info!(tab_id = %tab_id, "Purchase stopped during search");
                    return Ok(PurchaseOutcome::Stopped(totals));
                }
                SearchResult::Found {
                    tickets,
                    total_matching,
                    tickets_checked,
                } => {
                    totals.tickets_checked = tickets_checked;
                    (tickets.len() as u32, total_matching as u32)
                }
            };
            totals.tickets_found += total_matching;
            self.mirror(&totals);

            if !self.session.is_running() {
                info!(tab_id = %tab_id, "Purchase stopped after selection, not paying");
                return Ok(PurchaseOutcome::Stopped(totals));
            }

            self.reporter.status("Waiting for the payment button...").await;
            self.wait_for_payment_control(totals.tickets_checked).await?;
            self.reporter.status("Payment button found!").await;

            let test_mode = self.store.test_mode()?;
            let status = if test_mode {
                format!(
                    "TEST MODE: opening the payment panel for {} tickets",
                    selected
                )
            } else {
                format!("Paying for {} tickets...", selected)
            };
            self.reporter.status(&status).await;

            match self.client.click_payment_button(test_mode).await {
                Ok(true) => info!(tab_id = %tab_id, selected, test_mode, "Payment triggered"),
                Ok(false) => warn!(tab_id = %tab_id, selected, "Payment click not confirmed"),
                Err(e) if e.is_transport() => {
                    // The click usually lands and the page navigates away before answering.
                    warn!(tab_id = %tab_id, error = %e, "Payment click unanswered, assuming it went through");
                }
                Err(source) => {
                    return Err(EngineError::Executor {
                        source,
                        tickets_checked: totals.tickets_checked,
                    })
                }
            }

            totals.tickets_purchased += selected;
            metrics::TICKETS_PURCHASED.inc_by(u64::from(selected));
            self.mirror(&totals);
            info!(
                tab_id = %tab_id,
                purchased = totals.tickets_purchased,
                total = total_tickets_to_buy,
                "Tickets purchased"
            );
            self.reporter
                .purchase_progress(tab_id, totals.tickets_purchased, totals.tickets_found)
                .await;
            self.reporter
                .status(&format!(
                    "Purchased {}/{} tickets",
                    totals.tickets_purchased, total_tickets_to_buy
                ))
                .await;

            self.checkpoint(criteria, total_tickets_to_buy, &totals)?;
        }

        if totals.tickets_purchased >= total_tickets_to_buy {
            self.store.clear_progress()?;
            info!(tab_id = %tab_id, purchased = totals.tickets_purchased, "Purchase complete");
            self.reporter
                .status(&format!(
                    "Purchase complete! Purchased: {}",
                    totals.tickets_purchased
                ))
                .await;
            return Ok(PurchaseOutcome::Completed(totals));
        }

        info!(tab_id = %tab_id, purchased = totals.tickets_purchased, "Purchase stopped");
        Ok(PurchaseOutcome::Stopped(totals))
    }

    fn mirror(&self, totals: &PurchaseTotals) {
        self.session.set_tickets_checked(totals.tickets_checked);
        self.session.set_tickets_found(totals.tickets_found);
        self.session.set_tickets_purchased(totals.tickets_purchased);
    }

    fn checkpoint(
        &self,
        criteria: &SearchCriteria,
        total_tickets_to_buy: u32,
        totals: &PurchaseTotals,
    ) -> Result<(), EngineError> {
        let progress = PersistedProgress {
            tickets_checked: totals.tickets_checked,
            tickets_found: totals.tickets_found,
            tickets_purchased: totals.tickets_purchased,
            ..PersistedProgress::new(
                self.session.tab_id(),
                criteria.clone(),
                total_tickets_to_buy,
            )
        };
        self.store.save_progress(&progress)?;
        Ok(())
    }

    /// Poll until the wallet payment control shows up.
    async fn wait_for_payment_control(&self, checked: u32) -> Result<(), EngineError> {
        let tab_id = self.session.tab_id();
        let max_attempts = self.config.payment_poll_max_attempts;

        for attempt in 1..=max_attempts {
            match self.client.check_payment_buttons().await {
                Ok(buttons) if buttons.wallet_payment_available => {
                    debug!(tab_id = %tab_id, attempt, "Payment control available");
                    return Ok(());
                }
                Ok(_) => debug!(tab_id = %tab_id, attempt, "Payment control not shown yet"),
                Err(e) if e.is_transport() => {
                    warn!(tab_id = %tab_id, attempt, error = %e, "Page unreachable, giving up on payment control");
                    break;
                }
                Err(e) => debug!(tab_id = %tab_id, attempt, error = %e, "Payment control probe failed"),
            }
            if attempt < max_attempts {
                tokio::time::sleep(self.config.payment_poll_interval()).await;
            }
        }

        Err(EngineError::PaymentControlNotFound {
            attempts: max_attempts,
            tickets_checked: checked,
        })
    }
}
