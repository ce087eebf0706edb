//! Typed wrapper over a [`PageExecutor`] bound to one tab.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::metrics;
use crate::ticket::{Ticket, UserData};

use super::types::{
    ExecutorCommand, ExecutorError, ExecutorReply, PageExecutor, PaymentButtons, TabId,
};

/// Typed command calls for a single tab.
#[derive(Clone)]
pub struct ExecutorClient {
    executor: Arc<dyn PageExecutor>,
    tab_id: TabId,
}

impl ExecutorClient {
    pub fn new(executor: Arc<dyn PageExecutor>, tab_id: TabId) -> Self {
        Self { executor, tab_id }
    }

    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    async fn send(&self, command: ExecutorCommand) -> Result<ExecutorReply, ExecutorError> {
        let name = command.name();
        debug!(tab_id = %self.tab_id, command = name, "Sending executor command");
        match self.executor.execute(self.tab_id, command).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                metrics::EXECUTOR_FAILURES
                    .with_label_values(&[name, e.kind()])
                    .inc();
                debug!(tab_id = %self.tab_id, command = name, error = %e, "Executor command failed");
                Err(e)
            }
        }
    }

    fn unexpected(command: &str, reply: &ExecutorReply) -> ExecutorError {
        metrics::EXECUTOR_FAILURES
            .with_label_values(&[command, "unexpected_reply"])
            .inc();
        ExecutorError::UnexpectedReply {
            command: command.to_string(),
            reply: reply.name().to_string(),
        }
    }

    async fn expect_ack(&self, command: ExecutorCommand) -> Result<(), ExecutorError> {
        let name = command.name();
        match self.send(command).await? {
            ExecutorReply::Ack => Ok(()),
            other => Err(Self::unexpected(name, &other)),
        }
    }

    pub async fn get_tickets(&self) -> Result<Vec<Ticket>, ExecutorError> {
        match self.send(ExecutorCommand::GetTickets).await? {
            ExecutorReply::Tickets(tickets) => Ok(tickets),
            other => Err(Self::unexpected("get_tickets", &other)),
        }
    }

    pub async fn get_user_data(&self) -> Result<UserData, ExecutorError> {
        match self.send(ExecutorCommand::GetUserData).await? {
            ExecutorReply::UserData(data) => Ok(data),
            other => Err(Self::unexpected("get_user_data", &other)),
        }
    }

    pub async fn click_ticket(&self, ticket_id: &str) -> Result<(), ExecutorError> {
        self.expect_ack(ExecutorCommand::ClickTicket {
            ticket_id: ticket_id.to_string(),
        })
        .await
    }

    pub async fn next_page(&self) -> Result<(), ExecutorError> {
        self.expect_ack(ExecutorCommand::NextPage).await
    }

    pub async fn has_next_page(&self) -> Result<bool, ExecutorError> {
        match self.send(ExecutorCommand::HasNextPage).await? {
            ExecutorReply::HasNextPage { has_next } => Ok(has_next),
            other => Err(Self::unexpected("has_next_page", &other)),
        }
    }

    pub async fn open_filter_modal(&self) -> Result<(), ExecutorError> {
        self.expect_ack(ExecutorCommand::OpenFilterModal).await
    }

    pub async fn select_numbers(&self, numbers: &[u8]) -> Result<(), ExecutorError> {
        self.expect_ack(ExecutorCommand::SelectNumbers {
            numbers: numbers.to_vec(),
        })
        .await
    }

    pub async fn apply_filter(&self) -> Result<(), ExecutorError> {
        self.expect_ack(ExecutorCommand::ApplyFilter).await
    }

    pub async fn clear_filter(&self) -> Result<bool, ExecutorError> {
        match self.send(ExecutorCommand::ClearFilter).await? {
            ExecutorReply::FilterCleared { cleared } => Ok(cleared),
            other => Err(Self::unexpected("clear_filter", &other)),
        }
    }

    pub async fn check_page_loaded(&self) -> Result<bool, ExecutorError> {
        match self.send(ExecutorCommand::CheckPageLoaded).await? {
            ExecutorReply::PageLoaded { loaded } => Ok(loaded),
            other => Err(Self::unexpected("check_page_loaded", &other)),
        }
    }

    /// Ask the page to reload itself. Errors are logged and dropped: the
    /// page usually dies before it can answer.
    pub async fn reload_page(&self) {
        if let Err(e) = self.send(ExecutorCommand::ReloadPage).await {
            debug!(tab_id = %self.tab_id, error = %e, "reload_page did not answer");
        }
    }

    pub async fn check_payment_buttons(&self) -> Result<PaymentButtons, ExecutorError> {
        match self.send(ExecutorCommand::CheckPaymentButtons).await? {
            ExecutorReply::PaymentButtons(buttons) => Ok(buttons),
            other => Err(Self::unexpected("check_payment_buttons", &other)),
        }
    }

    pub async fn click_payment_button(&self, test_mode: bool) -> Result<bool, ExecutorError> {
        match self
            .send(ExecutorCommand::ClickPaymentButton { test_mode })
            .await?
        {
            ExecutorReply::PaymentClicked { clicked } => {
                if !clicked {
                    warn!(tab_id = %self.tab_id, test_mode, "Payment button reported not clicked");
                }
                Ok(clicked)
            }
            other => Err(Self::unexpected("click_payment_button", &other)),
        }
    }
}
