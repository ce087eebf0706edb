//! Mock page executor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::executor::{
    ExecutorCommand, ExecutorError, ExecutorReply, PageExecutor, PaymentButtons, TabId,
};
use crate::ticket::{Ticket, UserData};

type CommandHook = Arc<dyn Fn(&ExecutorCommand) + Send + Sync>;

/// A configured failure for one command name.
#[derive(Debug, Clone)]
struct Failure {
    error: ExecutorError,
    /// `None` fails forever.
    remaining: Option<u32>,
}

/// Mock implementation of the PageExecutor trait.
///
/// Simulates a paginated results page:
/// - `reload_page` goes back to the first page
/// - `next_page` advances, `has_next_page` reports whether more pages exist
/// - readiness and payment controls can be delayed by a number of probes
///
/// Every command is recorded for assertions, and a hook can observe commands
/// as they arrive (for example to stop a session mid-flight).
pub struct MockExecutor {
    pages: Arc<RwLock<Vec<Vec<Ticket>>>>,
    current_page: Arc<RwLock<usize>>,
    commands: Arc<RwLock<Vec<(TabId, ExecutorCommand)>>>,
    failures: Arc<RwLock<HashMap<String, Failure>>>,
    replies: Arc<RwLock<HashMap<String, ExecutorReply>>>,
    not_loaded_probes: Arc<RwLock<u32>>,
    payment_hidden_probes: Arc<RwLock<u32>>,
    user_data: Arc<RwLock<UserData>>,
    latency: Arc<RwLock<Duration>>,
    hook: Arc<RwLock<Option<CommandHook>>>,
}

impl fmt::Debug for MockExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockExecutor").finish_non_exhaustive()
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExecutor {
    /// Create a mock with no tickets; the page is ready and payment is available.
    pub fn new() -> Self {
        Self {
            pages: Arc::new(RwLock::new(Vec::new())),
            current_page: Arc::new(RwLock::new(0)),
            commands: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            replies: Arc::new(RwLock::new(HashMap::new())),
            not_loaded_probes: Arc::new(RwLock::new(0)),
            payment_hidden_probes: Arc::new(RwLock::new(0)),
            user_data: Arc::new(RwLock::new(UserData {
                is_authorized: true,
                balance: 1000.0,
            })),
            latency: Arc::new(RwLock::new(Duration::ZERO)),
            hook: Arc::new(RwLock::new(None)),
        }
    }

    /// Replace the result pages. Resets to the first page.
    pub async fn set_pages(&self, pages: Vec<Vec<Ticket>>) {
        *self.pages.write().await = pages;
        *self.current_page.write().await = 0;
    }

    /// Always answer `command` with `reply`.
    pub async fn set_reply(&self, command: &str, reply: ExecutorReply) {
        self.replies.write().await.insert(command.to_string(), reply);
    }

    /// Fail every `command` with `error`.
    pub async fn fail_command(&self, command: &str, error: ExecutorError) {
        self.failures.write().await.insert(
            command.to_string(),
            Failure {
                error,
                remaining: None,
            },
        );
    }

    /// Fail the next `times` calls of `command` with `error`.
    pub async fn fail_command_times(&self, command: &str, error: ExecutorError, times: u32) {
        self.failures.write().await.insert(
            command.to_string(),
            Failure {
                error,
                remaining: Some(times),
            },
        );
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Report "not loaded" for the next `probes` readiness checks.
    pub async fn set_page_loaded_after(&self, probes: u32) {
        *self.not_loaded_probes.write().await = probes;
    }

    /// Hide the wallet control for the next `probes` payment checks.
    pub async fn set_payment_available_after(&self, probes: u32) {
        *self.payment_hidden_probes.write().await = probes;
    }

    pub async fn set_user_data(&self, user_data: UserData) {
        *self.user_data.write().await = user_data;
    }

    /// Delay every command by `latency`.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }

    /// Call `hook` with every command before it is handled.
    pub async fn on_command<F>(&self, hook: F)
    where
        F: Fn(&ExecutorCommand) + Send + Sync + 'static,
    {
        *self.hook.write().await = Some(Arc::new(hook));
    }

    /// Every command received, in order.
    pub async fn commands(&self) -> Vec<ExecutorCommand> {
        self.commands
            .read()
            .await
            .iter()
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Commands received for one tab.
    pub async fn commands_for(&self, tab_id: TabId) -> Vec<ExecutorCommand> {
        self.commands
            .read()
            .await
            .iter()
            .filter(|(t, _)| *t == tab_id)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// How many times a command was received.
    pub async fn command_count(&self, name: &str) -> usize {
        self.commands
            .read()
            .await
            .iter()
            .filter(|(_, c)| c.name() == name)
            .count()
    }

    pub async fn clear_recorded(&self) {
        self.commands.write().await.clear();
    }

    async fn take_failure(&self, name: &str) -> Option<ExecutorError> {
        let mut failures = self.failures.write().await;
        let failure = failures.get_mut(name)?;
        let error = failure.error.clone();
        match failure.remaining.as_mut() {
            None => {}
            Some(0) => {
                failures.remove(name);
                return None;
            }
            Some(n) => {
                *n -= 1;
                if *n == 0 {
                    failures.remove(name);
                }
            }
        }
        Some(error)
    }

    async fn countdown(counter: &RwLock<u32>) -> bool {
        let mut remaining = counter.write().await;
        if *remaining == 0 {
            return false;
        }
        if *remaining != u32::MAX {
            *remaining -= 1;
        }
        true
    }
}

#[async_trait]
impl PageExecutor for MockExecutor {
    async fn execute(
        &self,
        tab_id: TabId,
        command: ExecutorCommand,
    ) -> Result<ExecutorReply, ExecutorError> {
        self.commands.write().await.push((tab_id, command.clone()));

        let hook = self.hook.read().await.clone();
        if let Some(hook) = hook {
            hook(&command);
        }

        let latency = *self.latency.read().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let name = command.name();
        if let Some(error) = self.take_failure(name).await {
            return Err(error);
        }
        if let Some(reply) = self.replies.read().await.get(name) {
            return Ok(reply.clone());
        }

        let reply = match command {
            ExecutorCommand::GetTickets => {
                let page = *self.current_page.read().await;
                let tickets = self
                    .pages
                    .read()
                    .await
                    .get(page)
                    .cloned()
                    .unwrap_or_default();
                ExecutorReply::Tickets(tickets)
            }
            ExecutorCommand::GetUserData => {
                ExecutorReply::UserData(self.user_data.read().await.clone())
            }
            ExecutorCommand::NextPage => {
                *self.current_page.write().await += 1;
                ExecutorReply::Ack
            }
            ExecutorCommand::HasNextPage => {
                let page = *self.current_page.read().await;
                let has_next = page + 1 < self.pages.read().await.len();
                ExecutorReply::HasNextPage { has_next }
            }
            ExecutorCommand::ReloadPage => {
                *self.current_page.write().await = 0;
                ExecutorReply::Ack
            }
            ExecutorCommand::CheckPageLoaded => {
                let loaded = !Self::countdown(&self.not_loaded_probes).await;
                ExecutorReply::PageLoaded { loaded }
            }
            ExecutorCommand::CheckPaymentButtons => {
                let hidden = Self::countdown(&self.payment_hidden_probes).await;
                ExecutorReply::PaymentButtons(PaymentButtons {
                    wallet_payment_available: !hidden,
                    qr_payment_available: !hidden,
                })
            }
            ExecutorCommand::ClickPaymentButton { .. } => {
                ExecutorReply::PaymentClicked { clicked: true }
            }
            ExecutorCommand::ClearFilter => ExecutorReply::FilterCleared { cleared: true },
            ExecutorCommand::ClickTicket { .. }
            | ExecutorCommand::OpenFilterModal
            | ExecutorCommand::SelectNumbers { .. }
            | ExecutorCommand::ApplyFilter => ExecutorReply::Ack,
        };
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pagination_and_reload() {
        let mock = MockExecutor::new();
        mock.set_pages(vec![
            vec![Ticket::new("a", vec![1])],
            vec![Ticket::new("b", vec![2])],
        ])
        .await;
        let tab = TabId(1);

        let has_next = mock.execute(tab, ExecutorCommand::HasNextPage).await.unwrap();
        assert_eq!(has_next, ExecutorReply::HasNextPage { has_next: true });

        mock.execute(tab, ExecutorCommand::NextPage).await.unwrap();
        let tickets = mock.execute(tab, ExecutorCommand::GetTickets).await.unwrap();
        assert_eq!(tickets, ExecutorReply::Tickets(vec![Ticket::new("b", vec![2])]));

        mock.execute(tab, ExecutorCommand::ReloadPage).await.unwrap();
        let tickets = mock.execute(tab, ExecutorCommand::GetTickets).await.unwrap();
        assert_eq!(tickets, ExecutorReply::Tickets(vec![Ticket::new("a", vec![1])]));
        assert_eq!(mock.command_count("get_tickets").await, 2);
    }

    #[tokio::test]
    async fn test_limited_failures_run_out() {
        let mock = MockExecutor::new();
        mock.fail_command_times("apply_filter", ExecutorError::Transport("x".into()), 1)
            .await;

        assert!(mock
            .execute(TabId(1), ExecutorCommand::ApplyFilter)
            .await
            .is_err());
        assert!(mock
            .execute(TabId(1), ExecutorCommand::ApplyFilter)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_page_loaded_countdown() {
        let mock = MockExecutor::new();
        mock.set_page_loaded_after(1).await;
        let tab = TabId(1);

        assert_eq!(
            mock.execute(tab, ExecutorCommand::CheckPageLoaded).await.unwrap(),
            ExecutorReply::PageLoaded { loaded: false }
        );
        assert_eq!(
            mock.execute(tab, ExecutorCommand::CheckPageLoaded).await.unwrap(),
            ExecutorReply::PageLoaded { loaded: true }
        );
    }
}
