//! Types for the in-page executor command surface.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ticket::{Ticket, UserData};

/// Browser tab identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TabId {
    fn from(id: i64) -> Self {
        TabId(id)
    }
}

/// Errors that can occur while talking to the page executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutorError {
    /// The page could not be reached at all (reloading, navigated, closed).
    #[error("Could not reach the page: {0}")]
    Transport(String),

    /// The page answered but could not perform the action.
    #[error("{command} failed: {message}")]
    Command { command: String, message: String },

    #[error("{command} returned an unexpected reply: {reply}")]
    UnexpectedReply { command: String, reply: String },
}

impl ExecutorError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ExecutorError::Transport(_))
    }

    /// Label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutorError::Transport(_) => "transport",
            ExecutorError::Command { .. } => "command",
            ExecutorError::UnexpectedReply { .. } => "unexpected_reply",
        }
    }
}

/// A command understood by the page executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ExecutorCommand {
    GetTickets,
    GetUserData,
    ClickTicket { ticket_id: String },
    NextPage,
    HasNextPage,
    OpenFilterModal,
    SelectNumbers { numbers: Vec<u8> },
    ApplyFilter,
    ClearFilter,
    CheckPageLoaded,
    /// Fire-and-forget: the page is gone before it could answer.
    ReloadPage,
    CheckPaymentButtons,
    ClickPaymentButton { test_mode: bool },
}

impl ExecutorCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ExecutorCommand::GetTickets => "get_tickets",
            ExecutorCommand::GetUserData => "get_user_data",
            ExecutorCommand::ClickTicket { .. } => "click_ticket",
            ExecutorCommand::NextPage => "next_page",
            ExecutorCommand::HasNextPage => "has_next_page",
            ExecutorCommand::OpenFilterModal => "open_filter_modal",
            ExecutorCommand::SelectNumbers { .. } => "select_numbers",
            ExecutorCommand::ApplyFilter => "apply_filter",
            ExecutorCommand::ClearFilter => "clear_filter",
            ExecutorCommand::CheckPageLoaded => "check_page_loaded",
            ExecutorCommand::ReloadPage => "reload_page",
            ExecutorCommand::CheckPaymentButtons => "check_payment_buttons",
            ExecutorCommand::ClickPaymentButton { .. } => "click_payment_button",
        }
    }
}

/// Which payment controls the page currently shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentButtons {
    pub wallet_payment_available: bool,
    pub qr_payment_available: bool,
}

/// A reply from the page executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ExecutorReply {
    Tickets(Vec<Ticket>),
    UserData(UserData),
    Ack,
    HasNextPage { has_next: bool },
    FilterCleared { cleared: bool },
    PageLoaded { loaded: bool },
    PaymentButtons(PaymentButtons),
    PaymentClicked { clicked: bool },
}

impl ExecutorReply {
    pub fn name(&self) -> &'static str {
        match self {
            ExecutorReply::Tickets(_) => "tickets",
            ExecutorReply::UserData(_) => "user_data",
            ExecutorReply::Ack => "ack",
            ExecutorReply::HasNextPage { .. } => "has_next_page",
            ExecutorReply::FilterCleared { .. } => "filter_cleared",
            ExecutorReply::PageLoaded { .. } => "page_loaded",
            ExecutorReply::PaymentButtons(_) => "payment_buttons",
            ExecutorReply::PaymentClicked { .. } => "payment_clicked",
        }
    }
}

/// Notifications the page executor pushes on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutorEvent {
    /// The page finished loading and the executor is listening.
    PageReady,
    UserDataUpdated { user_data: UserData },
    AuthChanged,
}

/// Something that can run executor commands inside a tab.
#[async_trait]
pub trait PageExecutor: Send + Sync {
    async fn execute(
        &self,
        tab_id: TabId,
        command: ExecutorCommand,
    ) -> Result<ExecutorReply, ExecutorError>;
}
