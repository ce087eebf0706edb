//! Types shared by the search and purchase engines.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::executor::{ExecutorError, TabId};
use crate::storage::StoreError;
use crate::ticket::Ticket;

/// Errors that end an engine call.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Page did not become ready after {attempts} checks")]
    PageNotReady { attempts: u32, tickets_checked: u32 },

    #[error("No matching tickets found")]
    NoTicketsFound { tickets_checked: u32 },

    #[error("Payment button not found after {attempts} checks")]
    PaymentControlNotFound { attempts: u32, tickets_checked: u32 },

    #[error("{source}")]
    Executor {
        source: ExecutorError,
        tickets_checked: u32,
    },

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Tickets evaluated before the failure, when known.
    pub fn tickets_checked(&self) -> Option<u32> {
        match self {
            EngineError::PageNotReady {
                tickets_checked, ..
            }
            | EngineError::NoTicketsFound { tickets_checked }
            | EngineError::PaymentControlNotFound {
                tickets_checked, ..
            }
            | EngineError::Executor {
                tickets_checked, ..
            } => Some(*tickets_checked),
            EngineError::Store(_) => None,
        }
    }

    /// The page could not be reached: it reloaded, navigated or closed.
    pub fn is_transport(&self) -> bool {
        matches!(self, EngineError::Executor { source, .. } if source.is_transport())
    }
}

/// How one search pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    /// Matching tickets were clicked.
    Found {
        /// Tickets actually clicked, in page order.
        tickets: Vec<Ticket>,
        /// Every match on the page, clicked or not.
        total_matching: usize,
        tickets_checked: u32,
    },
    /// The session was stopped.
    Stopped { tickets_checked: u32 },
}

impl SearchResult {
    pub fn tickets_checked(&self) -> u32 {
        match self {
            SearchResult::Found {
                tickets_checked, ..
            }
            | SearchResult::Stopped { tickets_checked } => *tickets_checked,
        }
    }
}

/// Running totals of a purchase cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseTotals {
    pub tickets_purchased: u32,
    pub tickets_checked: u32,
    pub tickets_found: u32,
}

/// How a purchase cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    /// The quota was met.
    Completed(PurchaseTotals),
    Stopped(PurchaseTotals),
}

impl PurchaseOutcome {
    pub fn totals(&self) -> PurchaseTotals {
        match self {
            PurchaseOutcome::Completed(t) | PurchaseOutcome::Stopped(t) => *t,
        }
    }
}

/// Receives progress from a running engine.
///
/// Implementations must not fail: delivery is best-effort.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// One more ticket was evaluated.
    async fn ticket_checked(&self, _tab_id: TabId, _checked: u32) {}

    /// The engine moved to the next results page.
    async fn page_completed(&self, _tab_id: TabId, _checked: u32) {}

    /// A human-readable status line.
    async fn status(&self, _message: &str) {}

    async fn purchase_progress(&self, _tab_id: TabId, _purchased: u32, _found: u32) {}
}

/// Reporter that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        let transport = EngineError::Executor {
            source: ExecutorError::Transport("tab reloading".into()),
            tickets_checked: 12,
        };
        assert!(transport.is_transport());
        assert_eq!(transport.tickets_checked(), Some(12));

        let missing = EngineError::NoTicketsFound { tickets_checked: 90 };
        assert!(!missing.is_transport());
        assert_eq!(missing.to_string(), "No matching tickets found");
    }

    #[test]
    fn test_outcome_totals() {
        let totals = PurchaseTotals {
            tickets_purchased: 2,
            tickets_checked: 100,
            tickets_found: 3,
        };
        assert_eq!(PurchaseOutcome::Stopped(totals).totals(), totals);
    }
}
