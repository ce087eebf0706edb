//! Testing utilities and mock implementations.
//!
//! Mocks for the two browser-facing traits, so engines and the coordinator
//! can be driven end to end without a browser.
//!
//! # Example
//!
//! ```rust,ignore
//! use lottohunt_core::testing::{fixtures, MockExecutor, MockTabController};
//!
//! let executor = MockExecutor::new();
//! executor.set_pages(vec![fixtures::filler_page("p1", 10, &[5, 14, 23])]).await;
//! executor.set_page_loaded_after(3).await;
//!
//! let tabs = MockTabController::new();
//! tabs.add_tab(TabId(7), "https://www.stoloto.ru/ruslotto/game").await;
//! ```

mod mock_executor;
mod mock_tabs;

pub use mock_executor::MockExecutor;
pub use mock_tabs::MockTabController;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::criteria::{SearchCriteria, SearchMode};
    use crate::engine::EngineConfig;
    use crate::ticket::{Ticket, NUMBERS_PER_TICKET};

    /// Build a ticket from its six rows.
    pub fn ticket_from_rows(ticket_id: &str, rows: [[u8; 5]; 6]) -> Ticket {
        Ticket::new(ticket_id, rows.iter().flatten().copied().collect())
    }

    /// A full ticket that contains none of `avoid`.
    pub fn filler_ticket(ticket_id: &str, avoid: &[u8]) -> Ticket {
        let numbers = (1..=90u8)
            .filter(|n| !avoid.contains(n))
            .take(NUMBERS_PER_TICKET)
            .collect();
        Ticket::new(ticket_id, numbers)
    }

    /// `count` filler tickets with ids `{prefix}-0`, `{prefix}-1`, ...
    pub fn filler_page(prefix: &str, count: usize, avoid: &[u8]) -> Vec<Ticket> {
        (0..count)
            .map(|i| filler_ticket(&format!("{}-{}", prefix, i), avoid))
            .collect()
    }

    /// A ticket whose first row holds every number in `wanted` (at most five).
    pub fn row_match_ticket(ticket_id: &str, wanted: &[u8]) -> Ticket {
        let mut numbers: Vec<u8> = wanted.to_vec();
        numbers.extend(
            (1..=90u8)
                .filter(|n| !wanted.contains(n))
                .take(NUMBERS_PER_TICKET - wanted.len()),
        );
        Ticket::new(ticket_id, numbers)
    }

    /// Numbers 61..=90, clear of the low decades used by most tests.
    pub fn plain_ticket(ticket_id: &str) -> Ticket {
        Ticket::new(ticket_id, (61..=90).collect())
    }

    /// Search-only criteria in same-row mode. Not validated.
    pub fn row_criteria(numbers: &[u8]) -> SearchCriteria {
        purchase_criteria(numbers, 0)
    }

    /// Purchase criteria in same-row mode. Not validated.
    pub fn purchase_criteria(numbers: &[u8], tickets_to_buy: u32) -> SearchCriteria {
        SearchCriteria {
            search_numbers: numbers.to_vec(),
            exclude_numbers: Default::default(),
            mode: SearchMode::SameRow,
            tickets_to_buy,
        }
    }

    /// Engine timings shrunk to a few milliseconds.
    pub fn fast_engine_config() -> EngineConfig {
        EngineConfig {
            reload_delay_ms: 10,
            page_ready_initial_delay_ms: 1,
            page_ready_poll_interval_ms: 1,
            page_ready_max_attempts: 5,
            click_pause_ms: 1,
            post_select_settle_ms: 1,
            payment_poll_interval_ms: 1,
            payment_poll_max_attempts: 5,
            filter_max_numbers: 7,
        }
    }
}
