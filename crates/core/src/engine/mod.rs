//! Search and purchase engines.
//!
//! - **Search**: one pass of reload, filter and pagination until a match,
//!   exhaustion or a stop.
//! - **Purchase**: repeated search passes with a payment after each, resumable
//!   across page reloads through the persisted checkpoint.

mod config;
mod purchase;
mod search;
mod session;
mod types;

pub use config::EngineConfig;
pub use purchase::PurchaseEngine;
pub use search::SearchEngine;
pub use session::Session;
pub use types::{
    EngineError, NoopReporter, ProgressReporter, PurchaseOutcome, PurchaseTotals, SearchResult,
};
