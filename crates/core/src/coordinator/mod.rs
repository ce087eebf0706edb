//! Session coordinator: per-tab session lifecycle across page reloads.
//!
//! The coordinator is the only component that turns engine results and errors
//! into persisted state and panel notifications:
//! - **Start/stop**: validates criteria, prepares the workspace tab, spawns engines
//! - **Readiness**: resumes sessions parked by an expected reload, and flags
//!   unexpected reloads that interrupted a purchase
//! - **Navigation and close**: tears down sessions whose tab left the workflow

mod reporter;
mod runner;
mod types;

pub use runner::SessionCoordinator;
pub use types::{CoordinatorError, CoordinatorStatus, SessionPhase, SessionSummary};
