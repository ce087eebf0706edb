//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Sessions (starts, outcomes, active count)
//! - Engines (tickets checked and purchased)
//! - Page executor (command failures)

use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Sessions
// =============================================================================

/// Sessions accepted by the coordinator, by kind.
pub static SESSIONS_STARTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lottohunt_sessions_started_total", "Total sessions started"),
        &["kind"], // "search", "purchase"
    )
    .unwrap()
});

/// Finished sessions by outcome.
pub static SESSION_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lottohunt_session_outcomes_total",
            "Total finished sessions by outcome",
        ),
        &["result"], // "completed", "stopped", "error", "awaiting_reload", "interrupted"
    )
    .unwrap()
});

/// Sessions currently tracked by the coordinator.
pub static ACTIVE_SESSIONS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("lottohunt_active_sessions", "Sessions currently tracked").unwrap()
});

// =============================================================================
// Engines
// =============================================================================

/// Tickets evaluated against criteria.
pub static TICKETS_CHECKED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "lottohunt_tickets_checked_total",
        "Total tickets evaluated against criteria",
    )
    .unwrap()
});

/// Tickets paid for.
pub static TICKETS_PURCHASED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("lottohunt_tickets_purchased_total", "Total tickets purchased").unwrap()
});

// =============================================================================
// Page executor
// =============================================================================

/// Executor command failures by command and error kind.
pub static EXECUTOR_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lottohunt_executor_failures_total",
            "Total failed page executor commands",
        ),
        &["command", "kind"], // kind: "transport", "command", "unexpected_reply"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Sessions
        Box::new(SESSIONS_STARTED.clone()),
        Box::new(SESSION_OUTCOMES.clone()),
        Box::new(ACTIVE_SESSIONS.clone()),
        // Engines
        Box::new(TICKETS_CHECKED.clone()),
        Box::new(TICKETS_PURCHASED.clone()),
        // Executor
        Box::new(EXECUTOR_FAILURES.clone()),
    ]
}
