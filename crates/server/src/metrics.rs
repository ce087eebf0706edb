//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the lottohunt host:
//! - HTTP request metrics (latency, counts, errors)
//! - Panel WebSocket connection metrics
//! - Extension bridge state and request outcomes
//! - Coordinator sessions by phase (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
    Opts, Registry, TextEncoder,
};

use lottohunt_core::SessionPhase;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "lottohunt_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lottohunt_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "lottohunt_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Panel commands that ended in an error, by command and HTTP status.
pub static PANEL_COMMAND_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "lottohunt_panel_command_errors_total",
            "Panel commands rejected or failed",
        ),
        &["command", "status"],
    )
    .unwrap()
});

// =============================================================================
// Panel WebSocket Metrics
// =============================================================================

/// Active panel WebSocket connections.
pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "lottohunt_ws_connections_active",
        "Number of active panel WebSocket connections",
    )
    .unwrap()
});

/// Total panel WebSocket connections (cumulative).
pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "lottohunt_ws_connections_total",
        "Total panel WebSocket connections since startup",
    )
    .unwrap()
});

/// Panel events sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lottohunt_ws_messages_sent_total", "Panel events sent"),
        &["type"],
    )
    .unwrap()
});

/// WebSocket lag events (when a panel falls behind).
pub static WS_LAG_EVENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "lottohunt_ws_lag_events_total",
        "Panel WebSocket lag events (client fell behind)",
    )
    .unwrap()
});

// =============================================================================
// Bridge Metrics
// =============================================================================

/// Whether the browser extension is connected (1) or not (0).
pub static BRIDGE_CONNECTED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "lottohunt_bridge_connected",
        "Whether the browser extension bridge is connected",
    )
    .unwrap()
});

/// Bridge requests by request type and outcome.
pub static BRIDGE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("lottohunt_bridge_requests_total", "Requests sent over the bridge"),
        &["request", "result"], // result: "ok", "error", "timeout", "disconnected"
    )
    .unwrap()
});

/// Bridge events dropped because the event queue was full.
pub static BRIDGE_EVENTS_DROPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "lottohunt_bridge_events_dropped_total",
        "Extension events dropped on a full queue",
    )
    .unwrap()
});

// =============================================================================
// Coordinator Metrics (collected dynamically)
// =============================================================================

/// Tracked sessions by phase.
pub static SESSIONS_BY_PHASE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("lottohunt_sessions_by_phase", "Tracked sessions by phase"),
        &["phase"],
    )
    .unwrap()
});

/// Tabs the coordinator owns.
pub static OWNED_TABS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("lottohunt_owned_tabs", "Workspace tabs owned by the coordinator").unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(PANEL_COMMAND_ERRORS.clone()))
        .unwrap();

    // Panel WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();
    registry.register(Box::new(WS_LAG_EVENTS.clone())).unwrap();

    // Bridge
    registry
        .register(Box::new(BRIDGE_CONNECTED.clone()))
        .unwrap();
    registry
        .register(Box::new(BRIDGE_REQUESTS.clone()))
        .unwrap();
    registry
        .register(Box::new(BRIDGE_EVENTS_DROPPED.clone()))
        .unwrap();

    // Coordinator
    registry
        .register(Box::new(SESSIONS_BY_PHASE.clone()))
        .unwrap();
    registry.register(Box::new(OWNED_TABS.clone())).unwrap();

    // Core metrics (sessions, engines, executor)
    for metric in lottohunt_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the coordinator gauges reflect the present.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.coordinator().status().await;

    let running = status
        .sessions
        .iter()
        .filter(|s| s.phase == SessionPhase::Running)
        .count();
    let awaiting = status.sessions.len() - running;
    SESSIONS_BY_PHASE
        .with_label_values(&["running"])
        .set(running as i64);
    SESSIONS_BY_PHASE
        .with_label_values(&["awaiting_reload"])
        .set(awaiting as i64);
    OWNED_TABS.set(status.owned_tabs.len() as i64);
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();
    numeric_regex.replace_all(path, "/{id}$1").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(normalize_path("/api/v1/tabs/12345"), "/api/v1/tabs/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/api/v1/health"), "/api/v1/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("lottohunt_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Prometheus only outputs metrics that have been touched.
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        WS_CONNECTIONS_ACTIVE.set(0);
        WS_CONNECTIONS_TOTAL.inc();
        BRIDGE_CONNECTED.set(0);
        SESSIONS_BY_PHASE.with_label_values(&["running"]).set(0);
        lottohunt_core::metrics::ACTIVE_SESSIONS.set(0);

        let output = encode_metrics();

        assert!(output.contains("lottohunt_http_request_duration_seconds"));
        assert!(output.contains("lottohunt_http_requests_in_flight"));
        assert!(output.contains("lottohunt_ws_connections_active"));
        assert!(output.contains("lottohunt_ws_connections_total"));
        assert!(output.contains("lottohunt_bridge_connected"));
        assert!(output.contains("lottohunt_sessions_by_phase"));
        assert!(output.contains("lottohunt_active_sessions"));
    }
}
