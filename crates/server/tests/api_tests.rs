//! HTTP surface tests, run in-process against mocked browser traits.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use std::time::Duration;

use lottohunt_core::storage::SearchStatus;
use lottohunt_server::api::{run_event_pump, BridgeEvent};

use common::{fixtures, TestFixture, GAME, TAB};

const NUMBERS: [u8; 3] = [5, 14, 23];

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/health").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["bridge_connected"], false);
}

#[tokio::test]
async fn test_config_endpoint_is_sanitized() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/config").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["storage"]["backend"], "sqlite");
    assert_eq!(response.body["storage"]["path_configured"], true);
    assert!(response.body["storage"].get("path").is_none());
    assert_eq!(response.body["bridge"]["request_timeout_ms"], 200);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/api/v1/health").await;

    let (status, body) = fixture.get_text("/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("lottohunt_http_requests_total"));
    assert!(body.contains("lottohunt_owned_tabs"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/api/v1/nope").await;
    assert_status!(response, StatusCode::NOT_FOUND);
}

// =============================================================================
// Test mode
// =============================================================================

#[tokio::test]
async fn test_test_mode_round_trip() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/test-mode").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["enabled"], false);

    let response = fixture
        .put("/api/v1/test-mode", json!({"enabled": true}))
        .await;
    assert_status!(response, StatusCode::OK);
    assert!(fixture.store.test_mode().unwrap());

    let response = fixture.get("/api/v1/test-mode").await;
    assert_eq!(response.body["enabled"], true);
}

// =============================================================================
// Panel commands
// =============================================================================

#[tokio::test]
async fn test_panel_opened_reuses_owned_tab() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post("/api/v1/panel", json!({"type": "panel_opened"}))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["type"], "workspace");
    assert_eq!(response.body["tab_id"], TAB.0);
    assert_eq!(fixture.tabs.activated().await, vec![TAB]);
}

#[tokio::test]
async fn test_start_search_runs_to_completion() {
    let fixture = TestFixture::new().await;
    fixture
        .executor
        .set_pages(vec![vec![fixtures::row_match_ticket("m0", &NUMBERS)]])
        .await;

    let response = fixture
        .post(
            "/api/v1/panel",
            json!({
                "type": "start_search",
                "criteria": {"search_numbers": NUMBERS, "mode": "same_row"}
            }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["type"], "search_started");
    assert_eq!(response.body["tab_id"], TAB.0);

    fixture.wait_until_idle(TAB).await;

    let state = fixture.store.load_search_state().unwrap().unwrap();
    assert_eq!(state.status, SearchStatus::Completed);
    assert_eq!(state.tickets_found, 1);
}

#[tokio::test]
async fn test_start_search_accepts_camel_case_criteria() {
    let fixture = TestFixture::new().await;
    fixture.executor.set_latency(Duration::from_millis(20)).await;

    let response = fixture
        .post(
            "/api/v1/panel",
            json!({
                "type": "start_search",
                "criteria": {
                    "searchNumbers": [1, 11, 21, 31],
                    "excludeNumbers": [90],
                    "mode": "anywhere",
                    "ticketsToBuy": 0
                }
            }),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    fixture
        .post(
            "/api/v1/panel",
            json!({"type": "stop_search", "tab_id": TAB.0}),
        )
        .await;
    fixture.wait_until_idle(TAB).await;
}

#[tokio::test]
async fn test_invalid_criteria_is_400() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/panel",
            json!({
                "type": "start_search",
                "criteria": {"search_numbers": [1, 2], "mode": "same_row"}
            }),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("decade"));
    assert!(fixture.executor.commands().await.is_empty());
}

#[tokio::test]
async fn test_second_start_in_same_tab_is_409() {
    let fixture = TestFixture::new().await;
    fixture.executor.set_latency(Duration::from_millis(100)).await;

    let start = json!({
        "type": "start_search",
        "criteria": {"search_numbers": NUMBERS, "mode": "same_row"}
    });

    let first = fixture.post("/api/v1/panel", start.clone()).await;
    assert_status!(first, StatusCode::OK);

    let second = fixture.post("/api/v1/panel", start).await;
    assert_status!(second, StatusCode::CONFLICT);

    let stop = fixture
        .post(
            "/api/v1/panel",
            json!({"type": "stop_search", "tab_id": TAB.0}),
        )
        .await;
    assert_status!(stop, StatusCode::OK);
    assert_eq!(stop.body["type"], "ack");
    fixture.wait_until_idle(TAB).await;
}

#[tokio::test]
async fn test_executor_failure_is_502() {
    let fixture = TestFixture::new().await;
    fixture
        .executor
        .fail_command(
            "check_page_loaded",
            lottohunt_core::ExecutorError::Transport("tab is gone".into()),
        )
        .await;

    let response = fixture
        .post(
            "/api/v1/panel",
            json!({"type": "check_page_loaded", "tab_id": TAB.0}),
        )
        .await;
    assert_status!(response, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_get_user_data() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/panel",
            json!({"type": "get_user_data", "tab_id": TAB.0}),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["type"], "user_data");
    assert_eq!(response.body["user_data"]["is_authorized"], true);
}

#[tokio::test]
async fn test_malformed_command_is_rejected() {
    let fixture = TestFixture::new().await;
    let response = fixture.post_raw("/api/v1/panel", "{\"type\": ").await;
    assert!(response.status.is_client_error());

    let response = fixture
        .post("/api/v1/panel", json!({"type": "launch_rockets"}))
        .await;
    assert!(response.status.is_client_error());
}

#[tokio::test]
async fn test_status_lists_scheduled_reload() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post(
            "/api/v1/panel",
            json!({"type": "schedule_reload", "tab_id": TAB.0, "delay_ms": 60000}),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let status = fixture.get("/api/v1/status").await;
    assert_status!(status, StatusCode::OK);
    assert_eq!(status.body["scheduled_reloads"], json!([TAB.0]));
    assert_eq!(status.body["owned_tabs"], json!([TAB.0]));
    assert_eq!(status.body["sessions"], json!([]));
}

// =============================================================================
// Bridge events
// =============================================================================

#[tokio::test]
async fn test_bridge_events_reach_coordinator() {
    let mut fixture = TestFixture::new().await;
    let events = fixture.bridge_events.take().unwrap();
    tokio::spawn(run_event_pump(fixture.coordinator.clone(), events));

    fixture.bridge.publish(BridgeEvent::PageReady { tab_id: TAB });

    let start = std::time::Instant::now();
    loop {
        let response = fixture
            .post(
                "/api/v1/panel",
                json!({"type": "check_search_status", "tab_id": TAB.0}),
            )
            .await;
        if response.body["page_ready"] == true {
            break;
        }
        assert!(start.elapsed() < Duration::from_secs(2), "page never ready");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_bridge_tab_removed_tears_down() {
    let mut fixture = TestFixture::new().await;
    let mut panel = fixture.coordinator.panel().subscribe();
    let events = fixture.bridge_events.take().unwrap();
    tokio::spawn(run_event_pump(fixture.coordinator.clone(), events));

    fixture.bridge.publish(BridgeEvent::TabUpdated {
        tab_id: TAB,
        url: GAME.to_string(),
    });
    fixture.bridge.publish(BridgeEvent::TabRemoved { tab_id: TAB });

    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match panel.recv().await {
                Ok(lottohunt_core::PanelEvent::ClosePanel) => break,
                Ok(_) => continue,
                Err(e) => panic!("panel channel failed: {}", e),
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "close_panel never sent");
    assert!(fixture.coordinator.owned_tabs().await.is_empty());
}
