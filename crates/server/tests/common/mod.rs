//! Common test utilities for in-process API testing with mocks.
//!
//! The fixture wires a real coordinator to mock browser traits and an
//! on-disk store, then exposes the router without binding a socket.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

use lottohunt_core::{
    config::{BridgeConfig, ServerConfig, StorageBackend, StorageConfig},
    testing::{MockExecutor, MockTabController},
    Config, PanelBroadcaster, SessionCoordinator, SqliteStore, StateStore, TabId, Workflow,
};
use lottohunt_server::api::{create_router, BridgeEvent, BridgeHub};
use lottohunt_server::state::AppState;

/// Re-export fixtures for test convenience
pub use lottohunt_core::testing::fixtures;

pub const GAME: &str = "https://www.stoloto.ru/ruslotto/game?viewType=tickets";
pub const TAB: TabId = TabId(7);

/// In-process server with controllable mocks.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    pub coordinator: SessionCoordinator,
    /// Mock page executor - configure pages, replies and failures
    pub executor: Arc<MockExecutor>,
    /// Mock tab controller - browser tabs
    pub tabs: Arc<MockTabController>,
    /// The (unconnected) extension bridge
    pub bridge: BridgeHub,
    /// Receiving end of the bridge event queue, for pump tests
    pub bridge_events: Option<mpsc::Receiver<BridgeEvent>>,
    pub store: StateStore,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with tab 7 open on the search page and owned.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            storage: StorageConfig {
                backend: StorageBackend::Sqlite,
                path: db_path.clone(),
            },
            engine: fixtures::fast_engine_config(),
            bridge: BridgeConfig {
                request_timeout_ms: 200,
                event_buffer: 16,
            },
            ..Default::default()
        };

        let store = StateStore::new(Arc::new(
            SqliteStore::new(&db_path).expect("Failed to create store"),
        ));
        let owned: BTreeSet<TabId> = [TAB].into_iter().collect();
        store.save_owned_tabs(&owned).expect("Failed to seed owned tabs");

        let executor = Arc::new(MockExecutor::new());
        let tabs = Arc::new(MockTabController::new());
        tabs.add_tab(TAB, GAME).await;

        let coordinator = SessionCoordinator::new(
            executor.clone(),
            tabs.clone(),
            Workflow::from_config(&config.workflow).expect("default workflow"),
            config.engine.clone(),
            store.clone(),
            PanelBroadcaster::new(256),
        )
        .expect("Failed to create coordinator");

        let (bridge, bridge_events) = BridgeHub::new(&config.bridge);

        let state = Arc::new(AppState::new(config, coordinator.clone(), bridge.clone()));
        let router = create_router(state);

        Self {
            router,
            coordinator,
            executor,
            tabs,
            bridge,
            bridge_events: Some(bridge_events),
            store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a PUT request with JSON body.
    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await.0
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let (response, bytes) = self.send(request).await;
        (response.status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await.0
    }

    async fn send(&self, request: Request<Body>) -> (TestResponse, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        (TestResponse { status, body }, body_bytes.to_vec())
    }

    /// Poll until no session runs in `tab_id`.
    pub async fn wait_until_idle(&self, tab_id: TabId) {
        let start = std::time::Instant::now();
        while self.coordinator.is_searching(tab_id).await {
            assert!(
                start.elapsed() < std::time::Duration::from_secs(5),
                "session in tab {} never finished",
                tab_id
            );
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
