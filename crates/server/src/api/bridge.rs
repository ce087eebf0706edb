//! WebSocket bridge to the browser extension.
//!
//! The extension relays executor commands into the vendor page and performs
//! tab operations. Requests are correlated by id; the extension also pushes
//! page and tab events, which are queued for the coordinator.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use lottohunt_core::config::BridgeConfig;
use lottohunt_core::ticket::UserData;
use lottohunt_core::{
    ExecutorCommand, ExecutorError, ExecutorEvent, ExecutorReply, PageExecutor, SessionCoordinator,
    TabController, TabError, TabId, TabInfo,
};

use crate::metrics::{BRIDGE_CONNECTED, BRIDGE_EVENTS_DROPPED, BRIDGE_REQUESTS};
use crate::state::AppState;

// ============================================================================
// Wire format
// ============================================================================

/// A frame on the bridge socket, in either direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BridgeFrame {
    /// Server to extension.
    Request { id: Uuid, request: BridgeRequest },
    /// Extension to server, answering a request.
    Response {
        id: Uuid,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ok: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<BridgeFailure>,
    },
    /// Extension to server, unsolicited.
    Event { event: BridgeEvent },
}

/// Work the extension performs for the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeRequest {
    Executor {
        tab_id: TabId,
        command: ExecutorCommand,
    },
    GetTab {
        tab_id: TabId,
    },
    QueryTabs {
        url_prefix: String,
    },
    CreateTab {
        url: String,
    },
    ActivateTab {
        tab_id: TabId,
    },
    RemoveTab {
        tab_id: TabId,
    },
    ReloadTab {
        tab_id: TabId,
    },
}

impl BridgeRequest {
    pub fn name(&self) -> &'static str {
        match self {
            BridgeRequest::Executor { .. } => "executor",
            BridgeRequest::GetTab { .. } => "get_tab",
            BridgeRequest::QueryTabs { .. } => "query_tabs",
            BridgeRequest::CreateTab { .. } => "create_tab",
            BridgeRequest::ActivateTab { .. } => "activate_tab",
            BridgeRequest::RemoveTab { .. } => "remove_tab",
            BridgeRequest::ReloadTab { .. } => "reload_tab",
        }
    }
}

/// Why a bridge request failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeFailure {
    /// The target could not be reached at all (no connection, tab reloading).
    #[serde(default)]
    pub transport: bool,
    pub message: String,
}

impl BridgeFailure {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            transport: true,
            message: message.into(),
        }
    }
}

/// Something that happened in the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    PageReady { tab_id: TabId },
    UserDataUpdated { tab_id: TabId, user_data: UserData },
    AuthChanged { tab_id: TabId },
    TabUpdated { tab_id: TabId, url: String },
    TabRemoved { tab_id: TabId },
}

// ============================================================================
// Hub
// ============================================================================

type Pending = HashMap<Uuid, oneshot::Sender<Result<Value, BridgeFailure>>>;

struct Connection {
    id: u64,
    outbound: mpsc::UnboundedSender<BridgeFrame>,
}

/// Server side of the bridge: one extension connection at a time.
///
/// Implements [`PageExecutor`] and [`TabController`] by forwarding to the
/// extension. Cloning is cheap.
#[derive(Clone)]
pub struct BridgeHub {
    connection: Arc<RwLock<Option<Connection>>>,
    pending: Arc<RwLock<Pending>>,
    next_connection_id: Arc<RwLock<u64>>,
    events: mpsc::Sender<BridgeEvent>,
    request_timeout: Duration,
}

impl BridgeHub {
    /// Create a hub and the receiving end of its event queue.
    pub fn new(config: &BridgeConfig) -> (Self, mpsc::Receiver<BridgeEvent>) {
        let (events, events_rx) = mpsc::channel(config.event_buffer);
        let hub = Self {
            connection: Arc::new(RwLock::new(None)),
            pending: Arc::new(RwLock::new(HashMap::new())),
            next_connection_id: Arc::new(RwLock::new(0)),
            events,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        };
        (hub, events_rx)
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// Make a new connection current. A previous connection is replaced.
    ///
    /// Returns the connection id and the frames to write to it.
    pub async fn attach(&self) -> (u64, mpsc::UnboundedReceiver<BridgeFrame>) {
        let id = {
            let mut next = self.next_connection_id.write().await;
            *next += 1;
            *next
        };
        let (outbound, rx) = mpsc::unbounded_channel();
        let previous = self
            .connection
            .write()
            .await
            .replace(Connection { id, outbound });
        if previous.is_some() {
            warn!(connection = id, "Extension reconnected, replacing previous bridge");
            self.fail_pending("bridge connection replaced").await;
        }
        BRIDGE_CONNECTED.set(1);
        info!(connection = id, "Extension bridge connected");
        (id, rx)
    }

    /// Forget connection `id` and fail every request still waiting on it.
    pub async fn detach(&self, id: u64) {
        {
            let mut connection = self.connection.write().await;
            match connection.as_ref() {
                Some(current) if current.id == id => {
                    *connection = None;
                }
                _ => return,
            }
        }
        BRIDGE_CONNECTED.set(0);
        self.fail_pending("bridge disconnected").await;
        info!(connection = id, "Extension bridge disconnected");
    }

    /// Complete the request `id`.
    pub async fn resolve(&self, id: Uuid, result: Result<Value, BridgeFailure>) {
        match self.pending.write().await.remove(&id) {
            Some(waiter) => {
                let _ = waiter.send(result);
            }
            None => debug!(%id, "Response for unknown or expired request"),
        }
    }

    /// Queue an extension event for the coordinator.
    pub fn publish(&self, event: BridgeEvent) {
        if let Err(e) = self.events.try_send(event) {
            BRIDGE_EVENTS_DROPPED.inc();
            warn!(error = %e, "Dropping extension event");
        }
    }

    /// Send `request` to the extension and wait for its answer.
    pub async fn request(&self, request: BridgeRequest) -> Result<Value, BridgeFailure> {
        let name = request.name();
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();

        {
            let connection = self.connection.read().await;
            let Some(connection) = connection.as_ref() else {
                BRIDGE_REQUESTS
                    .with_label_values(&[name, "disconnected"])
                    .inc();
                return Err(BridgeFailure::transport("extension not connected"));
            };
            self.pending.write().await.insert(id, tx);
            if connection
                .outbound
                .send(BridgeFrame::Request { id, request })
                .is_err()
            {
                self.pending.write().await.remove(&id);
                BRIDGE_REQUESTS
                    .with_label_values(&[name, "disconnected"])
                    .inc();
                return Err(BridgeFailure::transport("bridge connection closed"));
            }
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => {
                let label = if result.is_ok() { "ok" } else { "error" };
                BRIDGE_REQUESTS.with_label_values(&[name, label]).inc();
                result
            }
            Ok(Err(_)) => {
                BRIDGE_REQUESTS
                    .with_label_values(&[name, "disconnected"])
                    .inc();
                Err(BridgeFailure::transport("bridge disconnected"))
            }
            Err(_) => {
                self.pending.write().await.remove(&id);
                BRIDGE_REQUESTS.with_label_values(&[name, "timeout"]).inc();
                warn!(request = name, %id, "Bridge request timed out");
                Err(BridgeFailure::transport(format!(
                    "no answer within {}ms",
                    self.request_timeout.as_millis()
                )))
            }
        }
    }

    async fn fail_pending(&self, reason: &str) {
        let waiters: Vec<_> = self.pending.write().await.drain().collect();
        if !waiters.is_empty() {
            debug!(count = waiters.len(), reason, "Failing pending bridge requests");
        }
        for (_, waiter) in waiters {
            let _ = waiter.send(Err(BridgeFailure::transport(reason)));
        }
    }

    async fn tab_request<T: DeserializeOwned>(&self, request: BridgeRequest) -> Result<T, TabError> {
        let value = self.request(request).await.map_err(|f| {
            if f.transport {
                TabError::Transport(f.message)
            } else {
                TabError::Failed(f.message)
            }
        })?;
        serde_json::from_value(value)
            .map_err(|e| TabError::Failed(format!("malformed tab reply: {}", e)))
    }
}

#[async_trait]
impl PageExecutor for BridgeHub {
    async fn execute(
        &self,
        tab_id: TabId,
        command: ExecutorCommand,
    ) -> Result<ExecutorReply, ExecutorError> {
        let name = command.name();
        let value = self
            .request(BridgeRequest::Executor { tab_id, command })
            .await
            .map_err(|f| {
                if f.transport {
                    ExecutorError::Transport(f.message)
                } else {
                    ExecutorError::Command {
                        command: name.to_string(),
                        message: f.message,
                    }
                }
            })?;
        serde_json::from_value(value.clone()).map_err(|_| ExecutorError::UnexpectedReply {
            command: name.to_string(),
            reply: value.to_string(),
        })
    }
}

#[async_trait]
impl TabController for BridgeHub {
    async fn get(&self, tab_id: TabId) -> Result<Option<TabInfo>, TabError> {
        self.tab_request(BridgeRequest::GetTab { tab_id }).await
    }

    async fn query(&self, url_prefix: &str) -> Result<Vec<TabInfo>, TabError> {
        self.tab_request(BridgeRequest::QueryTabs {
            url_prefix: url_prefix.to_string(),
        })
        .await
    }

    async fn create(&self, url: &str) -> Result<TabInfo, TabError> {
        self.tab_request(BridgeRequest::CreateTab {
            url: url.to_string(),
        })
        .await
    }

    async fn activate(&self, tab_id: TabId) -> Result<(), TabError> {
        self.tab_request::<Value>(BridgeRequest::ActivateTab { tab_id })
            .await
            .map(|_| ())
    }

    async fn remove(&self, tab_id: TabId) -> Result<(), TabError> {
        self.tab_request::<Value>(BridgeRequest::RemoveTab { tab_id })
            .await
            .map(|_| ())
    }

    async fn reload(&self, tab_id: TabId) -> Result<(), TabError> {
        self.tab_request::<Value>(BridgeRequest::ReloadTab { tab_id })
            .await
            .map(|_| ())
    }
}

// ============================================================================
// Event pump
// ============================================================================

/// Feed extension events to the coordinator until the hub is dropped.
pub async fn run_event_pump(coordinator: SessionCoordinator, mut events: mpsc::Receiver<BridgeEvent>) {
    while let Some(event) = events.recv().await {
        debug!(?event, "Extension event");
        match event {
            BridgeEvent::PageReady { tab_id } => {
                coordinator.handle_event(tab_id, ExecutorEvent::PageReady).await
            }
            BridgeEvent::UserDataUpdated { tab_id, user_data } => {
                coordinator
                    .handle_event(tab_id, ExecutorEvent::UserDataUpdated { user_data })
                    .await
            }
            BridgeEvent::AuthChanged { tab_id } => {
                coordinator
                    .handle_event(tab_id, ExecutorEvent::AuthChanged)
                    .await
            }
            BridgeEvent::TabUpdated { tab_id, url } => coordinator.tab_updated(tab_id, &url).await,
            BridgeEvent::TabRemoved { tab_id } => coordinator.tab_removed(tab_id).await,
        }
    }
    debug!("Extension event queue closed");
}

// ============================================================================
// Socket handler
// ============================================================================

/// WebSocket upgrade handler for the extension.
pub async fn bridge_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_bridge(socket, state))
}

async fn handle_bridge(socket: WebSocket, state: Arc<AppState>) {
    let hub = state.bridge().clone();
    let (mut sender, mut receiver) = socket.split();
    let (connection_id, mut outbound) = hub.attach().await;

    let send_task = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            match serde_json::to_string(&frame) {
                Ok(json) => {
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("Bridge send failed, extension disconnected");
                        break;
                    }
                }
                Err(e) => warn!("Failed to serialize bridge frame: {}", e),
            }
        }
    });

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<BridgeFrame>(&text) {
                Ok(BridgeFrame::Response { id, ok, error }) => {
                    let result = match error {
                        Some(failure) => Err(failure),
                        None => Ok(ok.unwrap_or(Value::Null)),
                    };
                    hub.resolve(id, result).await;
                }
                Ok(BridgeFrame::Event { event }) => hub.publish(event),
                Ok(BridgeFrame::Request { id, .. }) => {
                    warn!(%id, "Extension sent a request frame, ignoring");
                }
                Err(e) => warn!("Malformed bridge frame: {}", e),
            },
            Ok(Message::Close(_)) => {
                debug!("Extension requested close");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Bridge receive error: {}", e);
                break;
            }
        }
    }

    send_task.abort();
    hub.detach(connection_id).await;
}
