use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lottohunt_core::config::StorageBackend;
use lottohunt_core::{
    load_config, validate_config, KeyValueStore, MemoryStore, PageExecutor, PanelBroadcaster,
    SessionCoordinator, SqliteStore, StateStore, TabController, Workflow,
};

use lottohunt_server::api::{create_router, run_event_pump, BridgeHub};
use lottohunt_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("LOTTOHUNT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Target page: {}", config.workflow.target_url);

    // Durable state
    let kv: Arc<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::Sqlite => {
            info!("Using SQLite state store at {:?}", config.storage.path);
            Arc::new(
                SqliteStore::new(&config.storage.path)
                    .with_context(|| format!("Failed to open {:?}", config.storage.path))?,
            )
        }
        StorageBackend::Memory => {
            info!("Using in-memory state store (state is lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };
    let store = StateStore::new(kv);

    let workflow = Workflow::from_config(&config.workflow).context("Invalid workflow patterns")?;

    // Extension bridge carries both page commands and tab operations
    let (bridge, bridge_events) = BridgeHub::new(&config.bridge);
    let executor: Arc<dyn PageExecutor> = Arc::new(bridge.clone());
    let tabs: Arc<dyn TabController> = Arc::new(bridge.clone());

    let panel = PanelBroadcaster::new(config.bridge.event_buffer);

    let coordinator = SessionCoordinator::new(
        executor,
        tabs,
        workflow,
        config.engine.clone(),
        store,
        panel,
    )
    .context("Failed to restore coordinator state")?;
    info!("Session coordinator initialized");

    let pump_handle = tokio::spawn(run_event_pump(coordinator.clone(), bridge_events));

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), coordinator, bridge));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    pump_handle.abort();

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
