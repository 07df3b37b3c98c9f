use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curatorr_core::{
    create_outcome_system, load_config, validate_config, AuditContext, DownloadClient,
    OutcomeEvent, OutcomeStore, PendingTorrentStore, QBittorrentClient, SanitizedConfig,
    SettingsProvider, SqliteOutcomeStore, SqlitePendingStore, SqliteSettingsStore, TorrentWatcher,
};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for outcome event channel
const OUTCOME_BUFFER_SIZE: usize = 1000;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("CURATORR_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    info!(
        "Configuration loaded: {}",
        serde_json::to_string(&sanitized).unwrap_or_default()
    );

    // Compute config hash for the startup event
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    register_metrics();

    // All stores share the configured database path
    let pending_store: Arc<dyn PendingTorrentStore> = Arc::new(
        SqlitePendingStore::new(&config.database.path)
            .context("Failed to create pending torrent store")?,
    );
    info!("Pending torrent store initialized");

    let settings_store = Arc::new(
        SqliteSettingsStore::new(&config.database.path)
            .context("Failed to create settings store")?,
    );
    let daemon_ctx = AuditContext::new("daemon");
    settings_store
        .ensure_active(&config.filter, &daemon_ctx)
        .context("Failed to seed filter settings")?;
    info!("Settings store initialized");

    let outcome_store: Arc<dyn OutcomeStore> = Arc::new(
        SqliteOutcomeStore::new(&config.database.path)
            .context("Failed to create outcome store")?,
    );
    info!("Outcome store initialized");

    // Create outcome system
    let (outcome_handle, outcome_writer) =
        create_outcome_system(outcome_store, OUTCOME_BUFFER_SIZE);

    // Spawn outcome writer task
    let writer_handle = tokio::spawn(outcome_writer.run());

    // Emit ServiceStarted event
    outcome_handle
        .emit(
            OutcomeEvent::ServiceStarted {
                version: VERSION.to_string(),
                config_hash: config_hash_short.to_string(),
            },
            &daemon_ctx,
        )
        .await;

    // Create download client
    info!(
        "Initializing qBittorrent client at {}",
        config.qbittorrent.url
    );
    let client: Arc<dyn DownloadClient> =
        Arc::new(QBittorrentClient::new(config.qbittorrent.clone()));

    let settings_provider: Arc<dyn SettingsProvider> = settings_store;

    // Create watcher
    let watcher = TorrentWatcher::new(
        config.watcher.clone(),
        pending_store,
        client,
        settings_provider,
        Some(outcome_handle.clone()),
    );

    if config.watcher.enabled {
        watcher.start().await;
        info!("Torrent watcher started");
    } else {
        info!("Watcher disabled in config");
    }

    // Wait for shutdown signal
    shutdown_signal().await;
    info!("Shutting down...");

    if config.watcher.enabled {
        watcher.stop().await;
        info!("Torrent watcher stopped");
    }

    // Emit ServiceStopped event
    outcome_handle
        .emit(
            OutcomeEvent::ServiceStopped {
                reason: "graceful_shutdown".to_string(),
            },
            &daemon_ctx,
        )
        .await;

    // Drop all holders of OutcomeHandle so the writer's channel closes.
    // The watcher holds a handle clone, so it must be dropped too.
    // Order matters: the final event is emitted BEFORE dropping handles.
    drop(watcher);
    drop(outcome_handle);

    // Wait for writer to finish processing remaining events
    let _ = writer_handle.await;
    info!("Outcome writer stopped");

    Ok(())
}

/// Register core metrics with the default Prometheus registry.
fn register_metrics() {
    let registry = prometheus::default_registry();
    for metric in curatorr_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
