//! Torrent watcher implementation.
//!
//! Drives pending torrents through their lifecycle automatically:
//! - Metadata polling: each tick checks torrents still waiting for metadata
//! - Filtering: torrents with metadata are evaluated against the active policy
//! - Intake: optional discovery of torrents added directly to the client
//!
//! Each tick advances a torrent by at most one stage, so progress stays
//! observable between ticks and a crash never skips a stage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::download_client::{DownloadClient, DownloadClientError, MetadataStatus, TorrentState};
use crate::filter::{evaluate, FilterSettings};
use crate::metrics;
use crate::outcome::{OutcomeEvent, OutcomeHandle};
use crate::pending::{
    AuditContext, NewPendingTorrent, PendingTorrent, PendingTorrentStore, StoreError,
    TorrentStatus, TransitionFields,
};
use crate::settings::SettingsProvider;

use super::config::WatcherConfig;
use super::types::{RegisterRequest, WatcherError, WatcherStatus};

/// The torrent watcher - polls the download client and filters arrivals.
pub struct TorrentWatcher {
    config: WatcherConfig,
    store: Arc<dyn PendingTorrentStore>,
    client: Arc<dyn DownloadClient>,
    settings: Arc<dyn SettingsProvider>,
    outcome: Option<OutcomeHandle>,

    // Runtime state
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
}

impl TorrentWatcher {
    /// Create a new watcher.
    pub fn new(
        config: WatcherConfig,
        store: Arc<dyn PendingTorrentStore>,
        client: Arc<dyn DownloadClient>,
        settings: Arc<dyn SettingsProvider>,
        outcome: Option<OutcomeHandle>,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            store,
            client,
            settings,
            outcome,
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
        }
    }

    /// Start the watcher (spawns background tasks).
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Watcher already running");
            return;
        }

        info!("Starting torrent watcher");

        self.spawn_tick_loop();

        if self.config.intake.enabled {
            self.spawn_intake_loop();
        }

        info!("Torrent watcher started");
    }

    /// Stop the watcher gracefully.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Watcher not running");
            return;
        }

        info!("Stopping torrent watcher");

        // Signal shutdown to all workers
        let _ = self.shutdown_tx.send(());

        // Give workers a moment to finish current work
        tokio::time::sleep(Duration::from_millis(500)).await;

        info!("Torrent watcher stopped");
    }

    /// Get current watcher status.
    pub async fn status(&self) -> WatcherStatus {
        let count = |status: TorrentStatus| -> usize {
            self.store.count_by_status(status).unwrap_or(0) as usize
        };

        WatcherStatus {
            running: self.running.load(Ordering::Relaxed),
            waiting_metadata: count(TorrentStatus::WaitingMetadata),
            metadata_ready: count(TorrentStatus::MetadataReady),
            filtering: count(TorrentStatus::Filtering),
            completed: count(TorrentStatus::Completed),
            failed: count(TorrentStatus::Failed),
            timed_out: count(TorrentStatus::TimedOut),
        }
    }

    /// Put a torrent under watch.
    ///
    /// Registering a hash that is already tracked returns the existing
    /// record unchanged; no second registration event is emitted.
    pub async fn register_torrent(
        &self,
        request: RegisterRequest,
    ) -> Result<PendingTorrent, WatcherError> {
        let ctx = AuditContext::new(&request.source_tag);

        let new = NewPendingTorrent {
            torrent_hash: request.torrent_hash.clone(),
            magnet_link: request.magnet_link,
            save_path: request.save_path,
            category: request.category,
            video_number: request.video_number,
            source_tag: request.source_tag.clone(),
            max_retries: self.config.max_retries,
        };

        match self.store.create(new, &ctx) {
            Ok(record) => {
                metrics::TORRENTS_REGISTERED
                    .with_label_values(&["created"])
                    .inc();

                if let Some(ref handle) = self.outcome {
                    handle
                        .emit(
                            OutcomeEvent::TorrentRegistered {
                                torrent_hash: record.torrent_hash.clone(),
                                source_tag: request.source_tag,
                                save_path: record.save_path.clone(),
                            },
                            &ctx,
                        )
                        .await;
                }

                info!("Registered torrent {} for watching", record.torrent_hash);
                Ok(record)
            }
            Err(StoreError::Duplicate(hash)) => {
                metrics::TORRENTS_REGISTERED
                    .with_label_values(&["duplicate"])
                    .inc();
                debug!("Torrent {} already registered", hash);

                self.store
                    .get(&hash)?
                    .ok_or(WatcherError::TorrentNotFound(hash))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Spawn the tick loop task.
    fn spawn_tick_loop(&self) {
        let running = Arc::clone(&self.running);
        let store = Arc::clone(&self.store);
        let client = Arc::clone(&self.client);
        let settings = Arc::clone(&self.settings);
        let outcome = self.outcome.clone();
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Watcher tick loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Watcher tick loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(config.tick_interval_ms)) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }

                        metrics::TICKS.inc();
                        let started = Instant::now();
                        match Self::process_tick(&store, &client, &settings, &outcome).await {
                            Ok(()) => {
                                metrics::TICK_DURATION
                                    .with_label_values(&["success"])
                                    .observe(started.elapsed().as_secs_f64());
                            }
                            Err(e) => {
                                metrics::TICK_FAILURES.inc();
                                metrics::TICK_DURATION
                                    .with_label_values(&["failed"])
                                    .observe(started.elapsed().as_secs_f64());
                                warn!("Watcher tick aborted: {}", e);
                            }
                        }
                    }
                }
            }
            info!("Watcher tick loop stopped");
        });
    }

    /// Spawn the intake discovery loop task.
    fn spawn_intake_loop(&self) {
        let running = Arc::clone(&self.running);
        let store = Arc::clone(&self.store);
        let client = Arc::clone(&self.client);
        let outcome = self.outcome.clone();
        let config = self.config.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            info!("Intake loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Intake loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(Duration::from_millis(config.intake.poll_interval_ms)) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        if let Err(e) = Self::run_intake(&store, &client, &outcome, &config).await {
                            warn!("Intake scan failed: {}", e);
                        }
                    }
                }
            }
            info!("Intake loop stopped");
        });
    }

    /// Process one watcher tick.
    ///
    /// Work lists are snapshotted up front, so a torrent advanced by this
    /// tick is picked up again on the next one rather than racing ahead.
    async fn process_tick(
        store: &Arc<dyn PendingTorrentStore>,
        client: &Arc<dyn DownloadClient>,
        settings_provider: &Arc<dyn SettingsProvider>,
        outcome: &Option<OutcomeHandle>,
    ) -> Result<(), WatcherError> {
        let settings = settings_provider.active()?;
        let ctx = AuditContext::new("watcher");

        let waiting = store.list_by_status(TorrentStatus::WaitingMetadata)?;
        // Filtering records are leftovers from an interrupted run; resume them.
        let filtering = store.list_by_status(TorrentStatus::Filtering)?;
        let ready = store.list_by_status(TorrentStatus::MetadataReady)?;

        for record in waiting {
            match Self::process_waiting(store, client, outcome, &ctx, &record).await {
                Ok(()) => {}
                Err(e @ WatcherError::Store(StoreError::Database(_))) => return Err(e),
                Err(WatcherError::Store(StoreError::Conflict { hash, .. })) => {
                    debug!("Skipping torrent {}: concurrent update", hash);
                }
                Err(e) => warn!("Failed to advance torrent {}: {}", record.torrent_hash, e),
            }
        }

        for record in filtering.into_iter().chain(ready) {
            match Self::process_ready(store, client, outcome, &ctx, &settings, &record).await {
                Ok(()) => {}
                Err(e @ WatcherError::Store(StoreError::Database(_))) => return Err(e),
                Err(WatcherError::Store(StoreError::Conflict { hash, .. })) => {
                    debug!("Skipping torrent {}: concurrent update", hash);
                }
                Err(e) => warn!("Failed to advance torrent {}: {}", record.torrent_hash, e),
            }
        }

        Ok(())
    }

    /// Advance a torrent waiting for metadata.
    async fn process_waiting(
        store: &Arc<dyn PendingTorrentStore>,
        client: &Arc<dyn DownloadClient>,
        outcome: &Option<OutcomeHandle>,
        ctx: &AuditContext,
        record: &PendingTorrent,
    ) -> Result<(), WatcherError> {
        match Self::fetch_metadata_timed(client, &record.torrent_hash).await {
            Ok(MetadataStatus::Ready { files, meta }) => {
                let fields = TransitionFields::new()
                    .with_file_count(files.len() as u32)
                    .with_total_size_bytes(meta.total_size_bytes);

                store.transition(
                    &record.torrent_hash,
                    TorrentStatus::WaitingMetadata,
                    TorrentStatus::MetadataReady,
                    fields,
                    ctx,
                )?;
                metrics::TRANSITIONS
                    .with_label_values(&[TorrentStatus::MetadataReady.as_str()])
                    .inc();

                debug!(
                    "Metadata ready for {} ({} files)",
                    record.torrent_hash,
                    files.len()
                );
                Ok(())
            }
            Ok(MetadataStatus::NotReady) => {
                Self::handle_not_ready(
                    store,
                    outcome,
                    ctx,
                    record,
                    TorrentStatus::WaitingMetadata,
                    None,
                )
                .await
            }
            Err(e) if e.is_hard() => {
                Self::finalize_failed(
                    store,
                    outcome,
                    ctx,
                    record,
                    TorrentStatus::WaitingMetadata,
                    format!("download client rejected torrent: {}", e),
                )
                .await
            }
            Err(e) => {
                // Transient client errors consume the retry budget like a missed check.
                Self::handle_not_ready(
                    store,
                    outcome,
                    ctx,
                    record,
                    TorrentStatus::WaitingMetadata,
                    Some(e),
                )
                .await
            }
        }
    }

    /// Handle a metadata check that came back empty-handed.
    ///
    /// The budget is checked before it is consumed, so `retry_count` never
    /// exceeds `max_retries`: a torrent that is still not ready once the
    /// budget is spent times out instead.
    async fn handle_not_ready(
        store: &Arc<dyn PendingTorrentStore>,
        outcome: &Option<OutcomeHandle>,
        ctx: &AuditContext,
        record: &PendingTorrent,
        expected: TorrentStatus,
        last_error: Option<DownloadClientError>,
    ) -> Result<(), WatcherError> {
        if record.retry_count >= record.max_retries {
            let message = match last_error {
                Some(e) => format!(
                    "metadata still not ready after {} checks (last error: {})",
                    record.retry_count + 1,
                    e
                ),
                None => format!(
                    "metadata still not ready after {} checks",
                    record.retry_count + 1
                ),
            };

            let completed_at = Utc::now();
            let fields = TransitionFields::new()
                .with_error_message(message.clone())
                .with_completed_at(completed_at);

            store.transition(
                &record.torrent_hash,
                expected,
                TorrentStatus::TimedOut,
                fields,
                ctx,
            )?;
            metrics::TRANSITIONS
                .with_label_values(&[TorrentStatus::TimedOut.as_str()])
                .inc();

            if let Some(handle) = outcome {
                handle
                    .emit(
                        OutcomeEvent::TorrentTimedOut {
                            torrent_hash: record.torrent_hash.clone(),
                            error_message: message.clone(),
                            retry_count: record.retry_count,
                            completed_at,
                        },
                        ctx,
                    )
                    .await;
            }

            warn!(
                "Torrent {} timed out waiting for metadata: {}",
                record.torrent_hash, message
            );
            Ok(())
        } else {
            let count = store.increment_retry(&record.torrent_hash, ctx)?;
            metrics::RETRY_CHECKS.inc();

            match last_error {
                Some(e) => debug!(
                    "Metadata check {}/{} for {} failed: {}",
                    count, record.max_retries, record.torrent_hash, e
                ),
                None => debug!(
                    "Metadata not ready for {} (check {}/{})",
                    record.torrent_hash, count, record.max_retries
                ),
            }
            Ok(())
        }
    }

    /// Filter a torrent whose metadata has arrived.
    async fn process_ready(
        store: &Arc<dyn PendingTorrentStore>,
        client: &Arc<dyn DownloadClient>,
        outcome: &Option<OutcomeHandle>,
        ctx: &AuditContext,
        settings: &FilterSettings,
        record: &PendingTorrent,
    ) -> Result<(), WatcherError> {
        // Claim the torrent before filtering. Records already in Filtering
        // were claimed by an interrupted run and are resumed as-is.
        if record.status == TorrentStatus::MetadataReady {
            store.transition(
                &record.torrent_hash,
                TorrentStatus::MetadataReady,
                TorrentStatus::Filtering,
                TransitionFields::new(),
                ctx,
            )?;
            metrics::TRANSITIONS
                .with_label_values(&[TorrentStatus::Filtering.as_str()])
                .inc();
        }

        match Self::fetch_metadata_timed(client, &record.torrent_hash).await {
            Ok(MetadataStatus::Ready { files, meta }) => {
                match evaluate(&files, &meta, settings) {
                    Ok(result) if result.passed => {
                        let completed_at = Utc::now();
                        let kept = result.kept_count;
                        let fields = TransitionFields::new()
                            .with_filtered_file_count(kept)
                            .with_filter_result(result.clone())
                            .with_completed_at(completed_at);

                        store.transition(
                            &record.torrent_hash,
                            TorrentStatus::Filtering,
                            TorrentStatus::Completed,
                            fields,
                            ctx,
                        )?;
                        metrics::TRANSITIONS
                            .with_label_values(&[TorrentStatus::Completed.as_str()])
                            .inc();

                        // The event follows the transition, so a completion
                        // is never announced for a torrent that lost the race.
                        if let Some(handle) = outcome {
                            handle
                                .emit(
                                    OutcomeEvent::TorrentCompleted {
                                        torrent_hash: record.torrent_hash.clone(),
                                        filter_result: result,
                                        completed_at,
                                    },
                                    ctx,
                                )
                                .await;
                        }

                        info!(
                            "Torrent {} completed: kept {} of {} files",
                            record.torrent_hash,
                            kept,
                            files.len()
                        );
                        Ok(())
                    }
                    Ok(result) => {
                        let message = if result.kept_files.is_empty() {
                            "no files matched filter policy".to_string()
                        } else {
                            "torrent failed seed or size thresholds".to_string()
                        };
                        Self::finalize_failed(
                            store,
                            outcome,
                            ctx,
                            record,
                            TorrentStatus::Filtering,
                            message,
                        )
                        .await
                    }
                    Err(e) => {
                        Self::finalize_failed(
                            store,
                            outcome,
                            ctx,
                            record,
                            TorrentStatus::Filtering,
                            format!("filter evaluation failed: {}", e),
                        )
                        .await
                    }
                }
            }
            Ok(MetadataStatus::NotReady) => {
                // The client lost the metadata between stages; treat it as a
                // missed check so the torrent eventually times out.
                Self::handle_not_ready(store, outcome, ctx, record, TorrentStatus::Filtering, None)
                    .await
            }
            Err(e) if e.is_hard() => {
                Self::finalize_failed(
                    store,
                    outcome,
                    ctx,
                    record,
                    TorrentStatus::Filtering,
                    format!("download client rejected torrent: {}", e),
                )
                .await
            }
            Err(e) => {
                Self::handle_not_ready(
                    store,
                    outcome,
                    ctx,
                    record,
                    TorrentStatus::Filtering,
                    Some(e),
                )
                .await
            }
        }
    }

    /// Move a torrent to Failed and announce it.
    async fn finalize_failed(
        store: &Arc<dyn PendingTorrentStore>,
        outcome: &Option<OutcomeHandle>,
        ctx: &AuditContext,
        record: &PendingTorrent,
        expected: TorrentStatus,
        message: String,
    ) -> Result<(), WatcherError> {
        let completed_at = Utc::now();
        let fields = TransitionFields::new()
            .with_error_message(message.clone())
            .with_completed_at(completed_at);

        store.transition(
            &record.torrent_hash,
            expected,
            TorrentStatus::Failed,
            fields,
            ctx,
        )?;
        metrics::TRANSITIONS
            .with_label_values(&[TorrentStatus::Failed.as_str()])
            .inc();

        if let Some(handle) = outcome {
            handle
                .emit(
                    OutcomeEvent::TorrentFailed {
                        torrent_hash: record.torrent_hash.clone(),
                        error_message: message.clone(),
                        completed_at,
                    },
                    ctx,
                )
                .await;
        }

        warn!("Torrent {} failed: {}", record.torrent_hash, message);
        Ok(())
    }

    /// Scan the client for torrents nobody registered.
    async fn run_intake(
        store: &Arc<dyn PendingTorrentStore>,
        client: &Arc<dyn DownloadClient>,
        outcome: &Option<OutcomeHandle>,
        config: &WatcherConfig,
    ) -> Result<(), WatcherError> {
        let ctx = AuditContext::new("intake");

        let torrents =
            Self::list_torrents_timed(client, config.intake.category.as_deref()).await?;

        for torrent in torrents {
            if torrent.state == TorrentState::Error {
                debug!("Skipping errored torrent {}", torrent.hash);
                continue;
            }
            if store.get(&torrent.hash)?.is_some() {
                continue;
            }

            let new = NewPendingTorrent {
                torrent_hash: torrent.hash.clone(),
                magnet_link: format!("magnet:?xt=urn:btih:{}", torrent.hash),
                save_path: torrent.save_path.clone().unwrap_or_default(),
                category: torrent.category.clone(),
                video_number: None,
                source_tag: "intake".to_string(),
                max_retries: config.max_retries,
            };

            match store.create(new, &ctx) {
                Ok(record) => {
                    metrics::TORRENTS_REGISTERED
                        .with_label_values(&["created"])
                        .inc();

                    if let Some(handle) = outcome {
                        handle
                            .emit(
                                OutcomeEvent::TorrentRegistered {
                                    torrent_hash: record.torrent_hash.clone(),
                                    source_tag: "intake".to_string(),
                                    save_path: record.save_path.clone(),
                                },
                                &ctx,
                            )
                            .await;
                    }

                    info!("Discovered torrent {} in client", record.torrent_hash);
                }
                Err(StoreError::Duplicate(_)) => {
                    // Raced with another registration path.
                    metrics::TORRENTS_REGISTERED
                        .with_label_values(&["duplicate"])
                        .inc();
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    async fn fetch_metadata_timed(
        client: &Arc<dyn DownloadClient>,
        hash: &str,
    ) -> Result<MetadataStatus, DownloadClientError> {
        let started = Instant::now();
        let result = client.fetch_metadata(hash).await;

        metrics::CLIENT_REQUEST_DURATION
            .with_label_values(&["fetch_metadata"])
            .observe(started.elapsed().as_secs_f64());
        let status = if result.is_ok() { "success" } else { "error" };
        metrics::CLIENT_REQUESTS
            .with_label_values(&["fetch_metadata", status])
            .inc();

        result
    }

    async fn list_torrents_timed(
        client: &Arc<dyn DownloadClient>,
        category: Option<&str>,
    ) -> Result<Vec<crate::download_client::ClientTorrent>, DownloadClientError> {
        let started = Instant::now();
        let result = client.list_torrents(category).await;

        metrics::CLIENT_REQUEST_DURATION
            .with_label_values(&["list_torrents"])
            .observe(started.elapsed().as_secs_f64());
        let status = if result.is_ok() { "success" } else { "error" };
        metrics::CLIENT_REQUESTS
            .with_label_values(&["list_torrents", status])
            .inc();

        result
    }
}
