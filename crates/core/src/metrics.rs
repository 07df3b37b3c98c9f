//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Watcher (ticks, registrations, retries, transitions)
//! - Download client (request counts, latency)
//! - Outcome log (persisted events)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Watcher Metrics
// =============================================================================

/// Torrent registrations total by result.
pub static TORRENTS_REGISTERED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "curatorr_torrents_registered_total",
            "Total torrent registrations",
        ),
        &["result"], // "created", "duplicate"
    )
    .unwrap()
});

/// Watcher ticks total.
pub static TICKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("curatorr_watcher_ticks_total", "Total watcher ticks").unwrap()
});

/// Watcher ticks that aborted on a storage or settings error.
pub static TICK_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "curatorr_watcher_tick_failures_total",
        "Total watcher ticks that aborted early",
    )
    .unwrap()
});

/// Tick duration in seconds.
pub static TICK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "curatorr_watcher_tick_duration_seconds",
            "Duration of watcher ticks",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Metadata readiness checks that found the torrent still not ready.
pub static RETRY_CHECKS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "curatorr_metadata_retry_checks_total",
        "Total metadata checks that consumed retry budget",
    )
    .unwrap()
});

// =============================================================================
// Torrent Lifecycle Metrics
// =============================================================================

/// Status transitions total by target status.
pub static TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "curatorr_transitions_total",
            "Total pending torrent status transitions",
        ),
        &["to_status"], // "metadata_ready", "filtering", "completed", "failed", "timed_out"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// Download client requests total.
pub static CLIENT_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "curatorr_client_requests_total",
            "Total download client requests",
        ),
        &["operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Download client request duration.
pub static CLIENT_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "curatorr_client_request_duration_seconds",
            "Duration of download client calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Outcome Metrics
// =============================================================================

/// Outcome events persisted by event type.
pub static OUTCOME_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "curatorr_outcome_events_total",
            "Total outcome events persisted",
        ),
        &["event_type"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Watcher
        Box::new(TORRENTS_REGISTERED.clone()),
        Box::new(TICKS.clone()),
        Box::new(TICK_FAILURES.clone()),
        Box::new(TICK_DURATION.clone()),
        Box::new(RETRY_CHECKS.clone()),
        // Lifecycle
        Box::new(TRANSITIONS.clone()),
        // External services
        Box::new(CLIENT_REQUESTS.clone()),
        Box::new(CLIENT_REQUEST_DURATION.clone()),
        // Outcomes
        Box::new(OUTCOME_EVENTS.clone()),
    ]
}
