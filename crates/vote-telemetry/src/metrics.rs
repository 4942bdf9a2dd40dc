//! Prometheus metrics for the vote relay.
//!
//! All metrics follow the naming convention: `vr_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PROTOCOL METRICS
    // =========================================================================

    /// Votes decoded, by protocol generation
    pub static ref VOTES_RECEIVED: IntCounterVec = IntCounterVec::new(
        Opts::new("vr_protocol_votes_received_total", "Votes decoded from vote-listing services"),
        &["protocol"]  // protocol: legacy/token
    ).expect("metric creation failed");

    /// Rejected frames, by failure kind
    pub static ref DECODE_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("vr_protocol_decode_failures_total", "Frames rejected by the protocol codec"),
        &["kind"]
    ).expect("metric creation failed");

    /// Connections that ended without a frame
    pub static ref CONNECTION_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("vr_protocol_connection_failures_total", "Connections that ended before a vote was read"),
        &["reason"]  // reason: timeout/incomplete/io
    ).expect("metric creation failed");

    // =========================================================================
    // FORWARDING METRICS
    // =========================================================================

    /// Deliveries that reached a backend on the first attempt
    pub static ref VOTES_FORWARDED: IntCounter = IntCounter::new(
        "vr_forwarding_votes_forwarded_total",
        "Votes delivered to a backend server on first attempt"
    ).expect("metric creation failed");

    /// Deliveries held in the cache for later replay
    pub static ref VOTES_CACHED: IntCounter = IntCounter::new(
        "vr_forwarding_votes_cached_total",
        "Votes held for an unreachable backend server or an offline player"
    ).expect("metric creation failed");

    /// Deliveries dropped because no cache is configured
    pub static ref VOTES_LOST: IntCounter = IntCounter::new(
        "vr_forwarding_votes_lost_total",
        "Votes that could not be delivered or cached"
    ).expect("metric creation failed");

    /// Held votes delivered by replay
    pub static ref VOTES_REPLAYED: IntCounter = IntCounter::new(
        "vr_forwarding_votes_replayed_total",
        "Cached votes delivered by replay"
    ).expect("metric creation failed");

    // =========================================================================
    // CACHE METRICS
    // =========================================================================

    /// Votes currently held
    pub static ref CACHE_PENDING: IntGauge = IntGauge::new(
        "vr_cache_votes_pending",
        "Votes currently held in the cache"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Protocol
        Box::new(VOTES_RECEIVED.clone()),
        Box::new(DECODE_FAILURES.clone()),
        Box::new(CONNECTION_FAILURES.clone()),
        // Forwarding
        Box::new(VOTES_FORWARDED.clone()),
        Box::new(VOTES_CACHED.clone()),
        Box::new(VOTES_LOST.clone()),
        Box::new(VOTES_REPLAYED.clone()),
        // Cache
        Box::new(CACHE_PENDING.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Raise a counter to `total` if it is behind. Used for totals that are kept
/// elsewhere and copied in at scrape time.
pub fn sync_counter(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
