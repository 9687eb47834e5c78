//! Prometheus metrics for the election node.
//!
//! Covers vote admission, the node's own votes and election outcomes. The
//! [`NodeMetrics`] struct owns a dedicated [`Registry`] that an exporter can
//! encode into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Central collection of all node-level Prometheus metrics.
pub struct NodeMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Votes handed to the prioritizer.
    pub votes_received: IntCounter,
    /// Votes dropped before reaching an election, by reason.
    pub votes_dropped: IntCounterVec,
    /// Votes refused at admission, by reason.
    pub votes_rejected: IntCounterVec,
    /// Votes this node cast, labelled `final` or `non_final`.
    pub votes_cast: IntCounterVec,
    pub elections_started: IntCounter,
    pub elections_confirmed: IntCounter,
    pub elections_staled: IntCounter,
    /// Confirmed transactions that failed to persist.
    pub store_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Open elections (slots).
    pub active_elections: IntGauge,
    /// Votes waiting in the prioritizer queue.
    pub queue_size: IntGauge,
    /// Candidates with buffered votes awaiting their election.
    pub buffered_groups: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time from transaction reception to confirmation, in milliseconds.
    pub confirmation_latency_ms: Histogram,
}

impl NodeMetrics {
    /// Create a fresh set of metrics, all registered under a new
    /// [`Registry`].
    pub fn new() -> Self {
        let registry = Registry::new();

        // Counters
        let votes_received = register_int_counter_with_registry!(
            Opts::new("quorum_votes_received_total", "Total votes received"),
            registry
        )
        .expect("failed to register votes_received counter");

        let votes_dropped = register_int_counter_vec_with_registry!(
            Opts::new("quorum_votes_dropped_total", "Votes dropped before reaching an election"),
            &["reason"],
            registry
        )
        .expect("failed to register votes_dropped counter");

        let votes_rejected = register_int_counter_vec_with_registry!(
            Opts::new("quorum_votes_rejected_total", "Votes rejected at admission"),
            &["reason"],
            registry
        )
        .expect("failed to register votes_rejected counter");

        let votes_cast = register_int_counter_vec_with_registry!(
            Opts::new("quorum_votes_cast_total", "Votes cast by this node"),
            &["kind"],
            registry
        )
        .expect("failed to register votes_cast counter");

        let elections_started = register_int_counter_with_registry!(
            Opts::new("quorum_elections_started_total", "Candidates observed"),
            registry
        )
        .expect("failed to register elections_started counter");

        let elections_confirmed = register_int_counter_with_registry!(
            Opts::new("quorum_elections_confirmed_total", "Elections confirmed"),
            registry
        )
        .expect("failed to register elections_confirmed counter");

        let elections_staled = register_int_counter_with_registry!(
            Opts::new("quorum_elections_staled_total", "Candidates retired by timeout"),
            registry
        )
        .expect("failed to register elections_staled counter");

        let store_failures = register_int_counter_with_registry!(
            Opts::new("quorum_store_failures_total", "Confirmed transactions that failed to persist"),
            registry
        )
        .expect("failed to register store_failures counter");

        // Gauges
        let active_elections = register_int_gauge_with_registry!(
            Opts::new("quorum_active_elections", "Current number of open elections"),
            registry
        )
        .expect("failed to register active_elections gauge");

        let queue_size = register_int_gauge_with_registry!(
            Opts::new("quorum_vote_queue_size", "Votes waiting in the prioritizer queue"),
            registry
        )
        .expect("failed to register queue_size gauge");

        let buffered_groups = register_int_gauge_with_registry!(
            Opts::new("quorum_vote_buffer_groups", "Candidates with votes buffered"),
            registry
        )
        .expect("failed to register buffered_groups gauge");

        // Histograms – exponential buckets covering 10 ms → ~5 min.
        let confirmation_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "quorum_confirmation_latency_ms",
                "Confirmation latency in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(10.0, 2.0, 15).expect("valid buckets")),
            registry
        )
        .expect("failed to register confirmation_latency_ms histogram");

        Self {
            registry,
            votes_received,
            votes_dropped,
            votes_rejected,
            votes_cast,
            elections_started,
            elections_confirmed,
            elections_staled,
            store_failures,
            active_elections,
            queue_size,
            buffered_groups,
            confirmation_latency_ms,
        }
    }

    /// Encode every metric in the Prometheus text format.
    pub fn encode(&self) -> String {
        let mut buffer = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
            tracing::warn!(error = %e, "failed to encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
