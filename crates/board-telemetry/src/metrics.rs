//! Prometheus metrics for the board engine.
//!
//! All metrics follow the naming convention: `tl_<component>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // RECONCILIATION
    // =========================================================================

    /// Messages folded into a board graph (one per target board)
    pub static ref MESSAGES_INGESTED: Counter = Counter::new(
        "tl_board_messages_ingested_total",
        "Messages folded into a board graph, counted per target board"
    ).expect("metric creation failed");

    /// Re-delivered messages ignored as duplicates
    pub static ref DUPLICATES_IGNORED: Counter = Counter::new(
        "tl_board_duplicates_ignored_total",
        "Re-delivered messages ignored as duplicates"
    ).expect("metric creation failed");

    /// Ghost references created for missing parents
    pub static ref GHOSTS_CREATED: Counter = Counter::new(
        "tl_board_ghosts_created_total",
        "Ghost references created for missing parents"
    ).expect("metric creation failed");

    /// Ghost references filled by an arriving message
    pub static ref GHOSTS_RESOLVED: Counter = Counter::new(
        "tl_board_ghosts_resolved_total",
        "Ghost references filled by an arriving message"
    ).expect("metric creation failed");

    /// Absolute orphans adopted by an arriving thread root
    pub static ref ORPHANS_ADOPTED: Counter = Counter::new(
        "tl_board_orphans_adopted_total",
        "Absolute orphans adopted by an arriving thread root"
    ).expect("metric creation failed");

    /// Messages with a parent but no thread
    pub static ref INCONSISTENT_REFERENCES: Counter = Counter::new(
        "tl_board_inconsistent_references_total",
        "Messages carrying a parent reference but no thread reference"
    ).expect("metric creation failed");

    /// Time spent reconciling one message across all its boards
    pub static ref INGEST_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "tl_board_ingest_duration_seconds",
            "Time spent reconciling one message"
        ).buckets(exponential_buckets(0.00001, 2.0, 15).expect("valid buckets"))
    ).expect("metric creation failed");

    /// Boards currently tracked
    pub static ref BOARDS_TRACKED: Gauge = Gauge::new(
        "tl_board_boards_tracked",
        "Number of boards with a graph in memory"
    ).expect("metric creation failed");

    // =========================================================================
    // VALIDATION
    // =========================================================================

    /// Rejected messages and lists by kind
    pub static ref VALIDATION_REJECTIONS: CounterVec = CounterVec::new(
        Opts::new("tl_validation_rejections_total", "Rejected input by kind"),
        &["kind"]  // kind: message/message_list
    ).expect("metric creation failed");

    // =========================================================================
    // FETCH RETRY
    // =========================================================================

    /// Fetch failures by subject and reason
    pub static ref FETCH_FAILURES: CounterVec = CounterVec::new(
        Opts::new("tl_fetch_failures_total", "Fetch failures by subject and reason"),
        &["subject", "reason"]  // subject: message/message_list, reason: not_found/transient
    ).expect("metric creation failed");

    /// Live fetch-failed markers
    pub static ref FETCH_MARKERS: Gauge = Gauge::new(
        "tl_fetch_markers_pending",
        "Number of live fetch-failed markers"
    ).expect("metric creation failed");

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Identity deletion cascades executed
    pub static ref IDENTITY_DELETIONS: Counter = Counter::new(
        "tl_identity_deletions_total",
        "Identity deletion cascades executed"
    ).expect("metric creation failed");

    /// Bus lag incidents observed by the event router
    pub static ref EVENT_BUS_LAGGED: Counter = Counter::new(
        "tl_eventbus_lagged_total",
        "Times the event router fell behind the bus"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Reconciliation
        Box::new(MESSAGES_INGESTED.clone()),
        Box::new(DUPLICATES_IGNORED.clone()),
        Box::new(GHOSTS_CREATED.clone()),
        Box::new(GHOSTS_RESOLVED.clone()),
        Box::new(ORPHANS_ADOPTED.clone()),
        Box::new(INCONSISTENT_REFERENCES.clone()),
        Box::new(INGEST_DURATION.clone()),
        Box::new(BOARDS_TRACKED.clone()),
        // Validation
        Box::new(VALIDATION_REJECTIONS.clone()),
        // Fetch retry
        Box::new(FETCH_FAILURES.clone()),
        Box::new(FETCH_MARKERS.clone()),
        // Lifecycle
        Box::new(IDENTITY_DELETIONS.clone()),
        Box::new(EVENT_BUS_LAGGED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
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

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
