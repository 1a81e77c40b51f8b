//! Concrete [`crate::sinks`] implementation backed by the `prometheus` crate.

use crate::sinks::*;
use once_cell::sync::OnceCell;
use prometheus::{
    exponential_buckets, register_gauge, register_histogram, register_int_counter,
    register_int_counter_vec, Gauge, Histogram, IntCounter, IntCounterVec,
};

static STORAGE_DISK_USAGE_BYTES: OnceCell<Gauge> = OnceCell::new();
static STORAGE_REF_COUNTS: OnceCell<Gauge> = OnceCell::new();
static STORAGE_EPOCHS_DROPPED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static STORAGE_NODES_DELETED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static STORAGE_BYTES_WRITTEN_TOTAL: OnceCell<IntCounter> = OnceCell::new();

static CONSENSUS_BLOCKS_PRODUCED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static CONSENSUS_SLOTS_MISSED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static CONSENSUS_HEADERS_REJECTED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static CONSENSUS_VERIFY_DURATION_SECONDS: OnceCell<Histogram> = OnceCell::new();

static EXECUTION_LEVELS_PER_BLOCK: OnceCell<Histogram> = OnceCell::new();
static EXECUTION_LANES_PER_LEVEL: OnceCell<Histogram> = OnceCell::new();
static EXECUTION_CONFLICTS_DETECTED_TOTAL: OnceCell<IntCounter> = OnceCell::new();
static EXECUTION_APPLY_DURATION_SECONDS: OnceCell<Histogram> = OnceCell::new();

static UNO_PROOFS_VERIFIED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();
static UNO_PROOFS_FAILED_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

static ERRORS_TOTAL: OnceCell<IntCounterVec> = OnceCell::new();

/// Metrics sink instrumented via globally registered Prometheus collectors.
#[derive(Debug, Clone, Copy)]
pub struct PrometheusSink;

macro_rules! get_metric {
    ($metric:ident) => {
        $metric
            .get()
            .expect("prometheus sink not initialized: call telemetry::prometheus::install() first")
    };
}

impl StorageMetricsSink for PrometheusSink {
    fn inc_epochs_dropped(&self, count: u64) {
        get_metric!(STORAGE_EPOCHS_DROPPED_TOTAL).inc_by(count);
    }
    fn inc_nodes_deleted(&self, count: u64) {
        get_metric!(STORAGE_NODES_DELETED_TOTAL).inc_by(count);
    }
    fn inc_bytes_written_total(&self, bytes: u64) {
        get_metric!(STORAGE_BYTES_WRITTEN_TOTAL).inc_by(bytes);
    }
    fn set_disk_usage_bytes(&self, bytes: u64) {
        get_metric!(STORAGE_DISK_USAGE_BYTES).set(bytes as f64);
    }
    fn set_total_ref_counts(&self, count: u64) {
        get_metric!(STORAGE_REF_COUNTS).set(count as f64);
    }
}

impl ConsensusMetricsSink for PrometheusSink {
    fn inc_blocks_produced(&self) {
        get_metric!(CONSENSUS_BLOCKS_PRODUCED_TOTAL).inc();
    }
    fn inc_slots_missed(&self) {
        get_metric!(CONSENSUS_SLOTS_MISSED_TOTAL).inc();
    }
    fn inc_headers_rejected(&self, reason: &'static str) {
        get_metric!(CONSENSUS_HEADERS_REJECTED_TOTAL)
            .with_label_values(&[reason])
            .inc();
    }
    fn observe_verify_duration(&self, duration_secs: f64) {
        get_metric!(CONSENSUS_VERIFY_DURATION_SECONDS).observe(duration_secs);
    }
}

impl ExecutionMetricsSink for PrometheusSink {
    fn observe_levels_per_block(&self, levels: f64) {
        get_metric!(EXECUTION_LEVELS_PER_BLOCK).observe(levels);
    }
    fn observe_lanes_per_level(&self, lanes: f64) {
        get_metric!(EXECUTION_LANES_PER_LEVEL).observe(lanes);
    }
    fn inc_conflicts_detected(&self) {
        get_metric!(EXECUTION_CONFLICTS_DETECTED_TOTAL).inc();
    }
    fn observe_apply_duration(&self, duration_secs: f64) {
        get_metric!(EXECUTION_APPLY_DURATION_SECONDS).observe(duration_secs);
    }
}

impl UnoMetricsSink for PrometheusSink {
    fn inc_proofs_verified(&self, action: &'static str) {
        get_metric!(UNO_PROOFS_VERIFIED_TOTAL)
            .with_label_values(&[action])
            .inc();
    }
    fn inc_proofs_failed(&self, action: &'static str, reason: &'static str) {
        get_metric!(UNO_PROOFS_FAILED_TOTAL)
            .with_label_values(&[action, reason])
            .inc();
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str, variant: &'static str) {
        get_metric!(ERRORS_TOTAL).with_label_values(&[kind, variant]).inc();
    }
}

/// Registers every collector and installs the resulting sink as the
/// process-global metrics target. Must be called at most once; a second
/// call returns an error from the underlying registry.
#[allow(clippy::expect_used)]
pub fn install() -> Result<&'static dyn MetricsSink, prometheus::Error> {
    STORAGE_DISK_USAGE_BYTES
        .set(register_gauge!(
            "gtos_storage_disk_usage_bytes",
            "Estimated total disk usage for the storage backend."
        )?)
        .expect("static already initialized");
    STORAGE_REF_COUNTS
        .set(register_gauge!(
            "gtos_storage_ref_counts",
            "Total number of reference counts tracked for GC."
        )?)
        .expect("static already initialized");
    STORAGE_EPOCHS_DROPPED_TOTAL
        .set(register_int_counter!(
            "gtos_storage_epochs_dropped_total",
            "Total number of sealed epochs dropped by retention GC."
        )?)
        .expect("static already initialized");
    STORAGE_NODES_DELETED_TOTAL
        .set(register_int_counter!(
            "gtos_storage_nodes_deleted_total",
            "Total number of state tree nodes deleted by GC."
        )?)
        .expect("static already initialized");
    STORAGE_BYTES_WRITTEN_TOTAL
        .set(register_int_counter!(
            "gtos_storage_bytes_written_total",
            "Total bytes written to the storage backend for new nodes."
        )?)
        .expect("static already initialized");

    CONSENSUS_BLOCKS_PRODUCED_TOTAL
        .set(register_int_counter!(
            "gtos_consensus_blocks_produced_total",
            "Total number of blocks sealed by this node."
        )?)
        .expect("static already initialized");
    CONSENSUS_SLOTS_MISSED_TOTAL
        .set(register_int_counter!(
            "gtos_consensus_slots_missed_total",
            "Total number of slots that elapsed with no observed block."
        )?)
        .expect("static already initialized");
    CONSENSUS_HEADERS_REJECTED_TOTAL
        .set(register_int_counter_vec!(
            "gtos_consensus_headers_rejected_total",
            "Total headers rejected during verification, by reason.",
            &["reason"]
        )?)
        .expect("static already initialized");
    CONSENSUS_VERIFY_DURATION_SECONDS
        .set(register_histogram!(
            "gtos_consensus_verify_duration_seconds",
            "Latency of a single header verification pass.",
            exponential_buckets(0.0005, 2.0, 15)?
        )?)
        .expect("static already initialized");

    EXECUTION_LEVELS_PER_BLOCK
        .set(register_histogram!(
            "gtos_execution_levels_per_block",
            "Number of dependency levels produced by conflict analysis per block.",
            exponential_buckets(1.0, 2.0, 10)?
        )?)
        .expect("static already initialized");
    EXECUTION_LANES_PER_LEVEL
        .set(register_histogram!(
            "gtos_execution_lanes_per_level",
            "Number of parallel lanes scheduled within a dependency level.",
            exponential_buckets(1.0, 2.0, 10)?
        )?)
        .expect("static already initialized");
    EXECUTION_CONFLICTS_DETECTED_TOTAL
        .set(register_int_counter!(
            "gtos_execution_conflicts_detected_total",
            "Total read/write conflicts detected between transactions."
        )?)
        .expect("static already initialized");
    EXECUTION_APPLY_DURATION_SECONDS
        .set(register_histogram!(
            "gtos_execution_apply_duration_seconds",
            "Latency of a full block apply across all levels and lanes.",
            exponential_buckets(0.001, 2.0, 15)?
        )?)
        .expect("static already initialized");

    UNO_PROOFS_VERIFIED_TOTAL
        .set(register_int_counter_vec!(
            "gtos_uno_proofs_verified_total",
            "Total UNO proof bundles that verified successfully, by action.",
            &["action"]
        )?)
        .expect("static already initialized");
    UNO_PROOFS_FAILED_TOTAL
        .set(register_int_counter_vec!(
            "gtos_uno_proofs_failed_total",
            "Total UNO proof bundles that failed verification, by action and reason.",
            &["action", "reason"]
        )?)
        .expect("static already initialized");

    ERRORS_TOTAL
        .set(register_int_counter_vec!(
            "gtos_errors_total",
            "Total number of errors, categorized by kind and variant.",
            &["kind", "variant"]
        )?)
        .expect("static already initialized");

    static SINK: PrometheusSink = PrometheusSink;
    crate::sinks::set_sink(&SINK);
    Ok(&SINK)
}
