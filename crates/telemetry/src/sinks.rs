//! Abstract metrics sinks. Every producing crate (`gtos-storage`,
//! `gtos-consensus`, `gtos-execution`, `gtos-uno`) instruments against one
//! of these traits rather than the `prometheus` crate directly, so a node
//! built without telemetry wiring falls back to [`NopSink`] at zero cost.

/// Storage-layer counters: epoch pruning, node GC, write volume.
pub trait StorageMetricsSink: Send + Sync {
    /// A sealed epoch was dropped wholesale during retention GC.
    fn inc_epochs_dropped(&self, count: u64);
    /// Individual state-tree nodes were garbage collected.
    fn inc_nodes_deleted(&self, count: u64);
    /// Bytes written to the backend for newly introduced nodes.
    fn inc_bytes_written_total(&self, bytes: u64);
    /// Current estimated on-disk size of the backend.
    fn set_disk_usage_bytes(&self, bytes: u64);
    /// Current total reference count tracked across all live nodes.
    fn set_total_ref_counts(&self, count: u64);
}

/// Consensus-layer counters: block production, slot misses, verification cost.
pub trait ConsensusMetricsSink: Send + Sync {
    /// This node sealed and broadcast a block.
    fn inc_blocks_produced(&self);
    /// A slot elapsed with no block observed for it (in-turn miss or skip).
    fn inc_slots_missed(&self);
    /// A header failed verification and was rejected.
    fn inc_headers_rejected(&self, reason: &'static str);
    /// Duration of one header-verification pass.
    fn observe_verify_duration(&self, duration_secs: f64);
}

/// Parallel-executor counters: conflict analysis and lane scheduling cost.
pub trait ExecutionMetricsSink: Send + Sync {
    /// Number of dependency levels the conflict analyser produced for a block.
    fn observe_levels_per_block(&self, levels: f64);
    /// Number of lanes scheduled within a single dependency level.
    fn observe_lanes_per_level(&self, lanes: f64);
    /// A read/write conflict was detected between two transactions.
    fn inc_conflicts_detected(&self);
    /// Duration of a full block apply (all levels, all lanes).
    fn observe_apply_duration(&self, duration_secs: f64);
}

/// UNO-subsystem counters: proof verification outcomes.
pub trait UnoMetricsSink: Send + Sync {
    /// A shield/transfer/unshield proof bundle verified successfully.
    fn inc_proofs_verified(&self, action: &'static str);
    /// A proof bundle failed verification.
    fn inc_proofs_failed(&self, action: &'static str, reason: &'static str);
}

/// Cross-cutting error counters, categorized by the `GtosError` taxonomy.
pub trait ErrorMetricsSink: Send + Sync {
    /// An error of `kind` (validation/execution/consensus) and `variant`
    /// (its RPC-visible code) was raised.
    fn inc_error(&self, kind: &'static str, variant: &'static str);
}

/// The union of every sink this crate provides, handed out as one static
/// reference so callers don't need to pick trait objects individually.
pub trait MetricsSink:
    StorageMetricsSink + ConsensusMetricsSink + ExecutionMetricsSink + UnoMetricsSink + ErrorMetricsSink
{
}

impl<T> MetricsSink for T where
    T: StorageMetricsSink
        + ConsensusMetricsSink
        + ExecutionMetricsSink
        + UnoMetricsSink
        + ErrorMetricsSink
{
}

/// A sink that discards every observation. Used when no metrics backend
/// has been installed, so instrumentation call sites never need to guard
/// on `Option`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopSink;

impl StorageMetricsSink for NopSink {
    fn inc_epochs_dropped(&self, _count: u64) {}
    fn inc_nodes_deleted(&self, _count: u64) {}
    fn inc_bytes_written_total(&self, _bytes: u64) {}
    fn set_disk_usage_bytes(&self, _bytes: u64) {}
    fn set_total_ref_counts(&self, _count: u64) {}
}

impl ConsensusMetricsSink for NopSink {
    fn inc_blocks_produced(&self) {}
    fn inc_slots_missed(&self) {}
    fn inc_headers_rejected(&self, _reason: &'static str) {}
    fn observe_verify_duration(&self, _duration_secs: f64) {}
}

impl ExecutionMetricsSink for NopSink {
    fn observe_levels_per_block(&self, _levels: f64) {}
    fn observe_lanes_per_level(&self, _lanes: f64) {}
    fn inc_conflicts_detected(&self) {}
    fn observe_apply_duration(&self, _duration_secs: f64) {}
}

impl UnoMetricsSink for NopSink {
    fn inc_proofs_verified(&self, _action: &'static str) {}
    fn inc_proofs_failed(&self, _action: &'static str, _reason: &'static str) {}
}

impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str, _variant: &'static str) {}
}

static NOP_SINK: NopSink = NopSink;
static SINK: once_cell::sync::OnceCell<&'static dyn MetricsSink> = once_cell::sync::OnceCell::new();

/// Installs the global metrics sink. Called once at node startup by
/// [`crate::prometheus::install`]; a no-op if called more than once.
pub fn set_sink(sink: &'static dyn MetricsSink) {
    let _ = SINK.set(sink);
}

/// The installed metrics sink, or [`NopSink`] if none has been installed.
pub fn metrics() -> &'static dyn MetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Convenience accessor for error instrumentation, used throughout the
/// error-conversion paths in each crate's `error` module.
pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    metrics()
}
