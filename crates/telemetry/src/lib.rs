#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # GTOS Kernel Telemetry
//!
//! Structured logging initialization and in-process metrics
//! instrumentation, shared by every GTOS crate. Exporting these metrics
//! over HTTP is outside this crate's scope (the node's RPC/metrics
//! exporter surface is assembled by its operators); this crate only
//! registers and updates the collectors.

/// The initialization routine for global structured logging.
pub mod init;
/// The concrete implementation of metrics sinks using the `prometheus` crate.
pub mod prometheus;
/// Abstract traits (`*MetricsSink`) that define the contract for metrics reporting.
pub mod sinks;
/// A simple RAII timer for measuring the duration of a scope.
pub mod time;

pub use sinks::{error_metrics, metrics};
