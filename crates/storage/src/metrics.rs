//! Local accessor for the process-global storage metrics sink.

pub use gtos_telemetry::sinks::metrics;
