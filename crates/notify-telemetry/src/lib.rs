//! # Notify Telemetry
//!
//! Structured logging (`tracing` + `tracing-subscriber`) and Prometheus
//! metrics for the notification engine.
//!
//! Modeled on the teacher workspace's `quantum-telemetry`, trimmed of its
//! OpenTelemetry exporter and cross-process trace-context propagation —
//! this engine runs as a single instance with no peer nodes to correlate
//! spans against (see DESIGN.md).

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use metrics::Metrics;

/// Initialize logging and build the metrics registry in one call. The
/// common entrypoint for `notify-engine::main`.
pub fn init(config: &TelemetryConfig) -> Metrics {
    logging::init(config);
    Metrics::new()
}
