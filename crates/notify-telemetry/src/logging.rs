//! Tracing-subscriber initialization.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::TelemetryConfig;

/// Install the global tracing subscriber for the process.
///
/// Call once, as early as possible in `main`. A second call (e.g. in a test
/// binary that also links the engine) is a silent no-op rather than a panic.
pub fn init(config: &TelemetryConfig) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true);

    let installed = if config.json_logs {
        registry.json().try_init()
    } else {
        registry.try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed, skipping");
    }
}
