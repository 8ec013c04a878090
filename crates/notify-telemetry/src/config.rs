//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for the engine's logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line.
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error), or a full
    /// `tracing_subscriber::EnvFilter` directive string.
    pub log_level: String,

    /// Emit JSON-formatted logs instead of human-readable ones.
    pub json_logs: bool,

    /// Port the Prometheus `/metrics` exporter binds to.
    pub metrics_port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "notify-engine".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            metrics_port: 9100,
        }
    }
}

impl TelemetryConfig {
    /// Build configuration from environment variables.
    ///
    /// - `NOTIFY_LOG_LEVEL` or `RUST_LOG`: filter directive (default: info)
    /// - `NOTIFY_JSON_LOGS`: emit JSON logs (default: true inside a
    ///   container, false otherwise)
    /// - `NOTIFY_METRICS_PORT`: Prometheus exporter port (default: 9100)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("NOTIFY_SERVICE_NAME")
                .unwrap_or_else(|_| "notify-engine".to_string()),

            log_level: env::var("NOTIFY_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("NOTIFY_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            metrics_port: env::var("NOTIFY_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "notify-engine");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.metrics_port, 9100);
    }
}
