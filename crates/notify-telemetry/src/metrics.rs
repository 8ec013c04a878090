//! Process-wide Prometheus metrics.
//!
//! A single [`Metrics`] instance is built once in `notify-engine::service`
//! and cloned (it is `Arc`-backed internally by `prometheus`'s collectors)
//! into the block processor, the subscription index, and the dispatch
//! fabric.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Histogram buckets for block-processing latency, in seconds. Skewed
/// towards the sub-second range; a block that takes multiple seconds to
/// process is already a problem worth a distinct bucket.
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Handle to every metric the engine emits.
#[derive(Clone)]
pub struct Metrics {
    pub blocks_processed_total: IntCounter,
    pub block_process_duration_seconds: Histogram,
    pub events_mined_total: IntCounterVec,
    pub notifications_dispatched_total: IntCounterVec,
    pub notifications_failed_total: IntCounterVec,
    pub subscription_index_owners: IntGauge,
    pub checkpoint_block_number: IntGauge,
}

impl Metrics {
    /// Register every collector with the process-wide registry. Panics on
    /// a duplicate registration, which can only happen if `new()` is called
    /// twice — a programmer error, not a runtime condition.
    pub fn new() -> Self {
        let blocks_processed_total = IntCounter::new(
            "notify_blocks_processed_total",
            "Blocks the engine has finished processing",
        )
        .unwrap();

        let block_process_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "notify_block_process_duration_seconds",
                "Time spent processing a single block end to end",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
        )
        .unwrap();

        let events_mined_total = IntCounterVec::new(
            Opts::new("notify_events_mined_total", "Events mined from operations"),
            &["event_kind"],
        )
        .unwrap();

        let notifications_dispatched_total = IntCounterVec::new(
            Opts::new(
                "notify_notifications_dispatched_total",
                "Notifications successfully handed to a notifier adapter",
            ),
            &["notifier_kind"],
        )
        .unwrap();

        let notifications_failed_total = IntCounterVec::new(
            Opts::new(
                "notify_notifications_failed_total",
                "Notifications a notifier adapter failed to deliver",
            ),
            &["notifier_kind"],
        )
        .unwrap();

        let subscription_index_owners = IntGauge::new(
            "notify_subscription_index_owners",
            "Distinct owner ids present in the subscription index",
        )
        .unwrap();

        let checkpoint_block_number = IntGauge::new(
            "notify_checkpoint_block_number",
            "nextBlockNum recorded in the last saved checkpoint",
        )
        .unwrap();

        REGISTRY
            .register(Box::new(blocks_processed_total.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(block_process_duration_seconds.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(events_mined_total.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(notifications_dispatched_total.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(notifications_failed_total.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(subscription_index_owners.clone()))
            .unwrap();
        REGISTRY
            .register(Box::new(checkpoint_block_number.clone()))
            .unwrap();

        Self {
            blocks_processed_total,
            block_process_duration_seconds,
            events_mined_total,
            notifications_dispatched_total,
            notifications_failed_total,
            subscription_index_owners,
            checkpoint_block_number,
        }
    }

    /// Render the current state of every collector in Prometheus text
    /// exposition format, for the `/metrics` endpoint.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let metric_families = REGISTRY.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus text encoding is always valid utf-8"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_metric_names() {
        let metrics = Metrics::new();
        metrics.blocks_processed_total.inc();
        let rendered = metrics.render().unwrap();
        assert!(rendered.contains("notify_blocks_processed_total"));
    }
}
