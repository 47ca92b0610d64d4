//! Prometheus metrics instrumentation for cuebus.
//!
//! All metrics are conditionally compiled behind the `metrics` feature flag.
//!
//! # Metrics
//!
//! ## Counters
//! - `cuebus_jobs_submitted_total` - Total jobs admitted into studio queues
//! - `cuebus_jobs_completed_total` - Total jobs reaching a terminal state
//!
//! ## Gauges
//! - `cuebus_queue_depth` - Jobs admitted but not yet started, per studio
//!
//! ## Histograms
//! - `cuebus_job_duration_seconds` - Job execution duration in seconds
#![cfg(feature = "metrics")]

use prometheus::{exponential_buckets, CounterVec, GaugeVec, HistogramVec, Opts, Registry};
use std::sync::LazyLock;

/// Global Prometheus registry for cuebus metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Counter for total jobs admitted.
///
/// Labels:
/// - `studio_id`: The target studio
/// - `job_kind`: The job kind
pub static JOBS_SUBMITTED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        "cuebus_jobs_submitted_total",
        "Total number of jobs admitted into studio queues",
    );
    CounterVec::new(opts, &["studio_id", "job_kind"])
        .expect("cuebus_jobs_submitted_total metric creation failed")
});

/// Counter for total jobs reaching a terminal state.
///
/// Labels:
/// - `studio_id`: The target studio
/// - `job_kind`: The job kind
/// - `status`: The terminal status (success, failed)
pub static JOBS_COMPLETED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        "cuebus_jobs_completed_total",
        "Total number of jobs reaching a terminal state",
    );
    CounterVec::new(opts, &["studio_id", "job_kind", "status"])
        .expect("cuebus_jobs_completed_total metric creation failed")
});

/// Gauge for jobs admitted but not yet started, per studio.
///
/// Labels:
/// - `studio_id`: The studio whose queue is measured
pub static QUEUE_DEPTH: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        "cuebus_queue_depth",
        "Jobs admitted but not yet started, per studio",
    );
    GaugeVec::new(opts, &["studio_id"])
        .expect("cuebus_queue_depth metric creation failed")
});

/// Histogram for job execution duration in seconds.
///
/// Labels:
/// - `studio_id`: The target studio
/// - `job_kind`: The job kind
/// - `status`: The terminal status (success, failed)
pub static JOB_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let buckets = exponential_buckets(0.001, 2.0, 15).expect("bucket creation failed");
    let opts = prometheus::HistogramOpts::new(
        "cuebus_job_duration_seconds",
        "Job execution duration in seconds",
    )
    .buckets(buckets);
    HistogramVec::new(opts, &["studio_id", "job_kind", "status"])
        .expect("cuebus_job_duration_seconds metric creation failed")
});

/// Initialize all metrics by registering them with the global registry.
///
/// Idempotent - calling it multiple times is safe.
pub fn init_metrics() -> anyhow::Result<()> {
    let registry = &*REGISTRY;

    for metric in [
        Box::new(JOBS_SUBMITTED_TOTAL.clone()) as Box<dyn prometheus::core::Collector>,
        Box::new(JOBS_COMPLETED_TOTAL.clone()),
        Box::new(QUEUE_DEPTH.clone()),
        Box::new(JOB_DURATION_SECONDS.clone()),
    ] {
        if let Err(e) = registry.register(metric) {
            let msg = e.to_string();
            if !msg.contains("Duplicate metrics collector registration attempted") {
                return Err(e.into());
            }
        }
    }

    Ok(())
}

/// Helper to record a job admission event.
pub fn record_job_submitted(studio_id: &str, job_kind: &str) {
    JOBS_SUBMITTED_TOTAL
        .with_label_values(&[studio_id, job_kind])
        .inc();
}

/// Helper to record a job completion event.
pub fn record_job_completed(studio_id: &str, job_kind: &str, status: &str) {
    JOBS_COMPLETED_TOTAL
        .with_label_values(&[studio_id, job_kind, status])
        .inc();
}

/// Helper to update the queue depth gauge.
pub fn set_queue_depth(studio_id: &str, depth: f64) {
    QUEUE_DEPTH.with_label_values(&[studio_id]).set(depth);
}

/// Helper to observe job duration.
pub fn observe_job_duration(studio_id: &str, job_kind: &str, status: &str, duration_secs: f64) {
    JOB_DURATION_SECONDS
        .with_label_values(&[studio_id, job_kind, status])
        .observe(duration_secs);
}

/// Gather all registered metrics in Prometheus text format.
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder
        .encode_to_string(&metric_families)
        .map_err(Into::into)
}
