//! Tracing and telemetry instrumentation for cuebus.
//!
//! Helper functions for creating tracing spans and recording metrics around
//! the job lifecycle: submission, execution, broadcast. All functions work
//! both with and without the `metrics` feature flag; when it is disabled the
//! Prometheus half is a no-op and only the tracing events remain.

use tracing::{info_span, Span};

/// Create a tracing span for job submission.
///
/// The span carries the target studio and job kind as fields.
#[must_use]
pub fn job_submit_span(studio_id: impl AsRef<str>, kind: impl AsRef<str>) -> Span {
    info_span!(
        "cuebus.submit",
        studio_id = %studio_id.as_ref(),
        job_kind = %kind.as_ref(),
    )
}

/// Create a tracing span for job execution inside a studio worker.
#[must_use]
pub fn job_execute_span(job_id: impl AsRef<str>, kind: impl AsRef<str>) -> Span {
    info_span!(
        "cuebus.execute",
        job_id = %job_id.as_ref(),
        job_kind = %kind.as_ref(),
    )
}

/// Create a tracing span for a broadcast across studios.
#[must_use]
pub fn broadcast_span(kind: impl AsRef<str>, studios: usize) -> Span {
    info_span!(
        "cuebus.broadcast",
        job_kind = %kind.as_ref(),
        studios = studios,
    )
}

/// Record a job admission event.
pub fn record_job_submitted(studio_id: impl AsRef<str>, job_kind: impl AsRef<str>) {
    tracing::info!(
        studio_id = %studio_id.as_ref(),
        job_kind = %job_kind.as_ref(),
        "job submitted"
    );

    #[cfg(feature = "metrics")]
    crate::metrics::record_job_submitted(studio_id.as_ref(), job_kind.as_ref());
}

/// Record a job reaching a terminal state.
pub fn record_job_completed(
    studio_id: impl AsRef<str>,
    job_kind: impl AsRef<str>,
    status: impl AsRef<str>,
) {
    tracing::info!(
        studio_id = %studio_id.as_ref(),
        job_kind = %job_kind.as_ref(),
        status = %status.as_ref(),
        "job completed"
    );

    #[cfg(feature = "metrics")]
    crate::metrics::record_job_completed(
        studio_id.as_ref(),
        job_kind.as_ref(),
        status.as_ref(),
    );
}

/// Observe the execution duration of a finished job.
pub fn observe_job_duration(
    studio_id: impl AsRef<str>,
    job_kind: impl AsRef<str>,
    status: impl AsRef<str>,
    duration_secs: f64,
) {
    tracing::debug!(
        studio_id = %studio_id.as_ref(),
        job_kind = %job_kind.as_ref(),
        status = %status.as_ref(),
        duration_secs = duration_secs,
        "job duration observed"
    );

    #[cfg(feature = "metrics")]
    crate::metrics::observe_job_duration(
        studio_id.as_ref(),
        job_kind.as_ref(),
        status.as_ref(),
        duration_secs,
    );
}

/// Update the queue depth gauge for one studio worker.
pub fn set_queue_depth(studio_id: impl AsRef<str>, depth: usize) {
    tracing::trace!(
        studio_id = %studio_id.as_ref(),
        depth = depth,
        "queue depth updated"
    );

    #[cfg(feature = "metrics")]
    crate::metrics::set_queue_depth(studio_id.as_ref(), depth as f64);
}
