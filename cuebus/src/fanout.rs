use futures::future::join_all;
use tracing::Instrument;

use crate::command::{JobKind, StudioId, StudioJob};
use crate::dispatcher::JobDispatcher;
use crate::error::JobError;
use crate::handle::JobTimings;
use crate::telemetry;

/// Outcome of one studio's leg of a broadcast.
#[derive(Debug)]
pub struct StudioOutcome {
    pub studio_id: StudioId,
    pub result: Result<JobTimings, JobError>,
}

impl StudioOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Aggregated result of a broadcast, one outcome per target studio.
///
/// Outcomes appear in the same order as the studios passed to
/// [`FanoutCoordinator::broadcast`], and every target is accounted for
/// whether its leg succeeded or failed.
#[derive(Debug)]
pub struct FanoutReport {
    kind: JobKind,
    outcomes: Vec<StudioOutcome>,
}

impl FanoutReport {
    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn outcomes(&self) -> &[StudioOutcome] {
        &self.outcomes
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(StudioOutcome::is_success)
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_success()).count()
    }

    /// Studios whose leg succeeded, with their timing records.
    pub fn successes(&self) -> impl Iterator<Item = (&StudioId, &JobTimings)> {
        self.outcomes.iter().filter_map(|o| {
            o.result.as_ref().ok().map(|timings| (&o.studio_id, timings))
        })
    }

    /// Studios whose leg failed, with the error.
    pub fn failures(&self) -> impl Iterator<Item = (&StudioId, &JobError)> {
        self.outcomes.iter().filter_map(|o| {
            o.result.as_ref().err().map(|err| (&o.studio_id, err))
        })
    }

    /// Collapse the report into a single result: `Ok` when every leg
    /// succeeded, otherwise [`JobError::Broadcast`] carrying the full
    /// report.
    pub fn into_result(self) -> Result<Self, JobError> {
        if self.succeeded() {
            return Ok(self);
        }
        Err(JobError::Broadcast {
            kind: self.kind,
            failed: self.failed_count(),
            total: self.total(),
            report: self,
        })
    }
}

/// Fans one job out to many studios and gathers every outcome.
///
/// One studio's failure never short-circuits the others: all legs are
/// awaited to their terminal state before the report is assembled.
#[derive(Clone, Debug)]
pub struct FanoutCoordinator {
    dispatcher: JobDispatcher,
}

impl FanoutCoordinator {
    pub fn new(dispatcher: JobDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Submit `job` to every studio in `studios` and await all completions.
    ///
    /// Submission failures (unknown studio, admission refused) become that
    /// studio's outcome without disturbing the other legs. The call
    /// resolves only once the slowest leg has finished.
    pub async fn broadcast(
        &self,
        studios: &[StudioId],
        job: StudioJob,
    ) -> FanoutReport {
        let kind = job.kind();
        let span = telemetry::broadcast_span(kind.as_str(), studios.len());

        async {
            // Submit phase: admit on every studio before awaiting any
            // completion, so the legs run concurrently.
            let mut submitted = Vec::with_capacity(studios.len());
            for studio_id in studios {
                let attempt =
                    self.dispatcher.submit(studio_id, job.clone()).await;
                submitted.push((studio_id.clone(), attempt));
            }

            let legs = submitted.into_iter().map(|(studio_id, attempt)| {
                async move {
                    let result = match attempt {
                        Ok(mut handle) => match handle.completion().await {
                            Ok(()) => handle.timings().ok_or_else(|| {
                                JobError::Execution {
                                    studio_id: studio_id.clone(),
                                    kind,
                                    job_id: handle.job_id(),
                                    cause: "timing record missing after \
                                            completion"
                                        .to_string(),
                                }
                            }),
                            Err(err) => Err(err),
                        },
                        Err(err) => Err(err),
                    };
                    StudioOutcome { studio_id, result }
                }
            });
            let outcomes = join_all(legs).await;

            let report = FanoutReport { kind, outcomes };
            if report.succeeded() {
                tracing::debug!(
                    kind = %kind,
                    studios = report.total(),
                    "broadcast complete"
                );
            } else {
                tracing::warn!(
                    kind = %kind,
                    failed = report.failed_count(),
                    total = report.total(),
                    "broadcast finished with failures"
                );
            }
            report
        }
        .instrument(span)
        .await
    }
}
