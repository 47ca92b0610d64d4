use std::sync::Arc;

use tracing::Instrument;

use crate::command::{StudioId, StudioJob};
use crate::error::JobError;
use crate::fanout::{FanoutCoordinator, FanoutReport};
use crate::handle::JobHandle;
use crate::registry::WorkerRegistry;
use crate::telemetry;

/// Front door for job submission.
///
/// Resolves the target studio's worker through the registry and admits the
/// job into its queue. Submission is synchronous: by the time `submit`
/// returns a handle, the job occupies a queue slot, though it has not
/// necessarily started. Cheap to clone; clones share the registry.
#[derive(Clone, Debug)]
pub struct JobDispatcher {
    registry: Arc<WorkerRegistry>,
}

impl JobDispatcher {
    pub fn new(registry: Arc<WorkerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    /// Submit one job to one studio.
    ///
    /// Fails with [`JobError::UnknownStudio`] for unregistered ids and
    /// [`JobError::Admission`] when the worker cannot accept the job. An
    /// `Ok` return says nothing about the job's eventual outcome; that is
    /// the handle's business.
    pub async fn submit(
        &self,
        studio_id: &StudioId,
        job: StudioJob,
    ) -> Result<JobHandle, JobError> {
        let kind = job.kind();
        let span = telemetry::job_submit_span(studio_id.as_str(), kind.as_str());
        async {
            let worker = self.registry.resolve(studio_id).await?;
            let handle = worker.admit(job, self.registry.events())?;
            telemetry::record_job_submitted(studio_id.as_str(), kind.as_str());
            tracing::debug!(job_id = %handle.job_id(), "job admitted");
            Ok(handle)
        }
        .instrument(span)
        .await
    }

    /// Submit the same job to every listed studio and await all outcomes.
    ///
    /// See [`FanoutCoordinator::broadcast`] for the aggregation contract.
    pub async fn submit_all(
        &self,
        studios: &[StudioId],
        job: StudioJob,
    ) -> FanoutReport {
        FanoutCoordinator::new(self.clone()).broadcast(studios, job).await
    }
}
