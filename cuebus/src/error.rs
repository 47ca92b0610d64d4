use thiserror::Error;

use crate::command::{JobId, JobKind, StudioId};
use crate::fanout::FanoutReport;

/// Errors raised by the dispatch core and the admin operations on top of it.
///
/// Resolution and admission failures are synchronous: they surface from
/// `submit` before any job runs. Execution failures are asynchronous: they
/// surface only when a caller awaits a [`crate::JobHandle`]'s completion.
/// The two channels are never conflated.
#[derive(Debug, Error)]
pub enum JobError {
    /// The studio id has no registered worker.
    #[error("studio \"{0}\" has no registered worker")]
    UnknownStudio(StudioId),

    /// A referenced domain entity does not exist. Raised before any job is
    /// submitted.
    #[error("{entity} \"{id}\" not found")]
    NotFound { entity: &'static str, id: String },

    /// Admission into a worker's queue failed (queue closed or unavailable).
    /// Distinct from the job running and failing.
    #[error("failed to admit {kind} job for studio \"{studio_id}\": {reason}")]
    Admission {
        studio_id: StudioId,
        kind: JobKind,
        reason: String,
    },

    /// The job ran and failed. Carried by the handle's terminal state.
    #[error("{kind} job {job_id} failed on studio \"{studio_id}\": {cause}")]
    Execution {
        studio_id: StudioId,
        kind: JobKind,
        job_id: JobId,
        cause: String,
    },

    /// One or more studios failed during a broadcast. The report carries
    /// every per-studio outcome, successes included.
    #[error("broadcast of {kind} failed on {failed} of {total} studios")]
    Broadcast {
        kind: JobKind,
        failed: usize,
        total: usize,
        report: FanoutReport,
    },

    /// A storage collaborator failed while resolving or mutating domain
    /// state.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl JobError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
