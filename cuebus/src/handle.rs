use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::command::{JobId, JobKind, StudioId};
use crate::error::JobError;

/// Lifecycle state of a submitted job.
///
/// Transitions are driven exclusively by the studio worker:
/// `Pending -> Running -> Succeeded | Failed`. A job reaches exactly one
/// terminal state, exactly once.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum JobState {
    /// Admitted into the worker's queue, not yet started.
    Pending,
    /// The worker has begun executing the job.
    Running,
    /// The job ran to completion.
    Succeeded,
    /// The job ran and failed.
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed)
    }
}

/// Timing record for a finished job.
///
/// Available strictly after the terminal state; once available it never
/// changes, so repeated queries return the same record.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct JobTimings {
    /// When the job was admitted into the worker's queue.
    pub queued_at: DateTime<Utc>,
    /// When the worker began executing the job.
    pub started_at: DateTime<Utc>,
    /// When the job reached its terminal state.
    pub finished_at: DateTime<Utc>,
}

impl JobTimings {
    /// Total time from admission to terminal state.
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.queued_at
    }

    /// Time spent executing, excluding queue wait.
    pub fn execution(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Progress snapshot published by the worker over the handle's channel.
#[derive(Clone, Debug)]
pub(crate) struct JobProgress {
    pub state: JobState,
    pub queued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl JobProgress {
    pub(crate) fn queued() -> Self {
        Self {
            state: JobState::Pending,
            queued_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }
}

/// Handle to one submitted job, created the moment the job is admitted.
///
/// The handle is owned by the caller that submitted the job. Awaiting
/// [`JobHandle::completion`] suspends until the worker drives the job to a
/// terminal state; once terminal it resolves immediately on every later
/// call. The handle has no way to force a transition or cancel the job;
/// an admitted job runs to its own natural terminal state. A timeout
/// policy, if wanted, wraps `completion` externally.
#[derive(Debug)]
pub struct JobHandle {
    job_id: JobId,
    studio_id: StudioId,
    kind: JobKind,
    progress: watch::Receiver<JobProgress>,
}

impl JobHandle {
    pub(crate) fn new(
        job_id: JobId,
        studio_id: StudioId,
        kind: JobKind,
        progress: watch::Receiver<JobProgress>,
    ) -> Self {
        Self {
            job_id,
            studio_id,
            kind,
            progress,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn studio_id(&self) -> &StudioId {
        &self.studio_id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    /// Current lifecycle state. Never blocks.
    pub fn state(&self) -> JobState {
        self.progress.borrow().state
    }

    /// Timing record for the job, or `None` if it has not reached a
    /// terminal state yet. Idempotent after completion.
    pub fn timings(&self) -> Option<JobTimings> {
        let progress = self.progress.borrow();
        if !progress.state.is_terminal() {
            return None;
        }
        Some(JobTimings {
            queued_at: progress.queued_at,
            started_at: progress.started_at?,
            finished_at: progress.finished_at?,
        })
    }

    /// Suspend until the job reaches a terminal state.
    ///
    /// Returns `Ok(())` for `Succeeded` and [`JobError::Execution`] for
    /// `Failed`. Resolves immediately if the job is already terminal. If
    /// the worker drops the job without a terminal state (e.g. the worker
    /// task was aborted), this resolves as an execution failure rather
    /// than hanging.
    pub async fn completion(&mut self) -> Result<(), JobError> {
        loop {
            let outcome = {
                let progress = self.progress.borrow_and_update();
                match progress.state {
                    JobState::Succeeded => Some(Ok(())),
                    JobState::Failed => Some(Err(progress
                        .error
                        .clone()
                        .unwrap_or_else(|| "job failed".to_string()))),
                    JobState::Pending | JobState::Running => None,
                }
            };

            match outcome {
                Some(Ok(())) => return Ok(()),
                Some(Err(cause)) => return Err(self.execution_error(cause)),
                None => {}
            }

            if self.progress.changed().await.is_err() {
                return Err(self.execution_error(
                    "worker stopped before the job reached a terminal state"
                        .to_string(),
                ));
            }
        }
    }

    fn execution_error(&self, cause: String) -> JobError {
        JobError::Execution {
            studio_id: self.studio_id.clone(),
            kind: self.kind,
            job_id: self.job_id,
            cause,
        }
    }
}
