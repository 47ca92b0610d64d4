use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, watch, Mutex, Notify};
use tracing::Instrument;

use crate::command::{JobId, StudioId, StudioJob};
use crate::error::JobError;
use crate::events::{EventMeta, InProcEventBus, JobEvent, JobEventPayload};
use crate::handle::{JobHandle, JobProgress, JobState};
use crate::telemetry;

/// Execution backend for studio jobs.
///
/// This is the only component that performs domain effects: timeline
/// generation, playlist removal, cache eviction all live behind this seam.
/// Any retry policy is the implementor's concern; the dispatch core runs
/// each admitted job exactly once.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(
        &self,
        studio_id: &StudioId,
        job: &StudioJob,
    ) -> anyhow::Result<()>;
}

/// Token for signaling graceful shutdown to a worker loop.
#[derive(Clone, Debug)]
pub struct ShutdownToken {
    inner: Arc<ShutdownTokenInner>,
}

#[derive(Debug)]
struct ShutdownTokenInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ShutdownTokenInner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.inner.notify.notified().await;
    }
}

impl Default for ShutdownToken {
    fn default() -> Self {
        Self::new()
    }
}

struct QueuedJob {
    job_id: JobId,
    correlation_id: uuid::Uuid,
    job: StudioJob,
    progress: watch::Sender<JobProgress>,
}

/// Per-studio worker: a FIFO queue drained by one spawned task.
///
/// Jobs for the same studio execute strictly in submission order; workers
/// for different studios are fully independent. There is no cancellation
/// primitive; once admitted, a job runs to its natural terminal state.
pub struct StudioWorker {
    studio_id: StudioId,
    tx: mpsc::UnboundedSender<QueuedJob>,
    depth: Arc<AtomicUsize>,
    shutdown: ShutdownToken,
    shutdown_grace_ms: u64,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl std::fmt::Debug for StudioWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioWorker")
            .field("studio_id", &self.studio_id)
            .field("queue_depth", &self.queue_depth())
            .field("shutdown_cancelled", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl StudioWorker {
    /// Spawn a worker loop for one studio.
    pub(crate) fn spawn(
        studio_id: StudioId,
        executor: Arc<dyn JobExecutor>,
        events: Arc<InProcEventBus>,
        shutdown_grace_ms: u64,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        let shutdown = ShutdownToken::new();

        let task = tokio::spawn(Self::worker_loop(
            studio_id.clone(),
            rx,
            executor,
            events,
            Arc::clone(&depth),
            shutdown.clone(),
        ));

        Arc::new(Self {
            studio_id,
            tx,
            depth,
            shutdown,
            shutdown_grace_ms,
            task: Mutex::new(Some(task)),
        })
    }

    pub fn studio_id(&self) -> &StudioId {
        &self.studio_id
    }

    /// Number of jobs admitted but not yet started.
    pub fn queue_depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Admit a job into this worker's queue.
    ///
    /// Synchronous with respect to admission: the returned handle exists
    /// before the job has started. Fails with [`JobError::Admission`] once
    /// the worker is shutting down.
    pub(crate) fn admit(
        &self,
        job: StudioJob,
        events: &InProcEventBus,
    ) -> Result<JobHandle, JobError> {
        let kind = job.kind();
        if self.shutdown.is_cancelled() {
            return Err(JobError::Admission {
                studio_id: self.studio_id.clone(),
                kind,
                reason: "worker is shutting down".to_string(),
            });
        }

        let job_id = JobId::new();
        // One correlation id per job, shared by all of its lifecycle events.
        let correlation_id = uuid::Uuid::now_v7();
        let (progress_tx, progress_rx) = watch::channel(JobProgress::queued());
        let queued = QueuedJob {
            job_id,
            correlation_id,
            job,
            progress: progress_tx,
        };

        // Count the slot before sending: the worker decrements right after
        // recv, so incrementing afterwards could underflow the gauge.
        self.depth.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(queued).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(JobError::Admission {
                studio_id: self.studio_id.clone(),
                kind,
                reason: "worker queue is closed".to_string(),
            });
        }
        telemetry::set_queue_depth(self.studio_id.as_str(), self.queue_depth());

        events.publish(JobEvent {
            meta: EventMeta::new(self.studio_id.clone(), Some(correlation_id)),
            payload: JobEventPayload::Submitted { job_id, kind },
        });

        Ok(JobHandle::new(
            job_id,
            self.studio_id.clone(),
            kind,
            progress_rx,
        ))
    }

    /// Stop admissions, drain already-admitted jobs, then join the loop.
    ///
    /// Admission is a promise: jobs already in the queue still execute.
    /// Idempotent; concurrent calls after the first are no-ops.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let task = {
            let mut guard = self.task.lock().await;
            guard.take()
        };

        if let Some(task) = task {
            let grace =
                tokio::time::Duration::from_millis(self.shutdown_grace_ms);
            match tokio::time::timeout(grace, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(
                    studio_id = %self.studio_id,
                    "studio worker task failed: {e:?}"
                ),
                Err(_) => tracing::warn!(
                    studio_id = %self.studio_id,
                    "studio worker did not drain within shutdown grace"
                ),
            }
        }
    }

    async fn worker_loop(
        studio_id: StudioId,
        mut rx: mpsc::UnboundedReceiver<QueuedJob>,
        executor: Arc<dyn JobExecutor>,
        events: Arc<InProcEventBus>,
        depth: Arc<AtomicUsize>,
        shutdown: ShutdownToken,
    ) {
        let mut draining = false;
        loop {
            let queued = tokio::select! {
                maybe = rx.recv() => match maybe {
                    Some(queued) => queued,
                    None => break,
                },
                _ = shutdown.cancelled(), if !draining => {
                    // Closing the channel rejects new admissions while
                    // recv keeps yielding the jobs already queued.
                    rx.close();
                    draining = true;
                    continue;
                }
            };

            depth.fetch_sub(1, Ordering::SeqCst);
            telemetry::set_queue_depth(
                studio_id.as_str(),
                depth.load(Ordering::SeqCst),
            );
            Self::run_job(&studio_id, executor.as_ref(), &events, queued).await;
        }
        tracing::debug!(studio_id = %studio_id, "studio worker drained, exiting");
    }

    async fn run_job(
        studio_id: &StudioId,
        executor: &dyn JobExecutor,
        events: &InProcEventBus,
        queued: QueuedJob,
    ) {
        let kind = queued.job.kind();
        let started_at = Utc::now();
        queued.progress.send_modify(|p| {
            p.state = JobState::Running;
            p.started_at = Some(started_at);
        });
        events.publish(JobEvent {
            meta: EventMeta::new(studio_id.clone(), Some(queued.correlation_id)),
            payload: JobEventPayload::Started {
                job_id: queued.job_id,
                kind,
            },
        });

        let span = telemetry::job_execute_span(
            queued.job_id.to_string(),
            kind.as_str(),
        );
        let result = executor
            .execute(studio_id, &queued.job)
            .instrument(span)
            .await;
        let finished_at = Utc::now();
        let duration_secs = (finished_at - started_at)
            .to_std()
            .unwrap_or_default()
            .as_secs_f64();

        match result {
            Ok(()) => {
                queued.progress.send_modify(|p| {
                    p.state = JobState::Succeeded;
                    p.finished_at = Some(finished_at);
                });
                events.publish(JobEvent {
                    meta: EventMeta::new(
                        studio_id.clone(),
                        Some(queued.correlation_id),
                    ),
                    payload: JobEventPayload::Completed {
                        job_id: queued.job_id,
                        kind,
                    },
                });
                telemetry::record_job_completed(
                    studio_id.as_str(),
                    kind.as_str(),
                    "success",
                );
                telemetry::observe_job_duration(
                    studio_id.as_str(),
                    kind.as_str(),
                    "success",
                    duration_secs,
                );
            }
            Err(err) => {
                let cause = format!("{err:#}");
                queued.progress.send_modify(|p| {
                    p.state = JobState::Failed;
                    p.finished_at = Some(finished_at);
                    p.error = Some(cause.clone());
                });
                events.publish(JobEvent {
                    meta: EventMeta::new(
                        studio_id.clone(),
                        Some(queued.correlation_id),
                    ),
                    payload: JobEventPayload::Failed {
                        job_id: queued.job_id,
                        kind,
                        error: cause,
                    },
                });
                telemetry::record_job_completed(
                    studio_id.as_str(),
                    kind.as_str(),
                    "failed",
                );
                telemetry::observe_job_duration(
                    studio_id.as_str(),
                    kind.as_str(),
                    "failed",
                    duration_secs,
                );
            }
        }
    }
}
