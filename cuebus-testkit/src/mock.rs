use async_trait::async_trait;
use cuebus::{JobExecutor, JobKind, PlaylistId, StudioId, StudioJob};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One recorded execution, with wall-clock bounds for ordering and
/// concurrency assertions.
#[derive(Clone, Debug)]
pub struct ExecutionRecord {
    pub studio_id: StudioId,
    pub kind: JobKind,
    pub playlist_id: Option<PlaylistId>,
    pub started: Instant,
    pub finished: Instant,
}

impl ExecutionRecord {
    /// Whether this execution's interval overlaps another's.
    pub fn overlaps(&self, other: &ExecutionRecord) -> bool {
        self.started < other.finished && other.started < self.finished
    }
}

/// Recording executor for dispatch tests.
///
/// Records every execution with timing bounds, and can be configured to
/// sleep per job or to fail selected studios or job kinds.
#[derive(Clone)]
pub struct MockExecutor {
    executions: Arc<Mutex<Vec<ExecutionRecord>>>,
    latency: Arc<Mutex<Duration>>,
    fail_studios: Arc<Mutex<HashSet<StudioId>>>,
    fail_kinds: Arc<Mutex<HashSet<JobKind>>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            executions: Arc::new(Mutex::new(Vec::new())),
            latency: Arc::new(Mutex::new(Duration::ZERO)),
            fail_studios: Arc::new(Mutex::new(HashSet::new())),
            fail_kinds: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Make every execution sleep for `latency` before finishing.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Make every job targeting `studio_id` fail.
    pub fn fail_studio(&self, studio_id: StudioId) {
        self.fail_studios.lock().insert(studio_id);
    }

    /// Make every job of `kind` fail, on any studio.
    pub fn fail_kind(&self, kind: JobKind) {
        self.fail_kinds.lock().insert(kind);
    }

    pub fn record(&self) -> Vec<ExecutionRecord> {
        self.executions.lock().clone()
    }

    /// Executions for one studio, in the order they ran.
    pub fn record_for(&self, studio_id: &StudioId) -> Vec<ExecutionRecord> {
        self.executions
            .lock()
            .iter()
            .filter(|r| &r.studio_id == studio_id)
            .cloned()
            .collect()
    }

    pub fn assert_execution_count_eq(&self, expected: usize) {
        let actual = self.executions.lock().len();
        assert_eq!(
            actual, expected,
            "Expected {expected} executions, got {actual}"
        );
    }

    pub fn clear(&self) {
        self.executions.lock().clear();
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn playlist_of(job: &StudioJob) -> Option<PlaylistId> {
    match job {
        StudioJob::RemovePlaylist { playlist_id }
        | StudioJob::DebugSyncInfinites { playlist_id }
        | StudioJob::DebugRegenerateNextPartInstance { playlist_id } => {
            Some(playlist_id.clone())
        }
        StudioJob::UpdateTimeline | StudioJob::ForceClearCaches => None,
    }
}

#[async_trait]
impl JobExecutor for MockExecutor {
    async fn execute(
        &self,
        studio_id: &StudioId,
        job: &StudioJob,
    ) -> anyhow::Result<()> {
        let started = Instant::now();
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.executions.lock().push(ExecutionRecord {
            studio_id: studio_id.clone(),
            kind: job.kind(),
            playlist_id: playlist_of(job),
            started,
            finished: Instant::now(),
        });

        if self.fail_studios.lock().contains(studio_id) {
            anyhow::bail!("mock failure for studio {studio_id}");
        }
        if self.fail_kinds.lock().contains(&job.kind()) {
            anyhow::bail!("mock failure for kind {}", job.kind());
        }
        Ok(())
    }
}
