use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::command::StudioId;
use crate::config::DispatchConfig;
use crate::error::JobError;
use crate::events::InProcEventBus;
use crate::worker::{JobExecutor, StudioWorker};

struct RegistryState {
    known: HashSet<StudioId>,
    workers: HashMap<StudioId, Arc<StudioWorker>>,
}

/// Registry of known studios and their workers.
///
/// A studio must be registered before jobs can target it; unregistered
/// ids fail resolution with [`JobError::UnknownStudio`] and never create a
/// worker. Workers themselves are created lazily, on the first job routed
/// to a studio, and each studio gets at most one.
pub struct WorkerRegistry {
    executor: Arc<dyn JobExecutor>,
    events: Arc<InProcEventBus>,
    config: DispatchConfig,
    state: RwLock<RegistryState>,
}

impl std::fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("config", &self.config)
            .finish()
    }
}

impl WorkerRegistry {
    pub fn new(executor: Arc<dyn JobExecutor>, config: DispatchConfig) -> Self {
        let events = Arc::new(InProcEventBus::new(config.event_capacity));
        Self {
            executor,
            events,
            config,
            state: RwLock::new(RegistryState {
                known: HashSet::new(),
                workers: HashMap::new(),
            }),
        }
    }

    /// Convenience constructor registering a set of studios up front.
    pub async fn with_studios<I>(
        executor: Arc<dyn JobExecutor>,
        config: DispatchConfig,
        studios: I,
    ) -> Self
    where
        I: IntoIterator<Item = StudioId>,
    {
        let registry = Self::new(executor, config);
        {
            let mut state = registry.state.write().await;
            state.known.extend(studios);
        }
        registry
    }

    /// Event bus carrying lifecycle events for every worker this registry
    /// creates.
    pub fn events(&self) -> &Arc<InProcEventBus> {
        &self.events
    }

    /// Mark a studio id as valid for job routing. Idempotent.
    pub async fn register_studio(&self, studio_id: StudioId) {
        let mut state = self.state.write().await;
        state.known.insert(studio_id);
    }

    /// All registered studio ids, sorted for stable enumeration.
    pub async fn known_studios(&self) -> Vec<StudioId> {
        let state = self.state.read().await;
        let mut studios: Vec<_> = state.known.iter().cloned().collect();
        studios.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        studios
    }

    /// Resolve the worker for a studio, spawning it on first use.
    ///
    /// Double-checked under the lock so concurrent resolutions of the same
    /// studio converge on a single worker.
    pub async fn resolve(
        &self,
        studio_id: &StudioId,
    ) -> Result<Arc<StudioWorker>, JobError> {
        {
            let state = self.state.read().await;
            if !state.known.contains(studio_id) {
                return Err(JobError::UnknownStudio(studio_id.clone()));
            }
            if let Some(worker) = state.workers.get(studio_id) {
                return Ok(Arc::clone(worker));
            }
        }

        let mut state = self.state.write().await;
        if !state.known.contains(studio_id) {
            return Err(JobError::UnknownStudio(studio_id.clone()));
        }
        if let Some(worker) = state.workers.get(studio_id) {
            return Ok(Arc::clone(worker));
        }

        tracing::debug!(studio_id = %studio_id, "spawning studio worker");
        let worker = StudioWorker::spawn(
            studio_id.clone(),
            Arc::clone(&self.executor),
            Arc::clone(&self.events),
            self.config.shutdown_grace_ms,
        );
        state.workers.insert(studio_id.clone(), Arc::clone(&worker));
        Ok(worker)
    }

    /// Worker for a studio if one has already been spawned. Never spawns.
    pub async fn worker(&self, studio_id: &StudioId) -> Option<Arc<StudioWorker>> {
        let state = self.state.read().await;
        state.workers.get(studio_id).map(Arc::clone)
    }

    /// Shut down every spawned worker, draining their queues.
    pub async fn shutdown(&self) {
        let workers: Vec<_> = {
            let state = self.state.read().await;
            state.workers.values().map(Arc::clone).collect()
        };
        for worker in workers {
            worker.shutdown().await;
        }
        tracing::info!("worker registry shut down");
    }
}
