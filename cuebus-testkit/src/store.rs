use async_trait::async_trait;
use cuebus::{
    JobExecutor, PlaylistId, PlaylistRecord, PlayoutStore, StudioId, StudioJob,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

struct StoreState {
    playlists: HashMap<PlaylistId, PlaylistRecord>,
    reset_instances: HashMap<PlaylistId, u64>,
}

/// In-memory playout store for admin surface tests.
#[derive(Clone)]
pub struct InMemoryPlayoutStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryPlayoutStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState {
                playlists: HashMap::new(),
                reset_instances: HashMap::new(),
            })),
        }
    }

    pub fn insert_playlist(
        &self,
        id: impl Into<PlaylistId>,
        studio_id: impl Into<StudioId>,
        name: impl Into<String>,
    ) {
        let id = id.into();
        let record = PlaylistRecord {
            id: id.clone(),
            studio_id: studio_id.into(),
            name: name.into(),
        };
        self.state.lock().playlists.insert(id, record);
    }

    /// Seed reset part instances for a playlist, to be swept by
    /// `remove_reset_instances`.
    pub fn set_reset_instances(&self, id: impl Into<PlaylistId>, count: u64) {
        self.state.lock().reset_instances.insert(id.into(), count);
    }

    pub fn contains_playlist(&self, id: &PlaylistId) -> bool {
        self.state.lock().playlists.contains_key(id)
    }

    pub fn playlist_count(&self) -> usize {
        self.state.lock().playlists.len()
    }

    pub fn reset_instance_count(&self, id: &PlaylistId) -> u64 {
        self.state
            .lock()
            .reset_instances
            .get(id)
            .copied()
            .unwrap_or(0)
    }

    pub fn remove_playlist(&self, id: &PlaylistId) -> bool {
        self.state.lock().playlists.remove(id).is_some()
    }
}

impl Default for InMemoryPlayoutStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayoutStore for InMemoryPlayoutStore {
    async fn find_playlist(
        &self,
        id: &PlaylistId,
    ) -> anyhow::Result<Option<PlaylistRecord>> {
        Ok(self.state.lock().playlists.get(id).cloned())
    }

    async fn all_playlists(&self) -> anyhow::Result<Vec<PlaylistRecord>> {
        let state = self.state.lock();
        let mut playlists: Vec<_> = state.playlists.values().cloned().collect();
        playlists.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(playlists)
    }

    async fn remove_reset_instances(
        &self,
        playlist_id: &PlaylistId,
    ) -> anyhow::Result<u64> {
        let mut state = self.state.lock();
        Ok(state.reset_instances.remove(playlist_id).unwrap_or(0))
    }
}

/// Executor that applies playlist removals against an
/// [`InMemoryPlayoutStore`], so admin operations have a visible effect in
/// tests. Other job kinds execute as no-ops.
#[derive(Clone)]
pub struct PlayoutExecutor {
    store: InMemoryPlayoutStore,
}

impl PlayoutExecutor {
    pub fn new(store: InMemoryPlayoutStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl JobExecutor for PlayoutExecutor {
    async fn execute(
        &self,
        _studio_id: &StudioId,
        job: &StudioJob,
    ) -> anyhow::Result<()> {
        match job {
            StudioJob::RemovePlaylist { playlist_id } => {
                if !self.store.remove_playlist(playlist_id) {
                    anyhow::bail!("playlist {playlist_id} is already gone");
                }
                Ok(())
            }
            StudioJob::UpdateTimeline
            | StudioJob::DebugSyncInfinites { .. }
            | StudioJob::DebugRegenerateNextPartInstance { .. }
            | StudioJob::ForceClearCaches => Ok(()),
        }
    }
}
