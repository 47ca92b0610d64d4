use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// Identifier of a studio, the owning resource a job executes against.
///
/// Studio ids are opaque routing keys: the dispatch core never interprets
/// them beyond equality and hashing.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StudioId(String);

impl StudioId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StudioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StudioId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for StudioId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of a rundown playlist.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PlaylistId(String);

impl PlaylistId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PlaylistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlaylistId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PlaylistId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unique identifier for one submitted job.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discriminant of a studio job.
///
/// The dispatch core only ever inspects this discriminant, for routing and
/// logging; variant payloads are opaque to it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum JobKind {
    RemovePlaylist,
    UpdateTimeline,
    DebugSyncInfinites,
    DebugRegenerateNextPartInstance,
    ForceClearCaches,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::RemovePlaylist => "remove_playlist",
            JobKind::UpdateTimeline => "update_timeline",
            JobKind::DebugSyncInfinites => "debug_sync_infinites",
            JobKind::DebugRegenerateNextPartInstance => {
                "debug_regenerate_next_part_instance"
            }
            JobKind::ForceClearCaches => "force_clear_caches",
        }
    }
}

impl Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A command addressed to a studio worker.
///
/// Immutable once constructed. Each variant carries its operation-specific
/// payload; only the executor backend interprets it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StudioJob {
    /// Remove a rundown playlist, bypassing the usual checks.
    RemovePlaylist { playlist_id: PlaylistId },
    /// Regenerate the studio timeline.
    UpdateTimeline,
    /// Re-sync infinite pieces on the nexted part instance.
    DebugSyncInfinites { playlist_id: PlaylistId },
    /// Regenerate the nexted part instance from its part.
    DebugRegenerateNextPartInstance { playlist_id: PlaylistId },
    /// Evict blueprint and ingest caches.
    ForceClearCaches,
}

impl StudioJob {
    pub fn kind(&self) -> JobKind {
        match self {
            StudioJob::RemovePlaylist { .. } => JobKind::RemovePlaylist,
            StudioJob::UpdateTimeline => JobKind::UpdateTimeline,
            StudioJob::DebugSyncInfinites { .. } => JobKind::DebugSyncInfinites,
            StudioJob::DebugRegenerateNextPartInstance { .. } => {
                JobKind::DebugRegenerateNextPartInstance
            }
            StudioJob::ForceClearCaches => JobKind::ForceClearCaches,
        }
    }
}
