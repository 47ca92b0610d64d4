use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::command::{PlaylistId, StudioId, StudioJob};
use crate::dispatcher::JobDispatcher;
use crate::error::JobError;
use crate::fanout::FanoutReport;
use crate::handle::JobTimings;

/// A rundown playlist as the admin surface sees it: enough to route jobs
/// to the owning studio.
#[derive(Clone, Debug)]
pub struct PlaylistRecord {
    pub id: PlaylistId,
    pub studio_id: StudioId,
    pub name: String,
}

/// Read and mutate access to playout state.
///
/// The admin surface resolves playlists to studios through this trait and
/// performs the one direct mutation (reset-instance cleanup) that bypasses
/// the job queue.
#[async_trait]
pub trait PlayoutStore: Send + Sync {
    async fn find_playlist(
        &self,
        id: &PlaylistId,
    ) -> anyhow::Result<Option<PlaylistRecord>>;

    async fn all_playlists(&self) -> anyhow::Result<Vec<PlaylistRecord>>;

    /// Delete part instances flagged as reset for a playlist, returning how
    /// many were removed.
    async fn remove_reset_instances(
        &self,
        playlist_id: &PlaylistId,
    ) -> anyhow::Result<u64>;
}

/// Administrative and debug operations over the dispatch core.
///
/// Each operation resolves its target studio, submits the matching job,
/// and awaits the outcome. These are forceful maintenance tools: they
/// bypass the guard rails the normal control surface applies, so they are
/// meant for operators, not for routine automation.
pub struct AdminApi {
    dispatcher: JobDispatcher,
    store: Arc<dyn PlayoutStore>,
}

impl AdminApi {
    pub fn new(dispatcher: JobDispatcher, store: Arc<dyn PlayoutStore>) -> Self {
        Self { dispatcher, store }
    }

    pub fn dispatcher(&self) -> &JobDispatcher {
        &self.dispatcher
    }

    async fn require_playlist(
        &self,
        id: &PlaylistId,
    ) -> Result<PlaylistRecord, JobError> {
        self.store
            .find_playlist(id)
            .await?
            .ok_or_else(|| JobError::not_found("rundown playlist", id))
    }

    /// Remove one playlist unconditionally, skipping the usual active-state
    /// checks.
    pub async fn remove_playlist(
        &self,
        playlist_id: &PlaylistId,
    ) -> Result<(), JobError> {
        let playlist = self.require_playlist(playlist_id).await?;
        tracing::info!(
            playlist_id = %playlist_id,
            studio_id = %playlist.studio_id,
            "force removing playlist"
        );

        let mut handle = self
            .dispatcher
            .submit(
                &playlist.studio_id,
                StudioJob::RemovePlaylist {
                    playlist_id: playlist_id.clone(),
                },
            )
            .await?;
        handle.completion().await
    }

    /// Remove every playlist in the system.
    ///
    /// All removals are submitted before any completion is awaited, so
    /// playlists on different studios are removed concurrently while each
    /// studio still processes its own removals in order.
    pub async fn remove_all_playlists(&self) -> Result<(), JobError> {
        let playlists = self.store.all_playlists().await?;
        tracing::info!(count = playlists.len(), "force removing all playlists");

        // Submit every removal before awaiting any, so one studio's
        // admission failure does not leave other studios' in-flight
        // removals unobserved.
        let mut handles = Vec::with_capacity(playlists.len());
        let mut first_error = None;
        for playlist in &playlists {
            match self
                .dispatcher
                .submit(
                    &playlist.studio_id,
                    StudioJob::RemovePlaylist {
                        playlist_id: playlist.id.clone(),
                    },
                )
                .await
            {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    tracing::warn!(
                        playlist_id = %playlist.id,
                        studio_id = %playlist.studio_id,
                        "playlist removal not admitted: {err}"
                    );
                    first_error.get_or_insert(err);
                }
            }
        }

        let results =
            join_all(handles.iter_mut().map(|handle| handle.completion())).await;
        for result in results {
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    /// Regenerate the timeline for one studio and report how long it took.
    pub async fn update_timeline(
        &self,
        studio_id: &StudioId,
    ) -> Result<JobTimings, JobError> {
        let mut handle = self
            .dispatcher
            .submit(studio_id, StudioJob::UpdateTimeline)
            .await?;
        handle.completion().await?;

        let timings = handle.timings().ok_or_else(|| JobError::Execution {
            studio_id: studio_id.clone(),
            kind: handle.kind(),
            job_id: handle.job_id(),
            cause: "timing record missing after completion".to_string(),
        })?;
        tracing::info!(
            studio_id = %studio_id,
            duration_ms = timings.duration().num_milliseconds(),
            execution_ms = timings.execution().num_milliseconds(),
            "timeline regenerated"
        );
        Ok(timings)
    }

    /// Re-sync infinite pieces on the playlist's nexted part instance.
    pub async fn sync_infinites_for_next_part(
        &self,
        playlist_id: &PlaylistId,
    ) -> Result<(), JobError> {
        let playlist = self.require_playlist(playlist_id).await?;
        let mut handle = self
            .dispatcher
            .submit(
                &playlist.studio_id,
                StudioJob::DebugSyncInfinites {
                    playlist_id: playlist_id.clone(),
                },
            )
            .await?;
        handle.completion().await
    }

    /// Regenerate the playlist's nexted part instance from its source part.
    pub async fn regenerate_next_part_instance(
        &self,
        playlist_id: &PlaylistId,
    ) -> Result<(), JobError> {
        let playlist = self.require_playlist(playlist_id).await?;
        let mut handle = self
            .dispatcher
            .submit(
                &playlist.studio_id,
                StudioJob::DebugRegenerateNextPartInstance {
                    playlist_id: playlist_id.clone(),
                },
            )
            .await?;
        handle.completion().await
    }

    /// Evict blueprint and ingest caches on every known studio.
    ///
    /// Returns the full per-studio report; any failed studio turns the
    /// aggregate into [`JobError::Broadcast`] while the successful evictions
    /// stand.
    pub async fn force_clear_all_caches(&self) -> Result<FanoutReport, JobError> {
        let studios = self.dispatcher.registry().known_studios().await;
        tracing::info!(studios = studios.len(), "clearing caches on all studios");
        self.dispatcher
            .submit_all(&studios, StudioJob::ForceClearCaches)
            .await
            .into_result()
    }

    /// Delete part instances flagged as reset for a playlist.
    ///
    /// This is a direct store mutation, not a queued job: it touches only
    /// already-reset rows, so it needs no ordering against live playout.
    pub async fn clear_reset_instances(
        &self,
        playlist_id: &PlaylistId,
    ) -> Result<u64, JobError> {
        self.require_playlist(playlist_id).await?;
        let removed = self.store.remove_reset_instances(playlist_id).await?;
        tracing::info!(
            playlist_id = %playlist_id,
            removed = removed,
            "cleared reset part instances"
        );
        Ok(removed)
    }

    /// Emit output through every supported channel so operators can verify
    /// log collection end to end.
    ///
    /// Covers each tracing level, stdout and stderr writes, a task that
    /// returns an error, and a task that panics. The panic is contained to
    /// its own task and surfaces through the join error log line.
    pub async fn exercise_logging(&self) {
        tracing::error!("test tracing.error");
        tracing::warn!("test tracing.warn");
        tracing::info!("test tracing.info");
        tracing::debug!("test tracing.debug");
        tracing::trace!("test tracing.trace");

        println!("test stdout");
        eprintln!("test stderr");

        let failing: tokio::task::JoinHandle<anyhow::Result<()>> =
            tokio::spawn(async { anyhow::bail!("test task error") });
        match failing.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("test task returned error: {e:#}"),
            Err(e) => tracing::error!("test task join failed: {e}"),
        }

        let panicking = tokio::spawn(async {
            panic!("test task panic");
        });
        if let Err(e) = panicking.await {
            tracing::error!("test task panicked as expected: {e}");
        }
    }
}
