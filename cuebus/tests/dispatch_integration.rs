//! End-to-end tests for the dispatch core and the admin surface, driven
//! through the testkit's recording executor and in-memory playout store.

use std::sync::Arc;
use std::time::Duration;

use cuebus::{
    AdminApi, DispatchConfig, JobDispatcher, JobError, JobEventPayload,
    JobKind, JobState, PlaylistId, StudioId, StudioJob, WorkerRegistry,
};
use cuebus_testkit::{InMemoryPlayoutStore, MockExecutor, PlayoutExecutor};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

async fn dispatcher_with(
    executor: Arc<dyn cuebus::JobExecutor>,
    studios: &[&str],
) -> JobDispatcher {
    let registry = WorkerRegistry::with_studios(
        executor,
        DispatchConfig::default(),
        studios.iter().map(|s| StudioId::new(*s)),
    )
    .await;
    JobDispatcher::new(Arc::new(registry))
}

fn ids(studios: &[&str]) -> Vec<StudioId> {
    studios.iter().map(|s| StudioId::new(*s)).collect()
}

#[tokio::test]
async fn test_same_studio_jobs_run_in_submission_order() {
    let executor = MockExecutor::new();
    executor.set_latency(Duration::from_millis(10));
    let dispatcher =
        dispatcher_with(Arc::new(executor.clone()), &["studio0"]).await;
    let studio = StudioId::new("studio0");

    let mut handles = Vec::new();
    for i in 0..4 {
        let handle = dispatcher
            .submit(
                &studio,
                StudioJob::RemovePlaylist {
                    playlist_id: PlaylistId::new(format!("p{i}")),
                },
            )
            .await
            .unwrap();
        handles.push(handle);
    }

    for handle in &mut handles {
        timeout(WAIT, handle.completion()).await.unwrap().unwrap();
    }

    let record = executor.record_for(&studio);
    assert_eq!(record.len(), 4);
    let order: Vec<_> = record
        .iter()
        .map(|r| r.playlist_id.clone().unwrap().as_str().to_string())
        .collect();
    assert_eq!(order, vec!["p0", "p1", "p2", "p3"]);
    // Strictly serial: each execution finishes before the next starts.
    for pair in record.windows(2) {
        assert!(pair[0].finished <= pair[1].started);
    }
}

#[tokio::test]
async fn test_different_studios_execute_concurrently() {
    let executor = MockExecutor::new();
    executor.set_latency(Duration::from_millis(60));
    let dispatcher = dispatcher_with(
        Arc::new(executor.clone()),
        &["studio0", "studio1"],
    )
    .await;

    let mut h0 = dispatcher
        .submit(&StudioId::new("studio0"), StudioJob::UpdateTimeline)
        .await
        .unwrap();
    let mut h1 = dispatcher
        .submit(&StudioId::new("studio1"), StudioJob::UpdateTimeline)
        .await
        .unwrap();

    timeout(WAIT, h0.completion()).await.unwrap().unwrap();
    timeout(WAIT, h1.completion()).await.unwrap().unwrap();

    let record = executor.record();
    assert_eq!(record.len(), 2);
    assert!(
        record[0].overlaps(&record[1]),
        "executions on independent studios should overlap"
    );
}

#[tokio::test]
async fn test_broadcast_with_unavailable_worker() {
    let executor = MockExecutor::new();
    let dispatcher = dispatcher_with(
        Arc::new(executor.clone()),
        &["studio0", "studio1"],
    )
    .await;
    let s1 = StudioId::new("studio1");

    // Spawn studio1's worker, then shut it down so it refuses admissions.
    dispatcher
        .submit(&s1, StudioJob::UpdateTimeline)
        .await
        .unwrap()
        .completion()
        .await
        .unwrap();
    dispatcher.registry().worker(&s1).await.unwrap().shutdown().await;
    executor.clear();

    let report = dispatcher
        .submit_all(
            &ids(&["studio0", "studio1"]),
            StudioJob::ForceClearCaches,
        )
        .await;

    assert_eq!(report.total(), 2);
    assert!(report.outcomes()[0].is_success());
    assert!(matches!(
        report.outcomes()[1].result,
        Err(JobError::Admission { .. })
    ));

    let err = report.into_result().unwrap_err();
    match err {
        JobError::Broadcast { failed, total, .. } => {
            assert_eq!((failed, total), (1, 2));
        }
        other => panic!("expected broadcast error, got {other:?}"),
    }
    // Only the healthy studio executed anything.
    executor.assert_execution_count_eq(1);
}

#[tokio::test]
async fn test_handle_timings_appear_only_after_terminal() {
    let executor = MockExecutor::new();
    executor.set_latency(Duration::from_millis(50));
    let dispatcher =
        dispatcher_with(Arc::new(executor), &["studio0"]).await;

    let mut handle = dispatcher
        .submit(&StudioId::new("studio0"), StudioJob::UpdateTimeline)
        .await
        .unwrap();
    assert!(handle.timings().is_none());

    timeout(WAIT, handle.completion()).await.unwrap().unwrap();
    assert_eq!(handle.state(), JobState::Succeeded);

    let first = handle.timings().expect("timings after completion");
    let second = handle.timings().expect("timings are stable");
    assert_eq!(first.finished_at, second.finished_at);
    assert!(first.queued_at <= first.started_at);
    assert!(first.started_at <= first.finished_at);
}

#[tokio::test]
async fn test_execution_failure_surfaces_through_handle() {
    let executor = MockExecutor::new();
    executor.fail_kind(JobKind::UpdateTimeline);
    let dispatcher =
        dispatcher_with(Arc::new(executor), &["studio0"]).await;

    // Submission itself succeeds.
    let mut handle = dispatcher
        .submit(&StudioId::new("studio0"), StudioJob::UpdateTimeline)
        .await
        .unwrap();

    let err = timeout(WAIT, handle.completion())
        .await
        .unwrap()
        .unwrap_err();
    match err {
        JobError::Execution { kind, cause, .. } => {
            assert_eq!(kind, JobKind::UpdateTimeline);
            assert!(cause.contains("mock failure"));
        }
        other => panic!("expected execution error, got {other:?}"),
    }
    assert_eq!(handle.state(), JobState::Failed);
}

#[tokio::test]
async fn test_job_event_sequence() {
    let executor = MockExecutor::new();
    let dispatcher =
        dispatcher_with(Arc::new(executor), &["studio0"]).await;
    let mut events = dispatcher.registry().events().subscribe();

    let mut handle = dispatcher
        .submit(&StudioId::new("studio0"), StudioJob::UpdateTimeline)
        .await
        .unwrap();
    let job_id = handle.job_id();
    timeout(WAIT, handle.completion()).await.unwrap().unwrap();

    let mut payloads = Vec::new();
    while payloads.len() < 3 {
        let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
        payloads.push(event.payload);
    }
    match (&payloads[0], &payloads[1], &payloads[2]) {
        (
            JobEventPayload::Submitted { job_id: a, .. },
            JobEventPayload::Started { job_id: b, .. },
            JobEventPayload::Completed { job_id: c, .. },
        ) => {
            assert_eq!(*a, job_id);
            assert_eq!(*b, job_id);
            assert_eq!(*c, job_id);
        }
        other => panic!("unexpected event sequence: {other:?}"),
    }
}

fn admin_fixture(studios: &[&str]) -> (InMemoryPlayoutStore, Arc<dyn cuebus::JobExecutor>, Vec<StudioId>) {
    let store = InMemoryPlayoutStore::new();
    let executor: Arc<dyn cuebus::JobExecutor> =
        Arc::new(PlayoutExecutor::new(store.clone()));
    (store, executor, ids(studios))
}

async fn admin_with(
    store: &InMemoryPlayoutStore,
    executor: Arc<dyn cuebus::JobExecutor>,
    studios: Vec<StudioId>,
) -> AdminApi {
    let registry =
        WorkerRegistry::with_studios(executor, DispatchConfig::default(), studios)
            .await;
    AdminApi::new(
        JobDispatcher::new(Arc::new(registry)),
        Arc::new(store.clone()),
    )
}

#[tokio::test]
async fn test_remove_playlist_end_to_end() {
    let (store, executor, studios) = admin_fixture(&["studio0"]);
    store.insert_playlist("p1", "studio0", "Evening News");
    let admin = admin_with(&store, executor, studios).await;

    let p1 = PlaylistId::new("p1");
    timeout(WAIT, admin.remove_playlist(&p1))
        .await
        .unwrap()
        .unwrap();
    assert!(!store.contains_playlist(&p1));
}

#[tokio::test]
async fn test_remove_missing_playlist_fails_before_any_job() {
    let executor = MockExecutor::new();
    let store = InMemoryPlayoutStore::new();
    let registry = WorkerRegistry::with_studios(
        Arc::new(executor.clone()),
        DispatchConfig::default(),
        ids(&["studio0"]),
    )
    .await;
    let admin = AdminApi::new(
        JobDispatcher::new(Arc::new(registry)),
        Arc::new(store),
    );

    let err = admin
        .remove_playlist(&PlaylistId::new("p404"))
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::NotFound { .. }));
    executor.assert_execution_count_eq(0);
}

#[tokio::test]
async fn test_remove_all_playlists_across_studios() {
    let (store, executor, studios) = admin_fixture(&["studio0", "studio1"]);
    store.insert_playlist("p1", "studio0", "Morning Show");
    store.insert_playlist("p2", "studio0", "Midday Update");
    store.insert_playlist("p3", "studio1", "Evening News");
    let admin = admin_with(&store, executor, studios).await;

    timeout(WAIT, admin.remove_all_playlists())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(store.playlist_count(), 0);
}

#[tokio::test]
async fn test_remove_all_playlists_finishes_despite_refused_studio() {
    let (store, executor, studios) = admin_fixture(&["studio0", "studio1"]);
    store.insert_playlist("p1", "studio0", "Morning Show");
    store.insert_playlist("p2", "studio1", "Evening News");
    let admin = admin_with(&store, executor, studios).await;

    // studio1 stops accepting work; its removal must fail without leaving
    // studio0's removal unobserved.
    let s1 = StudioId::new("studio1");
    let registry = admin.dispatcher().registry();
    registry.resolve(&s1).await.unwrap().shutdown().await;

    let err = timeout(WAIT, admin.remove_all_playlists())
        .await
        .unwrap()
        .unwrap_err();
    assert!(matches!(err, JobError::Admission { .. }));
    assert!(!store.contains_playlist(&PlaylistId::new("p1")));
    assert!(store.contains_playlist(&PlaylistId::new("p2")));
}

#[tokio::test]
async fn test_update_timeline_reports_timings() {
    let (store, executor, studios) = admin_fixture(&["studio0"]);
    let admin = admin_with(&store, executor, studios).await;

    let timings = timeout(WAIT, admin.update_timeline(&StudioId::new("studio0")))
        .await
        .unwrap()
        .unwrap();
    assert!(timings.duration() >= chrono::Duration::zero());
    assert!(timings.execution() >= chrono::Duration::zero());
}

#[tokio::test]
async fn test_force_clear_all_caches_hits_every_known_studio() {
    let executor = MockExecutor::new();
    let store = InMemoryPlayoutStore::new();
    let registry = WorkerRegistry::with_studios(
        Arc::new(executor.clone()),
        DispatchConfig::default(),
        ids(&["studio0", "studio1", "studio2"]),
    )
    .await;
    let admin = AdminApi::new(
        JobDispatcher::new(Arc::new(registry)),
        Arc::new(store),
    );

    let report = timeout(WAIT, admin.force_clear_all_caches())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.total(), 3);
    assert!(report.succeeded());
    executor.assert_execution_count_eq(3);
    for record in executor.record() {
        assert_eq!(record.kind, JobKind::ForceClearCaches);
    }
}

#[tokio::test]
async fn test_sync_and_regenerate_target_owning_studio() {
    let executor = MockExecutor::new();
    let store = InMemoryPlayoutStore::new();
    store.insert_playlist("p1", "studio1", "Evening News");
    let registry = WorkerRegistry::with_studios(
        Arc::new(executor.clone()),
        DispatchConfig::default(),
        ids(&["studio0", "studio1"]),
    )
    .await;
    let admin = AdminApi::new(
        JobDispatcher::new(Arc::new(registry)),
        Arc::new(store),
    );

    let p1 = PlaylistId::new("p1");
    timeout(WAIT, admin.sync_infinites_for_next_part(&p1))
        .await
        .unwrap()
        .unwrap();
    timeout(WAIT, admin.regenerate_next_part_instance(&p1))
        .await
        .unwrap()
        .unwrap();

    let record = executor.record();
    assert_eq!(record.len(), 2);
    for r in &record {
        assert_eq!(r.studio_id, StudioId::new("studio1"));
    }
    assert_eq!(record[0].kind, JobKind::DebugSyncInfinites);
    assert_eq!(record[1].kind, JobKind::DebugRegenerateNextPartInstance);
}

#[tokio::test]
async fn test_clear_reset_instances_is_a_direct_mutation() {
    let executor = MockExecutor::new();
    let store = InMemoryPlayoutStore::new();
    store.insert_playlist("p1", "studio0", "Evening News");
    store.set_reset_instances("p1", 7);
    let registry = WorkerRegistry::with_studios(
        Arc::new(executor.clone()),
        DispatchConfig::default(),
        ids(&["studio0"]),
    )
    .await;
    let admin = AdminApi::new(
        JobDispatcher::new(Arc::new(registry)),
        Arc::new(store.clone()),
    );

    let p1 = PlaylistId::new("p1");
    let removed = admin.clear_reset_instances(&p1).await.unwrap();
    assert_eq!(removed, 7);
    assert_eq!(store.reset_instance_count(&p1), 0);
    // No job was queued for this.
    executor.assert_execution_count_eq(0);
}

#[tokio::test]
async fn test_exercise_logging_survives_task_panic() {
    let (store, executor, studios) = admin_fixture(&[]);
    let admin = admin_with(&store, executor, studios).await;

    // Must return normally despite the deliberately panicking task.
    timeout(WAIT, admin.exercise_logging()).await.unwrap();
}

#[tokio::test]
async fn test_registry_shutdown_drains_pending_jobs() {
    let executor = MockExecutor::new();
    executor.set_latency(Duration::from_millis(10));
    let dispatcher =
        dispatcher_with(Arc::new(executor.clone()), &["studio0"]).await;
    let studio = StudioId::new("studio0");

    let mut handles = Vec::new();
    for _ in 0..3 {
        handles.push(
            dispatcher
                .submit(&studio, StudioJob::UpdateTimeline)
                .await
                .unwrap(),
        );
    }

    dispatcher.registry().shutdown().await;

    for handle in &mut handles {
        timeout(WAIT, handle.completion()).await.unwrap().unwrap();
    }
    executor.assert_execution_count_eq(3);

    // New submissions are refused after shutdown.
    let err = dispatcher
        .submit(&studio, StudioJob::UpdateTimeline)
        .await
        .unwrap_err();
    assert!(matches!(err, JobError::Admission { .. }));
}
