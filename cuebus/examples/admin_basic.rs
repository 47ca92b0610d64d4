//! Minimal admin surface demo: two studios, a handful of playlists, and a
//! few forceful maintenance operations driven through the dispatch core.
//!
//! Run with: cargo run --example admin_basic

use std::sync::Arc;

use cuebus::{
    AdminApi, DispatchConfig, JobDispatcher, PlaylistId, StudioId,
    WorkerRegistry,
};
use cuebus_testkit::{InMemoryPlayoutStore, PlayoutExecutor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cuebus=debug".into()),
        )
        .init();

    let store = InMemoryPlayoutStore::new();
    store.insert_playlist("pl-morning", "studio-a", "Morning Show");
    store.insert_playlist("pl-midday", "studio-a", "Midday Update");
    store.insert_playlist("pl-evening", "studio-b", "Evening News");
    store.set_reset_instances("pl-evening", 3);

    let registry = WorkerRegistry::with_studios(
        Arc::new(PlayoutExecutor::new(store.clone())),
        DispatchConfig::default(),
        [StudioId::new("studio-a"), StudioId::new("studio-b")],
    )
    .await;
    let registry = Arc::new(registry);
    let dispatcher = JobDispatcher::new(Arc::clone(&registry));
    let admin = AdminApi::new(dispatcher, Arc::new(store.clone()));

    let timings = admin.update_timeline(&StudioId::new("studio-a")).await?;
    println!(
        "timeline regenerated in {}ms",
        timings.duration().num_milliseconds()
    );

    admin.remove_playlist(&PlaylistId::new("pl-morning")).await?;
    println!(
        "removed pl-morning, {} playlists remain",
        store.playlist_count()
    );

    let removed = admin
        .clear_reset_instances(&PlaylistId::new("pl-evening"))
        .await?;
    println!("cleared {removed} reset part instances");

    let report = admin.force_clear_all_caches().await?;
    println!("cache eviction reached {} studios", report.total());

    admin.remove_all_playlists().await?;
    println!("all playlists removed");

    registry.shutdown().await;
    Ok(())
}
