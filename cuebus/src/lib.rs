//! Cuebus - Asynchronous job dispatch for broadcast playout control.
//!
//! A control-plane crate for routing administrative playout jobs to studio
//! workers: each studio owns a serial job queue, submissions return handles
//! immediately, and completion is awaited out of band. On top of the
//! dispatch core sits an admin surface exposing forceful maintenance
//! operations (playlist removal, timeline regeneration, cache eviction).
//!
//! # Core Concepts
//!
//! - **StudioJob**: The unit of work, an immutable command addressed to one
//!   studio. The dispatch core routes on [`JobKind`] and never interprets
//!   payloads.
//!
//! - **JobHandle**: Returned synchronously at admission. Exposes the job's
//!   [`JobState`], its [`JobTimings`] once terminal, and an awaitable
//!   completion.
//!
//! - **Registry**: The [`WorkerRegistry`] maps studio ids to workers,
//!   spawning each studio's worker lazily on first use. Unregistered ids
//!   are rejected before anything runs.
//!
//! - **Dispatcher**: The [`JobDispatcher`] is the submission front door;
//!   [`FanoutCoordinator`] broadcasts one job across many studios and
//!   gathers every per-studio outcome.
//!
//! - **Admin**: The [`AdminApi`] implements the operator-facing
//!   maintenance operations over a [`PlayoutStore`] backend.
//!
//! - **Events**: The [`InProcEventBus`] broadcasts job lifecycle events
//!   for observers without affecting dispatch semantics.
//!
//! # Feature Flags
//!
//! - `metrics` - Prometheus metrics support
//!
//! # Example
//!
//! ```ignore
//! use cuebus::*;
//! use std::sync::Arc;
//!
//! let registry = WorkerRegistry::with_studios(
//!     executor,
//!     DispatchConfig::default(),
//!     [StudioId::new("studio0")],
//! )
//! .await;
//! let dispatcher = JobDispatcher::new(Arc::new(registry));
//! let mut handle = dispatcher
//!     .submit(&StudioId::new("studio0"), StudioJob::UpdateTimeline)
//!     .await?;
//! handle.completion().await?;
//! ```

/// Administrative and debug operations.
///
/// The `admin` module provides the operator-facing surface:
/// - [`AdminApi`] - forceful maintenance operations over the dispatch core
/// - [`PlayoutStore`] - trait for the playout state backend
/// - [`PlaylistRecord`] - playlist metadata used for job routing
pub mod admin;

/// Job commands and identifiers.
///
/// The `command` module defines the vocabulary of the dispatch core:
/// - [`StudioJob`] - the unit of work, with per-operation payloads
/// - [`JobKind`] - routing and logging discriminant
/// - [`StudioId`], [`PlaylistId`], [`JobId`] - identifier newtypes
pub mod command;

/// Configuration for the dispatch core.
///
/// The `config` module defines [`DispatchConfig`] for tuning event bus
/// capacity and shutdown behavior.
pub mod config;

/// Job submission front door.
///
/// The `dispatcher` module provides [`JobDispatcher`], which resolves
/// studio workers through the registry and admits jobs into their queues.
pub mod dispatcher;

/// Error taxonomy for dispatch and admin operations.
///
/// The `error` module defines [`JobError`], separating synchronous
/// resolution and admission failures from asynchronous execution failures.
pub mod error;

/// Event publishing for job lifecycle observability.
///
/// The `events` module provides:
/// - [`JobEvent`] and [`JobEventPayload`] - event data
/// - [`EventMeta`] - versioned event envelope with correlation ids
/// - [`InProcEventBus`] - in-process event broadcasting
pub mod events;

/// Broadcast of one job across many studios.
///
/// The `fanout` module provides [`FanoutCoordinator`] for submitting a job
/// to a set of studios and [`FanoutReport`] aggregating every per-studio
/// outcome.
pub mod fanout;

/// Handles to submitted jobs.
///
/// The `handle` module defines:
/// - [`JobHandle`] - awaitable handle returned at admission
/// - [`JobState`] - lifecycle states
/// - [`JobTimings`] - timing record available after the terminal state
pub mod handle;

/// Studio worker registry.
///
/// The `registry` module provides [`WorkerRegistry`], mapping registered
/// studio ids to lazily spawned workers.
pub mod registry;

/// Tracing spans and telemetry helpers.
///
/// The `telemetry` module provides span constructors and record helpers
/// for the job lifecycle. Prometheus passthroughs activate with the
/// `metrics` feature.
pub mod telemetry;

/// Per-studio worker loops.
///
/// The `worker` module provides:
/// - [`JobExecutor`] - trait for the execution backend
/// - [`StudioWorker`] - FIFO queue drained by one task per studio
/// - [`ShutdownToken`] - graceful shutdown signaling
pub mod worker;

#[cfg(feature = "metrics")]
/// Prometheus metrics implementation.
///
/// The `metrics` module provides counters, gauges, and histograms for job
/// dispatch when the `metrics` feature is enabled.
pub mod metrics;

pub use admin::*;
pub use command::*;
pub use config::*;
pub use dispatcher::*;
pub use error::*;
pub use events::*;
pub use fanout::*;
pub use handle::*;
pub use registry::*;
pub use worker::*;
