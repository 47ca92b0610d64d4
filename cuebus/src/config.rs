use serde::{Deserialize, Serialize};

/// Tuning knobs for the dispatch core.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Buffer size of the in-process event bus, per subscriber.
    pub event_capacity: usize,
    /// How long `shutdown` waits for a worker to drain its queue before
    /// giving up on joining its task.
    pub shutdown_grace_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
            shutdown_grace_ms: 30_000,
        }
    }
}
