//! Test support for cuebus.
//!
//! Provides a recording mock executor and an in-memory playout store so
//! dispatch and admin behavior can be exercised without real playout
//! infrastructure.

pub mod mock;
pub mod store;

pub use mock::*;
pub use store::*;
