//! Shared utilities

pub mod deferred;
pub mod time;

pub use deferred::PendingOps;
pub use time::{tick_delta, SimClock, SIMULATION_TPS, SNAPSHOT_TPS};
