//! Time utilities for the match simulation

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 30; // 30 ticks per second
pub const SNAPSHOT_TPS: u32 = 10; // 10 snapshots per second
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Calculate delta time for one simulation step (in seconds)
pub fn tick_delta() -> f32 {
    1.0 / SIMULATION_TPS as f32
}

/// Discrete simulation clock.
///
/// Time is derived from the step counter instead of being accumulated, so
/// `now()` after N steps is always `N * dt` regardless of float drift in
/// repeated additions.
#[derive(Debug, Clone)]
pub struct SimClock {
    tick: u64,
    dt: f32,
}

impl SimClock {
    pub fn new(dt: f32) -> Self {
        Self { tick: 0, dt }
    }

    /// Advance one step and return the new time
    pub fn advance(&mut self) -> f32 {
        self.tick += 1;
        self.now()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Seconds since the clock started
    pub fn now(&self) -> f32 {
        (self.tick as f64 * self.dt as f64) as f32
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(tick_delta())
    }
}
