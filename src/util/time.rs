//! Tick-rate helpers for the fixed-step simulation

use std::time::Duration;

/// Tick rate configuration
pub const SIMULATION_TPS: u32 = 60; // one tick per rendered frame
pub const SNAPSHOT_TPS: u32 = 20; // snapshots pushed to the presentation layer

/// Highest rate that still yields a non-zero tick
pub const MAX_TPS: u32 = 1_000_000;

/// Wall-clock duration of one tick at the given rate, never below 1 µs
pub fn tick_duration(tps: u32) -> Duration {
    Duration::from_micros((1_000_000 / tps.max(1) as u64).max(1))
}

/// Convert a millisecond delay into a whole number of ticks, rounding to nearest
pub fn ms_to_ticks(ms: u32, tps: u32) -> u32 {
    ((ms as u64 * tps as u64 + 500) / 1000) as u32
}

/// Number of simulation ticks between two snapshots
pub fn snapshot_interval(sim_tps: u32, snapshot_tps: u32) -> u32 {
    (sim_tps / snapshot_tps.max(1)).max(1)
}
