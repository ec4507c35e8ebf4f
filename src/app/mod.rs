//! Host-side drivers for the simulation

pub mod runner;

pub use runner::{MatchRunner, PlayerInput, RunSummary, RunnerHandle, RunnerOptions};
