//! Construction-time validation errors
//!
//! Runtime commands (attacks, jumps, damage) never fail; they are silently
//! ignored when their preconditions don't hold. Only invalid setup is an error.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SetupError {
    #[error("Fighter dimensions must be positive (got {width}x{height})")]
    InvalidDimensions { width: f32, height: f32 },

    #[error("Max health must be positive (got {0})")]
    InvalidHealth(f32),

    #[error("Arena geometry must be positive (width {width}, ground {ground_y})")]
    InvalidArena { width: f32, ground_y: f32 },

    #[error("Probability '{name}' must lie in [0, 1] (got {value})")]
    InvalidProbability { name: &'static str, value: f32 },

    #[error("Reaction time must be at least one tick")]
    InvalidReactionTime,

    #[error("Unknown difficulty tier: {0}")]
    UnknownDifficulty(String),

    #[error("Invalid match rules: {0}")]
    InvalidRules(&'static str),
}

pub type SetupResult<T> = std::result::Result<T, SetupError>;
