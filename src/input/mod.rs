//! Per-tick control intents and the keyboard/touch mapping that produces them

pub mod bindings;

use serde::{Deserialize, Serialize};

pub use bindings::{Bindings, Controls, TouchAction};

/// What one side wants to do this tick.
///
/// Supplied by a human input source or by the AI; the core treats both alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Intent {
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub jump: bool,
    #[serde(default)]
    pub punch: bool,
    #[serde(default)]
    pub kick: bool,
    #[serde(default)]
    pub special: bool,
    #[serde(default)]
    pub block: bool,
}

impl Intent {
    /// Walk toward one side, clearing the other direction
    pub fn set_direction(&mut self, right: bool) {
        self.right = right;
        self.left = !right;
    }

    pub fn is_idle(&self) -> bool {
        *self == Intent::default()
    }
}
