//! Key-code bindings and held-key tracking
//!
//! Key codes follow the DOM `KeyboardEvent.code` naming (`KeyA`, `ArrowLeft`,
//! `Space`, ...). Capturing the events is the host's job; this module only
//! remembers which codes are down and turns them into an [`Intent`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::Intent;
use crate::game::fighter::Side;

/// Key codes bound to each action for one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    pub left: Vec<String>,
    pub right: Vec<String>,
    pub jump: Vec<String>,
    pub punch: Vec<String>,
    pub kick: Vec<String>,
    pub special: Vec<String>,
    pub block: Vec<String>,
}

fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|c| c.to_string()).collect()
}

impl Bindings {
    /// WASD movement, F/G/H attacks, S to block
    pub fn player_one() -> Self {
        Self {
            left: codes(&["KeyA"]),
            right: codes(&["KeyD"]),
            jump: codes(&["KeyW", "Space"]),
            punch: codes(&["KeyF"]),
            kick: codes(&["KeyG"]),
            special: codes(&["KeyH"]),
            block: codes(&["KeyS"]),
        }
    }

    /// Arrow movement, K/L/; attacks, down arrow to block
    pub fn player_two() -> Self {
        Self {
            left: codes(&["ArrowLeft"]),
            right: codes(&["ArrowRight"]),
            jump: codes(&["ArrowUp"]),
            punch: codes(&["KeyK"]),
            kick: codes(&["KeyL"]),
            special: codes(&["Semicolon"]),
            block: codes(&["ArrowDown"]),
        }
    }

    pub fn for_side(side: Side) -> Self {
        match side {
            Side::One => Self::player_one(),
            Side::Two => Self::player_two(),
        }
    }
}

/// On-screen touch buttons (player one only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchAction {
    Left,
    Right,
    Jump,
    Punch,
    Kick,
    Special,
}

/// Held keys plus touch state, read once per tick per side
#[derive(Debug, Clone)]
pub struct Controls {
    pressed: HashSet<String>,
    touch: HashSet<TouchAction>,
    bindings: [Bindings; 2],
}

impl Controls {
    pub fn new() -> Self {
        Self::with_bindings(Bindings::player_one(), Bindings::player_two())
    }

    pub fn with_bindings(one: Bindings, two: Bindings) -> Self {
        Self {
            pressed: HashSet::new(),
            touch: HashSet::new(),
            bindings: [one, two],
        }
    }

    pub fn key_down(&mut self, code: &str) {
        self.pressed.insert(code.to_string());
    }

    pub fn key_up(&mut self, code: &str) {
        self.pressed.remove(code);
    }

    pub fn touch_start(&mut self, action: TouchAction) {
        self.touch.insert(action);
    }

    pub fn touch_end(&mut self, action: TouchAction) {
        self.touch.remove(&action);
    }

    /// Release everything, e.g. when the window loses focus
    pub fn clear(&mut self) {
        self.pressed.clear();
        self.touch.clear();
    }

    fn any_down(&self, codes: &[String]) -> bool {
        codes.iter().any(|c| self.pressed.contains(c))
    }

    /// Build the intent for one side. Touch jump and attack presses are
    /// one-shot and are consumed here.
    pub fn intent_for(&mut self, side: Side) -> Intent {
        let b = &self.bindings[side.index()];
        let mut intent = Intent {
            left: self.any_down(&b.left),
            right: self.any_down(&b.right),
            jump: self.any_down(&b.jump),
            punch: self.any_down(&b.punch),
            kick: self.any_down(&b.kick),
            special: self.any_down(&b.special),
            block: self.any_down(&b.block),
        };

        if side == Side::One {
            intent.left |= self.touch.contains(&TouchAction::Left);
            intent.right |= self.touch.contains(&TouchAction::Right);
            intent.jump |= self.touch.contains(&TouchAction::Jump);
            intent.punch |= self.touch.contains(&TouchAction::Punch);
            intent.kick |= self.touch.contains(&TouchAction::Kick);
            intent.special |= self.touch.contains(&TouchAction::Special);

            for (fired, action) in [
                (intent.jump, TouchAction::Jump),
                (intent.punch, TouchAction::Punch),
                (intent.kick, TouchAction::Kick),
                (intent.special, TouchAction::Special),
            ] {
                if fired {
                    self.touch.remove(&action);
                }
            }
        }

        intent
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyboard_maps_to_each_side() {
        let mut controls = Controls::new();
        controls.key_down("KeyA");
        controls.key_down("KeyF");
        controls.key_down("ArrowRight");
        controls.key_down("ArrowDown");

        let one = controls.intent_for(Side::One);
        assert!(one.left && one.punch);
        assert!(!one.right && !one.block);

        let two = controls.intent_for(Side::Two);
        assert!(two.right && two.block);
        assert!(!two.punch);
    }

    #[test]
    fn space_and_w_both_jump() {
        let mut controls = Controls::new();
        controls.key_down("Space");
        assert!(controls.intent_for(Side::One).jump);
        controls.key_up("Space");
        assert!(!controls.intent_for(Side::One).jump);
        controls.key_down("KeyW");
        assert!(controls.intent_for(Side::One).jump);
    }

    #[test]
    fn held_keys_repeat_every_tick() {
        let mut controls = Controls::new();
        controls.key_down("KeyK");
        assert!(controls.intent_for(Side::Two).punch);
        assert!(controls.intent_for(Side::Two).punch);
    }

    #[test]
    fn touch_attacks_are_one_shot_but_movement_holds() {
        let mut controls = Controls::new();
        controls.touch_start(TouchAction::Punch);
        controls.touch_start(TouchAction::Right);

        let first = controls.intent_for(Side::One);
        assert!(first.punch && first.right);

        let second = controls.intent_for(Side::One);
        assert!(!second.punch);
        assert!(second.right);

        controls.touch_end(TouchAction::Right);
        assert!(controls.intent_for(Side::One).is_idle());
    }

    #[test]
    fn touch_never_drives_player_two() {
        let mut controls = Controls::new();
        controls.touch_start(TouchAction::Kick);
        assert!(controls.intent_for(Side::Two).is_idle());
        assert!(controls.intent_for(Side::One).kick);
    }

    #[test]
    fn clear_releases_everything() {
        let mut controls = Controls::new();
        controls.key_down("KeyD");
        controls.touch_start(TouchAction::Left);
        controls.clear();
        assert!(controls.intent_for(Side::One).is_idle());
    }
}
