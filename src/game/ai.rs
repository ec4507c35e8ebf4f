//! CPU opponent: a timed probabilistic decision loop
//!
//! The policy commits to an intent and keeps re-issuing it until its action
//! cooldown runs out, then waits `reaction_time` ticks before deciding again.
//! It only reads fighter state and returns an [`Intent`]; the match applies it
//! exactly like human input.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::error::{SetupError, SetupResult};
use super::fighter::Fighter;
use super::physics::PhysicsSystem;
use crate::input::Intent;

/// Opponent attacking within this distance triggers a block roll
const BLOCK_RANGE: f32 = 100.0;
const CLOSE_RANGE: f32 = 80.0;
const MID_RANGE: f32 = 200.0;

const BLOCK_COOLDOWN: u32 = 30;
const ATTACK_COOLDOWN: u32 = 20;
const RETREAT_COOLDOWN: u32 = 15;
const MID_SPECIAL_COOLDOWN: u32 = 30;
const JUMP_IN_COOLDOWN: u32 = 25;
const APPROACH_COOLDOWN: u32 = 10;

const JUMP_IN_CHANCE: f32 = 0.2;
const APPROACH_JUMP_CHANCE: f32 = 0.15;
/// Attack roll split between punch and kick
const PUNCH_SPLIT: f32 = 0.5;

/// Source of uniform rolls in `[0, 1)`
pub trait RollSource: Send {
    fn roll(&mut self) -> f32;
}

/// Reproducible rolls from a seeded ChaCha stream
pub struct SeededRolls {
    rng: ChaCha8Rng,
}

impl SeededRolls {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RollSource for SeededRolls {
    fn roll(&mut self) -> f32 {
        self.rng.gen_range(0.0..1.0)
    }
}

/// Replays a fixed list of rolls, then repeats a fallback value
pub struct ScriptedRolls {
    rolls: VecDeque<f32>,
    fallback: f32,
}

impl ScriptedRolls {
    pub fn new(rolls: impl IntoIterator<Item = f32>, fallback: f32) -> Self {
        Self {
            rolls: rolls.into_iter().collect(),
            fallback,
        }
    }

    /// Every roll returns the same value
    pub fn constant(value: f32) -> Self {
        Self::new(std::iter::empty(), value)
    }
}

impl RollSource for ScriptedRolls {
    fn roll(&mut self) -> f32 {
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}

/// Difficulty tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                reaction_time: 45,
                aggressiveness: 0.3,
                block_chance: 0.2,
                special_chance: 0.1,
            },
            Difficulty::Medium => DifficultyProfile {
                reaction_time: 25,
                aggressiveness: 0.5,
                block_chance: 0.4,
                special_chance: 0.2,
            },
            Difficulty::Hard => DifficultyProfile {
                reaction_time: 10,
                aggressiveness: 0.7,
                block_chance: 0.6,
                special_chance: 0.35,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(SetupError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// The four dials of a difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Ticks between decisions once the action cooldown has expired
    pub reaction_time: u32,
    pub aggressiveness: f32,
    pub block_chance: f32,
    pub special_chance: f32,
}

impl DifficultyProfile {
    pub fn validate(&self) -> SetupResult<()> {
        if self.reaction_time == 0 {
            return Err(SetupError::InvalidReactionTime);
        }
        for (name, value) in [
            ("aggressiveness", self.aggressiveness),
            ("block_chance", self.block_chance),
            ("special_chance", self.special_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SetupError::InvalidProbability { name, value });
            }
        }
        Ok(())
    }
}

/// CPU controller for one side
pub struct AiPolicy {
    profile: DifficultyProfile,
    action_cooldown: u32,
    decision_timer: u32,
    current: Option<Intent>,
    rolls: Box<dyn RollSource>,
}

impl AiPolicy {
    pub fn new(difficulty: Difficulty, rolls: Box<dyn RollSource>) -> Self {
        Self::from_parts(difficulty.profile(), rolls)
    }

    /// Policy with custom dials
    pub fn with_profile(
        profile: DifficultyProfile,
        rolls: Box<dyn RollSource>,
    ) -> SetupResult<Self> {
        profile.validate()?;
        Ok(Self::from_parts(profile, rolls))
    }

    pub fn seeded(difficulty: Difficulty, seed: u64) -> Self {
        Self::new(difficulty, Box::new(SeededRolls::new(seed)))
    }

    fn from_parts(profile: DifficultyProfile, rolls: Box<dyn RollSource>) -> Self {
        Self {
            profile,
            action_cooldown: 0,
            decision_timer: 0,
            current: None,
            rolls,
        }
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.profile = difficulty.profile();
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn action_cooldown(&self) -> u32 {
        self.action_cooldown
    }

    pub fn decision_timer(&self) -> u32 {
        self.decision_timer
    }

    /// Committed intent, if a decision has been made
    pub fn committed(&self) -> Option<&Intent> {
        self.current.as_ref()
    }

    /// Forget the committed action and timers (full match reset)
    pub fn reset(&mut self) {
        self.action_cooldown = 0;
        self.decision_timer = 0;
        self.current = None;
    }

    /// Produce this tick's intent for `fighter` against `opponent`
    pub fn next_intent(&mut self, fighter: &Fighter, opponent: &Fighter) -> Intent {
        if self.action_cooldown > 0 {
            self.action_cooldown -= 1;
            return self.issue();
        }

        self.decision_timer += 1;
        if self.decision_timer >= self.profile.reaction_time {
            self.decision_timer = 0;
            self.decide(fighter, opponent);
        }
        self.issue()
    }

    /// Emit the committed intent; single-shot actions fire only once
    fn issue(&mut self) -> Intent {
        let Some(current) = self.current.as_mut() else {
            return Intent::default();
        };
        let issued = *current;
        current.jump = false;
        current.punch = false;
        current.kick = false;
        current.special = false;
        issued
    }

    fn decide(&mut self, fighter: &Fighter, opponent: &Fighter) {
        let distance = PhysicsSystem::horizontal_distance(fighter.body(), opponent.body());
        let opponent_is_right = fighter.x() < opponent.x();
        let mut action = Intent::default();

        if opponent.is_attacking()
            && distance < BLOCK_RANGE
            && self.rolls.roll() < self.profile.block_chance
        {
            action.block = true;
            self.commit(action, BLOCK_COOLDOWN);
            return;
        }

        if distance < CLOSE_RANGE {
            if self.rolls.roll() < self.profile.aggressiveness {
                let attack_roll = self.rolls.roll();
                if attack_roll < self.profile.special_chance && fighter.special_ready() {
                    action.special = true;
                } else if attack_roll < PUNCH_SPLIT {
                    action.punch = true;
                } else {
                    action.kick = true;
                }
                self.commit(action, ATTACK_COOLDOWN);
            } else {
                action.set_direction(!opponent_is_right);
                self.commit(action, RETREAT_COOLDOWN);
            }
            return;
        }

        if distance < MID_RANGE {
            if self.rolls.roll() < self.profile.special_chance && fighter.special_ready() {
                action.special = true;
                self.commit(action, MID_SPECIAL_COOLDOWN);
                return;
            }

            if self.rolls.roll() < JUMP_IN_CHANCE {
                action.jump = true;
                action.set_direction(opponent_is_right);
                self.commit(action, JUMP_IN_COOLDOWN);
                return;
            }
        }

        if self.rolls.roll() < self.profile.aggressiveness {
            action.set_direction(opponent_is_right);
            if self.rolls.roll() < APPROACH_JUMP_CHANCE {
                action.jump = true;
            }
        }
        self.commit(action, APPROACH_COOLDOWN);
    }

    fn commit(&mut self, action: Intent, cooldown: u32) {
        self.current = Some(action);
        self.action_cooldown = cooldown;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fighter::Side;
    use crate::game::physics::Arena;

    fn arena() -> Arena {
        Arena::new(800.0, 450.0, 400.0).unwrap()
    }

    fn fighters(gap: f32) -> (Fighter, Fighter) {
        let mut cpu = Fighter::spawn(Side::Two, 300.0 + gap, 300.0);
        let mut player = Fighter::spawn(Side::One, 300.0, 300.0);
        cpu.advance_tick(&arena());
        player.advance_tick(&arena());
        (cpu, player)
    }

    fn quick_profile() -> DifficultyProfile {
        DifficultyProfile {
            reaction_time: 1,
            ..Difficulty::Medium.profile()
        }
    }

    fn policy(rolls: ScriptedRolls) -> AiPolicy {
        AiPolicy::with_profile(quick_profile(), Box::new(rolls)).unwrap()
    }

    #[test]
    fn difficulty_parses_and_rejects_unknown() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert_eq!(" easy ".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!(
            "brutal".parse::<Difficulty>().unwrap_err(),
            SetupError::UnknownDifficulty("brutal".to_string())
        );
    }

    #[test]
    fn invalid_profiles_fail_fast() {
        let zero_reaction = DifficultyProfile {
            reaction_time: 0,
            ..Difficulty::Easy.profile()
        };
        assert_eq!(
            zero_reaction.validate().unwrap_err(),
            SetupError::InvalidReactionTime
        );

        let bad_chance = DifficultyProfile {
            block_chance: 1.5,
            ..Difficulty::Easy.profile()
        };
        assert!(matches!(
            AiPolicy::with_profile(bad_chance, Box::new(ScriptedRolls::constant(0.0))),
            Err(SetupError::InvalidProbability { name: "block_chance", .. })
        ));

        for tier in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert!(tier.profile().validate().is_ok());
        }
    }

    #[test]
    fn waits_for_reaction_time_before_first_decision() {
        let (cpu, player) = fighters(300.0);
        let mut ai = AiPolicy::new(Difficulty::Medium, Box::new(ScriptedRolls::constant(0.0)));

        for _ in 0..24 {
            assert_eq!(ai.next_intent(&cpu, &player), Intent::default());
            assert!(ai.committed().is_none());
        }
        let intent = ai.next_intent(&cpu, &player);
        assert!(intent.left);
        assert_eq!(ai.action_cooldown(), APPROACH_COOLDOWN);
        assert_eq!(ai.decision_timer(), 0);
    }

    #[test]
    fn blocks_incoming_attack() {
        let (cpu, mut player) = fighters(90.0);
        player.punch();
        let mut ai = policy(ScriptedRolls::new([0.1], 0.9));

        let intent = ai.next_intent(&cpu, &player);
        assert!(intent.block);
        assert_eq!(ai.action_cooldown(), BLOCK_COOLDOWN);

        for _ in 0..BLOCK_COOLDOWN {
            assert!(ai.next_intent(&cpu, &player).block);
        }
    }

    #[test]
    fn failed_block_roll_falls_through_to_range_logic() {
        let (cpu, mut player) = fighters(70.0);
        player.punch();
        // block fails, aggression succeeds, attack roll picks kick
        let mut ai = policy(ScriptedRolls::new([0.9, 0.1, 0.7], 0.9));

        let intent = ai.next_intent(&cpu, &player);
        assert!(intent.kick);
        assert!(!intent.block);
        assert_eq!(ai.action_cooldown(), ATTACK_COOLDOWN);
    }

    #[test]
    fn close_range_attack_fires_once() {
        let (cpu, player) = fighters(50.0);
        let mut ai = policy(ScriptedRolls::new([0.1, 0.3], 0.9));

        let first = ai.next_intent(&cpu, &player);
        assert!(first.punch);
        for _ in 0..ATTACK_COOLDOWN {
            assert!(!ai.next_intent(&cpu, &player).punch);
        }
    }

    #[test]
    fn close_range_special_needs_cooldown_ready() {
        let (mut cpu, player) = fighters(50.0);
        let mut ai = policy(ScriptedRolls::new([0.1, 0.05], 0.9));
        assert!(ai.next_intent(&cpu, &player).special);

        cpu.special();
        let mut ai = policy(ScriptedRolls::new([0.1, 0.05], 0.9));
        let intent = ai.next_intent(&cpu, &player);
        assert!(!intent.special);
        assert!(intent.punch);
    }

    #[test]
    fn close_range_retreat_moves_away() {
        let (cpu, player) = fighters(50.0);
        let mut ai = policy(ScriptedRolls::new([0.9], 0.9));

        let intent = ai.next_intent(&cpu, &player);
        assert!(intent.right);
        assert!(!intent.left);
        assert_eq!(ai.action_cooldown(), RETREAT_COOLDOWN);

        // movement persists for the whole commitment
        for _ in 0..RETREAT_COOLDOWN {
            assert!(ai.next_intent(&cpu, &player).right);
        }
    }

    #[test]
    fn mid_range_jump_in_approaches() {
        let (cpu, player) = fighters(150.0);
        let mut ai = policy(ScriptedRolls::new([0.9, 0.1], 0.9));

        let intent = ai.next_intent(&cpu, &player);
        assert!(intent.jump);
        assert!(intent.left);
        assert_eq!(ai.action_cooldown(), JUMP_IN_COOLDOWN);

        let next = ai.next_intent(&cpu, &player);
        assert!(!next.jump);
        assert!(next.left);
    }

    #[test]
    fn mid_range_fallthrough_uses_approach_cooldown() {
        let (cpu, player) = fighters(150.0);
        // special fails, jump-in fails, approach succeeds, no jump
        let mut ai = policy(ScriptedRolls::new([0.9, 0.9, 0.1, 0.9], 0.9));

        let intent = ai.next_intent(&cpu, &player);
        assert!(intent.left);
        assert!(!intent.jump);
        assert_eq!(ai.action_cooldown(), APPROACH_COOLDOWN);
    }

    #[test]
    fn far_range_idle_when_not_aggressive() {
        let (cpu, player) = fighters(400.0);
        let mut ai = policy(ScriptedRolls::constant(0.95));

        let intent = ai.next_intent(&cpu, &player);
        assert_eq!(intent, Intent::default());
        assert_eq!(ai.committed(), Some(&Intent::default()));
        assert_eq!(ai.action_cooldown(), APPROACH_COOLDOWN);
    }

    #[test]
    fn far_range_approach_can_jump() {
        let (cpu, player) = fighters(400.0);
        let mut ai = policy(ScriptedRolls::new([0.1, 0.1], 0.9));

        let intent = ai.next_intent(&cpu, &player);
        assert!(intent.left);
        assert!(intent.jump);
    }

    #[test]
    fn zero_special_chance_never_picks_special() {
        let profile = DifficultyProfile {
            reaction_time: 1,
            aggressiveness: 1.0,
            block_chance: 0.0,
            special_chance: 0.0,
        };
        for gap in [10.0, 50.0, 79.0, 90.0, 150.0, 199.0, 250.0, 450.0] {
            for roll in [0.0, 0.05, 0.2, 0.49, 0.5, 0.99] {
                let (cpu, player) = fighters(gap);
                let mut ai =
                    AiPolicy::with_profile(profile, Box::new(ScriptedRolls::constant(roll)))
                        .unwrap();
                for _ in 0..200 {
                    assert!(!ai.next_intent(&cpu, &player).special);
                }
            }
        }
    }

    #[test]
    fn seeded_policy_is_reproducible() {
        let (cpu, player) = fighters(120.0);
        let mut a = AiPolicy::seeded(Difficulty::Hard, 42);
        let mut b = AiPolicy::seeded(Difficulty::Hard, 42);
        for _ in 0..500 {
            assert_eq!(a.next_intent(&cpu, &player), b.next_intent(&cpu, &player));
        }
    }

    #[test]
    fn set_difficulty_swaps_profile() {
        let mut ai = AiPolicy::seeded(Difficulty::Easy, 1);
        ai.set_difficulty(Difficulty::Hard);
        assert_eq!(*ai.profile(), Difficulty::Hard.profile());
    }
}
