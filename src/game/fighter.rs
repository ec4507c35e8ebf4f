//! Fighter state machine: movement, attacks, damage intake and timers
//!
//! A fighter knows nothing about its opponent. Every public command is a
//! guarded transition; a command whose precondition fails is ignored without
//! touching any state.

use serde::{Deserialize, Serialize};

use super::combat::{AttackKind, AttackStats};
use super::error::{SetupError, SetupResult};
use super::physics::{Arena, Body, PhysicsSystem, Rect, JUMP_IMPULSE, WALK_SPEED};

pub const FIGHTER_WIDTH: f32 = 60.0;
pub const FIGHTER_HEIGHT: f32 = 100.0;
pub const MAX_HEALTH: f32 = 100.0;

/// Stun applied by an unblocked hit
pub const HIT_STUN_TICKS: u32 = 15;
/// Invulnerability after an unblocked hit
pub const HIT_COOLDOWN_TICKS: u32 = 20;
/// Invulnerability after a blocked hit
pub const BLOCK_COOLDOWN_TICKS: u32 = 10;
pub const SPECIAL_COOLDOWN_TICKS: u32 = 60;
/// Fraction of raw damage that gets through a block
pub const BLOCK_DAMAGE_FACTOR: f32 = 0.2;

/// Ticks per animation phase and number of phases in a cycle
const ANIMATION_STEP_TICKS: u8 = 8;
const ANIMATION_PHASES: u8 = 4;

/// Health percentage under which the HUD shows a warning
pub const LOW_HEALTH_PERCENT: f32 = 25.0;

/// Which spawn slot a fighter occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Spawns on the left, player one
    One,
    /// Spawns on the right, player two or the CPU
    Two,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::One => 0,
            Side::Two => 1,
        }
    }
}

/// Playable characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Character {
    Blaze,
    Frost,
}

impl Character {
    pub fn name(self) -> &'static str {
        match self {
            Character::Blaze => "BLAZE",
            Character::Frost => "FROST",
        }
    }

    /// Default character for a spawn slot
    pub fn for_side(side: Side) -> Self {
        match side {
            Side::One => Character::Blaze,
            Side::Two => Character::Frost,
        }
    }
}

/// Sprite selection derived from the rest of the fighter state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationState {
    Idle,
    Walk,
    Jump,
    Attack,
    Hit,
    Block,
}

/// Static fighter parameters, validated once at construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FighterSpec {
    pub width: f32,
    pub height: f32,
    pub max_health: f32,
    pub speed: f32,
}

impl FighterSpec {
    pub fn validate(&self) -> SetupResult<()> {
        if !(self.width > 0.0) || !(self.height > 0.0) {
            return Err(SetupError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.max_health > 0.0) {
            return Err(SetupError::InvalidHealth(self.max_health));
        }
        Ok(())
    }
}

impl Default for FighterSpec {
    fn default() -> Self {
        Self {
            width: FIGHTER_WIDTH,
            height: FIGHTER_HEIGHT,
            max_health: MAX_HEALTH,
            speed: WALK_SPEED,
        }
    }
}

/// One combatant
#[derive(Debug, Clone)]
pub struct Fighter {
    side: Side,
    character: Character,
    body: Body,
    speed: f32,
    max_health: f32,
    health: f32,
    facing_right: bool,

    attack: Option<AttackKind>,
    attack_frame: u32,
    attack_duration: u32,
    attack_box: Option<Rect>,

    hit_cooldown: u32,
    special_cooldown: u32,
    hit_stun: u32,

    is_blocking: bool,
    is_hit: bool,

    animation: AnimationState,
    animation_frame: u8,
    animation_timer: u8,
}

impl Fighter {
    pub fn new(
        side: Side,
        character: Character,
        x: f32,
        y: f32,
        facing_right: bool,
        spec: FighterSpec,
    ) -> SetupResult<Self> {
        spec.validate()?;
        Ok(Self::from_spec(side, character, x, y, facing_right, spec))
    }

    /// Default-sized fighter for a spawn slot, facing the centre of the arena
    pub fn spawn(side: Side, x: f32, y: f32) -> Self {
        Self::from_spec(
            side,
            Character::for_side(side),
            x,
            y,
            side == Side::One,
            FighterSpec::default(),
        )
    }

    fn from_spec(
        side: Side,
        character: Character,
        x: f32,
        y: f32,
        facing_right: bool,
        spec: FighterSpec,
    ) -> Self {
        Self {
            side,
            character,
            body: Body::new(x, y, spec.width, spec.height),
            speed: spec.speed,
            max_health: spec.max_health,
            health: spec.max_health,
            facing_right,
            attack: None,
            attack_frame: 0,
            attack_duration: 0,
            attack_box: None,
            hit_cooldown: 0,
            special_cooldown: 0,
            hit_stun: 0,
            is_blocking: false,
            is_hit: false,
            animation: AnimationState::Idle,
            animation_frame: 0,
            animation_timer: 0,
        }
    }

    // ---- commands -------------------------------------------------------

    pub fn move_left(&mut self) {
        if self.hit_stun == 0 {
            self.body.vel_x = -self.speed;
        }
    }

    pub fn move_right(&mut self) {
        if self.hit_stun == 0 {
            self.body.vel_x = self.speed;
        }
    }

    pub fn stop(&mut self) {
        self.body.vel_x = 0.0;
    }

    pub fn jump(&mut self) {
        if self.body.grounded && self.hit_stun == 0 {
            self.body.vel_y = JUMP_IMPULSE;
            self.body.grounded = false;
        }
    }

    pub fn punch(&mut self) {
        self.start_attack(AttackKind::Punch);
    }

    pub fn kick(&mut self) {
        self.start_attack(AttackKind::Kick);
    }

    pub fn special(&mut self) {
        if self.special_cooldown > 0 {
            return;
        }
        if self.start_attack(AttackKind::Special) {
            self.special_cooldown = SPECIAL_COOLDOWN_TICKS;
        }
    }

    fn start_attack(&mut self, kind: AttackKind) -> bool {
        if self.is_attacking() || self.hit_stun > 0 {
            return false;
        }
        self.attack = Some(kind);
        self.attack_frame = 0;
        self.attack_duration = AttackStats::for_kind(kind).duration;
        true
    }

    /// Blocking only holds on the ground and outside an attack
    pub fn block(&mut self, active: bool) {
        self.is_blocking = active && self.body.grounded && !self.is_attacking();
    }

    /// Apply an incoming hit. Returns false while invulnerable.
    pub fn take_damage(&mut self, amount: f32, knockback: f32) -> bool {
        if self.hit_cooldown > 0 {
            return false;
        }

        if self.is_blocking {
            self.health = (self.health - amount * BLOCK_DAMAGE_FACTOR).max(0.0);
            self.hit_cooldown = BLOCK_COOLDOWN_TICKS;
            return true;
        }

        self.health = (self.health - amount).max(0.0);
        self.is_hit = true;
        self.hit_stun = HIT_STUN_TICKS;
        self.hit_cooldown = HIT_COOLDOWN_TICKS;
        self.body.vel_x = knockback;
        true
    }

    /// Advance physics, timers, the attack lifecycle and the animation by one tick
    pub fn advance_tick(&mut self, arena: &Arena) {
        PhysicsSystem::integrate(&mut self.body, arena, self.hit_stun > 0);

        self.hit_cooldown = self.hit_cooldown.saturating_sub(1);
        self.special_cooldown = self.special_cooldown.saturating_sub(1);
        self.hit_stun = self.hit_stun.saturating_sub(1);

        if let Some(kind) = self.attack {
            self.attack_frame += 1;
            self.attack_box = Some(self.hitbox_for(kind));

            if self.attack_frame >= self.attack_duration {
                self.clear_attack();
            }
        }

        self.update_animation();

        if self.hit_stun == 0 {
            self.is_hit = false;
        }
    }

    /// Restore spawn state at a round boundary
    pub fn reset(&mut self, x: f32, y: f32) {
        self.body.x = x;
        self.body.y = y;
        self.body.vel_x = 0.0;
        self.body.vel_y = 0.0;
        self.body.grounded = false;
        self.health = self.max_health;
        self.clear_attack();
        self.hit_stun = 0;
        self.hit_cooldown = 0;
        self.special_cooldown = 0;
        self.is_hit = false;
        self.is_blocking = false;
        self.animation = AnimationState::Idle;
        self.animation_frame = 0;
        self.animation_timer = 0;
    }

    pub(crate) fn set_facing_right(&mut self, facing_right: bool) {
        self.facing_right = facing_right;
    }

    fn clear_attack(&mut self) {
        self.attack = None;
        self.attack_frame = 0;
        self.attack_duration = 0;
        self.attack_box = None;
    }

    fn hitbox_for(&self, kind: AttackKind) -> Rect {
        let stats = AttackStats::for_kind(kind);
        let x = if self.facing_right {
            self.body.x + self.body.width
        } else {
            self.body.x - stats.reach_back
        };
        Rect::new(
            x,
            self.body.y + stats.box_offset_y,
            stats.box_width,
            stats.box_height,
        )
    }

    fn update_animation(&mut self) {
        self.animation_timer += 1;
        if self.animation_timer >= ANIMATION_STEP_TICKS {
            self.animation_timer = 0;
            self.animation_frame = (self.animation_frame + 1) % ANIMATION_PHASES;
        }

        self.animation = if self.is_hit {
            AnimationState::Hit
        } else if self.is_attacking() {
            AnimationState::Attack
        } else if !self.body.grounded {
            AnimationState::Jump
        } else if self.body.vel_x != 0.0 {
            AnimationState::Walk
        } else if self.is_blocking {
            AnimationState::Block
        } else {
            AnimationState::Idle
        };
    }

    // ---- combat lookups -------------------------------------------------

    /// True only inside the attack's active window
    pub fn is_attack_active(&self) -> bool {
        match self.attack {
            Some(_) => AttackStats::is_active_frame(self.attack_frame, self.attack_duration),
            None => false,
        }
    }

    pub fn damage_for(kind: AttackKind) -> f32 {
        AttackStats::for_kind(kind).damage
    }

    /// Knockback velocity pushing away from an attacker with the given facing
    pub fn knockback_for(kind: AttackKind, facing_right: bool) -> f32 {
        let dir = if facing_right { 1.0 } else { -1.0 };
        dir * AttackStats::for_kind(kind).knockback
    }

    // ---- queries --------------------------------------------------------

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn character(&self) -> Character {
        self.character
    }

    pub fn name(&self) -> &'static str {
        self.character.name()
    }

    pub fn x(&self) -> f32 {
        self.body.x
    }

    pub fn y(&self) -> f32 {
        self.body.y
    }

    pub fn velocity(&self) -> (f32, f32) {
        (self.body.vel_x, self.body.vel_y)
    }

    pub fn width(&self) -> f32 {
        self.body.width
    }

    pub fn height(&self) -> f32 {
        self.body.height
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn bounds(&self) -> Rect {
        self.body.bounds()
    }

    pub fn is_grounded(&self) -> bool {
        self.body.grounded
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn health_percent(&self) -> f32 {
        self.health / self.max_health * 100.0
    }

    pub fn is_low_health(&self) -> bool {
        self.health_percent() < LOW_HEALTH_PERCENT
    }

    pub fn is_knocked_out(&self) -> bool {
        self.health <= 0.0
    }

    pub fn facing_right(&self) -> bool {
        self.facing_right
    }

    pub fn attack_kind(&self) -> Option<AttackKind> {
        self.attack
    }

    pub fn attack_frame(&self) -> u32 {
        self.attack_frame
    }

    pub fn attack_duration(&self) -> u32 {
        self.attack_duration
    }

    pub fn attack_box(&self) -> Option<Rect> {
        self.attack_box
    }

    pub fn is_attacking(&self) -> bool {
        self.attack.is_some()
    }

    pub fn is_blocking(&self) -> bool {
        self.is_blocking
    }

    pub fn is_hit(&self) -> bool {
        self.is_hit
    }

    pub fn hit_stun(&self) -> u32 {
        self.hit_stun
    }

    pub fn hit_cooldown(&self) -> u32 {
        self.hit_cooldown
    }

    pub fn special_cooldown(&self) -> u32 {
        self.special_cooldown
    }

    pub fn special_ready(&self) -> bool {
        self.special_cooldown == 0
    }

    pub fn animation_state(&self) -> AnimationState {
        self.animation
    }

    pub fn animation_frame(&self) -> u8 {
        self.animation_frame
    }

    /// Blink phase for the hit flash: on for two ticks, off for two
    pub fn hit_flash(&self) -> bool {
        self.is_hit && self.hit_stun % 4 < 2
    }
}
