//! Fighter kinematics, arena geometry and rectangle overlap

use serde::{Deserialize, Serialize};

use super::error::{SetupError, SetupResult};

/// Downward acceleration applied every airborne tick
pub const GRAVITY: f32 = 0.8;
/// Vertical velocity set by a jump (negative is up)
pub const JUMP_IMPULSE: f32 = -15.0;
/// Horizontal walking speed per tick
pub const WALK_SPEED: f32 = 5.0;

/// Largest arena the viewport fit will produce
pub const MAX_ARENA_WIDTH: f32 = 800.0;
pub const MAX_ARENA_HEIGHT: f32 = 450.0;
/// Ground line as a fraction of arena height
pub const GROUND_RATIO: f32 = 0.85;

/// Axis-aligned rectangle, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Strict overlap test: touching edges do not count as a hit
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

/// Playfield geometry supplied by the viewport each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    /// Horizontal extent; fighters are clamped to `[0, width - fighter_width]`
    pub width: f32,
    /// Full viewport height (presentation only)
    pub height: f32,
    /// Y coordinate of the floor
    pub ground_y: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32, ground_y: f32) -> SetupResult<Self> {
        if !(width > 0.0) || !(ground_y > 0.0) || !(height >= ground_y) {
            return Err(SetupError::InvalidArena { width, ground_y });
        }
        Ok(Self {
            width,
            height,
            ground_y,
        })
    }

    /// Fit a 16:9 arena inside a window, capped for a crisp pixel look
    pub fn fit_viewport(window_width: f32, window_height: f32) -> SetupResult<Self> {
        let mut width = window_width;
        let mut height = window_width * 9.0 / 16.0;

        if height > window_height {
            height = window_height;
            width = window_height * 16.0 / 9.0;
        }

        let width = width.min(MAX_ARENA_WIDTH);
        let height = height.min(MAX_ARENA_HEIGHT);

        Self::new(width, height, height * GROUND_RATIO)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self {
            width: MAX_ARENA_WIDTH,
            height: MAX_ARENA_HEIGHT,
            ground_y: MAX_ARENA_HEIGHT * GROUND_RATIO,
        }
    }
}

/// Position, velocity and extent of one fighter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub width: f32,
    pub height: f32,
    pub grounded: bool,
}

impl Body {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            vel_x: 0.0,
            vel_y: 0.0,
            width,
            height,
            grounded: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Physics integration for fighter bodies
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Advance a body by one tick.
    ///
    /// Gravity only accumulates while airborne. When `horizontal_locked` is set
    /// (hit-stun) the horizontal velocity is kept but not applied. The ground is
    /// a hard floor and the arena walls clamp the body every tick.
    pub fn integrate(body: &mut Body, arena: &Arena, horizontal_locked: bool) {
        if !body.grounded {
            body.vel_y += GRAVITY;
        }

        if !horizontal_locked {
            body.x += body.vel_x;
        }
        body.y += body.vel_y;

        if body.y + body.height >= arena.ground_y {
            body.y = arena.ground_y - body.height;
            body.vel_y = 0.0;
            body.grounded = true;
        } else {
            body.grounded = false;
        }

        Self::clamp_to_arena(body, arena);
    }

    /// Keep the body between the arena walls
    pub fn clamp_to_arena(body: &mut Body, arena: &Arena) {
        if body.x < 0.0 {
            body.x = 0.0;
        }
        if body.x + body.width > arena.width {
            body.x = arena.width - body.width;
        }
    }

    /// Horizontal distance between two bodies' left edges
    pub fn horizontal_distance(a: &Body, b: &Body) -> f32 {
        (a.x - b.x).abs()
    }
}
