//! Snapshot building for presentation layers

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::combat::AttackKind;
use super::events::GameEvent;
use super::fighter::{AnimationState, Fighter, Side};
use super::physics::Rect;
use super::r#match::{Announcement, MatchController, MatchPhase};

/// Everything a renderer needs to draw one fighter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterSnapshot {
    pub side: Side,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub facing_right: bool,
    pub health: f32,
    pub max_health: f32,
    pub low_health: bool,
    pub animation: AnimationState,
    pub anim_frame: u8,
    pub attack: Option<AttackKind>,
    pub attack_frame: u32,
    pub attack_duration: u32,
    pub attack_box: Option<Rect>,
    pub blocking: bool,
    pub hit_flash: bool,
    pub special_ready: bool,
}

impl From<&Fighter> for FighterSnapshot {
    fn from(f: &Fighter) -> Self {
        Self {
            side: f.side(),
            name: f.name().to_string(),
            x: f.x(),
            y: f.y(),
            width: f.width(),
            height: f.height(),
            facing_right: f.facing_right(),
            health: f.health(),
            max_health: f.max_health(),
            low_health: f.is_low_health(),
            animation: f.animation_state(),
            anim_frame: f.animation_frame(),
            attack: f.attack_kind(),
            attack_frame: f.attack_frame(),
            attack_duration: f.attack_duration(),
            attack_box: f.attack_box(),
            blocking: f.is_blocking(),
            hit_flash: f.hit_flash(),
            special_ready: f.special_ready(),
        }
    }
}

/// Full match state for one presentation frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub tick: u64,
    pub match_id: Uuid,
    pub phase: MatchPhase,
    pub round: u32,
    pub p1_wins: u32,
    pub p2_wins: u32,
    pub wins_needed: u32,
    /// Input is frozen for the round-start announcement
    pub frozen: bool,
    /// Overlay text with its remaining display ticks
    pub announcement: Option<Announcement>,
    pub fighters: [FighterSnapshot; 2],
    /// Events since the previous snapshot
    pub events: Vec<GameEvent>,
}

/// Builds snapshots at a fixed tick interval
pub struct SnapshotBuilder {
    /// Tick counter since last snapshot
    ticks_since_snapshot: u32,
    /// Snapshot interval in ticks
    snapshot_interval: u32,
    /// Events waiting for the next snapshot
    pending_events: Vec<GameEvent>,
}

impl SnapshotBuilder {
    pub fn new(snapshot_interval: u32) -> Self {
        Self {
            ticks_since_snapshot: 0,
            snapshot_interval: snapshot_interval.max(1),
            pending_events: Vec::new(),
        }
    }

    /// Check if it's time to send a snapshot
    pub fn should_send(&mut self) -> bool {
        self.ticks_since_snapshot += 1;
        if self.ticks_since_snapshot >= self.snapshot_interval {
            self.ticks_since_snapshot = 0;
            true
        } else {
            false
        }
    }

    /// Force snapshot on next check (phase changes, knock-outs)
    pub fn force_next(&mut self) {
        self.ticks_since_snapshot = self.snapshot_interval;
    }

    /// Queue a tick's events. Anything besides plain hits forces the next
    /// snapshot so state transitions reach the presentation layer promptly.
    pub fn push_events(&mut self, events: Vec<GameEvent>) {
        if events.iter().any(|e| !matches!(e, GameEvent::Hit { .. })) {
            self.force_next();
        }
        self.pending_events.extend(events);
    }

    /// Build a snapshot, draining queued events
    pub fn build(&mut self, controller: &MatchController) -> MatchSnapshot {
        let state = controller.state();
        let [one, two] = controller.fighters();

        MatchSnapshot {
            tick: state.tick,
            match_id: controller.id(),
            phase: state.phase,
            round: state.round,
            p1_wins: state.p1_wins,
            p2_wins: state.p2_wins,
            wins_needed: controller.wins_needed(),
            frozen: controller.is_frozen(),
            announcement: state.announcement.clone(),
            fighters: [one.into(), two.into()],
            events: std::mem::take(&mut self.pending_events),
        }
    }
}

/// Snapshot size stats for debugging
#[derive(Debug, Default)]
pub struct SnapshotStats {
    pub total_snapshots: u64,
    pub total_bytes: u64,
    pub avg_events_per_snapshot: f32,
}

impl SnapshotStats {
    pub fn record(&mut self, event_count: usize, bytes: usize) {
        self.total_snapshots += 1;
        self.total_bytes += bytes as u64;

        // Running average
        let n = self.total_snapshots as f32;
        self.avg_events_per_snapshot =
            self.avg_events_per_snapshot * ((n - 1.0) / n) + (event_count as f32 / n);
    }
}
