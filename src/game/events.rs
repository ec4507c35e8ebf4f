//! Events emitted by the match tick for the host to poll
//! These replace timed callbacks: every transition is reported here

use serde::{Deserialize, Serialize};

use super::combat::AttackKind;
use super::fighter::Side;
use super::r#match::MatchPhase;

/// Game events (hits, knock-outs, phase changes, announcements)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Match moved to a new phase
    PhaseChanged {
        from: MatchPhase,
        to: MatchPhase,
    },

    /// A round began; input is frozen for `freeze_ticks`
    RoundStarted {
        round: u32,
        freeze_ticks: u32,
    },

    /// Hit registered
    Hit {
        attacker: Side,
        defender: Side,
        attack: AttackKind,
        damage: f32,
        blocked: bool,
        defender_health: f32,
    },

    /// A fighter was knocked out and the round is over
    KnockOut {
        round: u32,
        winner: Side,
        p1_wins: u32,
        p2_wins: u32,
        /// This knock-out decided the match
        decisive: bool,
    },

    /// Match over
    MatchEnded {
        winner: Side,
        winner_name: String,
        stats: MatchStats,
    },

    /// Overlay text to show for `ticks` ticks
    Announcement {
        text: String,
        ticks: u32,
    },

    /// Overlay text expired or was dismissed
    AnnouncementCleared,
}

/// Match statistics at end
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub rounds_played: u32,
    pub duration_ticks: u64,
    pub fighters: [FighterStats; 2],
}

/// Per-side combat tallies for one match
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FighterStats {
    pub hits_landed: u32,
    /// Incoming hits absorbed by blocking
    pub hits_blocked: u32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
}
