//! Match state machine and the deterministic per-tick update
//!
//! `MatchController` owns both fighters, the CPU policy and the round/win
//! record. The host calls [`MatchController::tick`] once per frame with both
//! sides' intents and the current arena geometry, and reads back events and
//! state. There are no wall-clock timers: every delay is a tick countdown.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::ai::{AiPolicy, Difficulty};
use super::combat::{CombatResolver, HitResult};
use super::error::{SetupError, SetupResult};
use super::events::{FighterStats, GameEvent, MatchStats};
use super::fighter::{Fighter, Side};
use super::physics::Arena;
use crate::input::Intent;
use crate::util::time::{ms_to_ticks, SIMULATION_TPS};

/// Spawn x as a fraction of arena width
const SPAWN_ONE_RATIO: f32 = 0.2;
const SPAWN_TWO_RATIO: f32 = 0.7;

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Title screen, no match running
    Menu,
    /// Round in progress
    Playing,
    /// A fighter was knocked out; waiting for the next round or game over
    RoundEnd,
    /// A side reached the required wins
    GameOver,
}

/// Who controls side two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "difficulty", rename_all = "snake_case")]
pub enum MatchMode {
    /// Side two is the CPU
    VsCpu(Difficulty),
    /// Both sides take human intents
    Versus,
}

/// Round and timing rules
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchRules {
    pub max_rounds: u32,
    /// First side to reach this many round wins takes the match
    pub wins_needed: u32,
    /// Input freeze at the start of every round
    pub round_start_delay: u32,
    /// Pause after a non-deciding knock-out before the next round
    pub round_end_delay: u32,
    /// Pause after the deciding knock-out before game over
    pub game_over_delay: u32,
    pub round_announce_ticks: u32,
    pub ko_announce_ticks: u32,
    pub winner_announce_ticks: u32,
}

impl MatchRules {
    pub fn validate(&self) -> SetupResult<()> {
        if self.wins_needed == 0 {
            return Err(SetupError::InvalidRules("wins_needed must be at least 1"));
        }
        let Some(rounds_required) = self.wins_needed.checked_mul(2).map(|n| n - 1) else {
            return Err(SetupError::InvalidRules("wins_needed is too large"));
        };
        if self.max_rounds < rounds_required {
            return Err(SetupError::InvalidRules(
                "max_rounds must allow a side to reach wins_needed",
            ));
        }
        Ok(())
    }
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            wins_needed: 2,
            round_start_delay: 90,
            round_end_delay: ms_to_ticks(1500, SIMULATION_TPS),
            game_over_delay: ms_to_ticks(2000, SIMULATION_TPS),
            round_announce_ticks: 90,
            ko_announce_ticks: 90,
            winner_announce_ticks: 120,
        }
    }
}

/// Overlay text with its remaining display time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub text: String,
    pub remaining: u32,
}

/// The round/win record of a match
#[derive(Debug, Clone, PartialEq)]
pub struct MatchState {
    pub phase: MatchPhase,
    pub round: u32,
    pub p1_wins: u32,
    pub p2_wins: u32,
    /// Ticks of input freeze left in the current round
    pub round_start_delay: u32,
    /// Ticks left before leaving `RoundEnd`
    pub post_round_timer: u32,
    /// Set once a side has reached the required wins
    pub winner: Option<Side>,
    pub announcement: Option<Announcement>,
    /// Ticks elapsed since the controller was created
    pub tick: u64,
    /// Tick at which the current match started
    pub started_at: u64,
}

impl MatchState {
    fn new() -> Self {
        Self {
            phase: MatchPhase::Menu,
            round: 1,
            p1_wins: 0,
            p2_wins: 0,
            round_start_delay: 0,
            post_round_timer: 0,
            winner: None,
            announcement: None,
            tick: 0,
            started_at: 0,
        }
    }

    pub fn wins(&self, side: Side) -> u32 {
        match side {
            Side::One => self.p1_wins,
            Side::Two => self.p2_wins,
        }
    }

    fn add_win(&mut self, side: Side) -> u32 {
        let wins = match side {
            Side::One => &mut self.p1_wins,
            Side::Two => &mut self.p2_wins,
        };
        *wins += 1;
        *wins
    }
}

/// Owns a match: both fighters, the CPU policy and the round record
pub struct MatchController {
    id: Uuid,
    rules: MatchRules,
    mode: Option<MatchMode>,
    state: MatchState,
    fighters: [Fighter; 2],
    ai: AiPolicy,
    arena: Arena,
    stats: [FighterStats; 2],
}

impl MatchController {
    pub fn new(rules: MatchRules, arena: Arena, ai: AiPolicy) -> SetupResult<Self> {
        rules.validate()?;

        let fighters = [
            Self::spawn_fighter(Side::One, &arena),
            Self::spawn_fighter(Side::Two, &arena),
        ];

        Ok(Self {
            id: Uuid::new_v4(),
            rules,
            mode: None,
            state: MatchState::new(),
            fighters,
            ai,
            arena,
            stats: [FighterStats::default(); 2],
        })
    }

    fn spawn_point(side: Side, arena: &Arena, fighter_height: f32) -> (f32, f32) {
        let ratio = match side {
            Side::One => SPAWN_ONE_RATIO,
            Side::Two => SPAWN_TWO_RATIO,
        };
        (arena.width * ratio, arena.ground_y - fighter_height)
    }

    fn spawn_fighter(side: Side, arena: &Arena) -> Fighter {
        let mut fighter = Fighter::spawn(side, 0.0, 0.0);
        let (x, y) = Self::spawn_point(side, arena, fighter.height());
        fighter.reset(x, y);
        fighter
    }

    // ---- lifecycle commands ---------------------------------------------

    /// Leave the menu and start round one. Ignored outside the menu.
    pub fn start_game(&mut self, mode: MatchMode) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.state.phase != MatchPhase::Menu {
            return events;
        }

        if let MatchMode::VsCpu(difficulty) = mode {
            self.ai.set_difficulty(difficulty);
        }
        self.mode = Some(mode);
        self.state.started_at = self.state.tick;

        info!(match_id = %self.id, mode = ?mode, "Match started");

        self.begin_round(&mut events);
        events
    }

    /// Put both fighters back on their spawn points for a new round.
    /// Win counters and the round number are untouched.
    pub fn reset_round(&mut self) {
        for fighter in &mut self.fighters {
            let side = fighter.side();
            let (x, y) = Self::spawn_point(side, &self.arena, fighter.height());
            fighter.reset(x, y);
            fighter.set_facing_right(side == Side::One);
        }
    }

    /// Full reset back to the menu: round, wins, stats and CPU state
    pub fn reset_game(&mut self) {
        let tick = self.state.tick;
        self.state = MatchState::new();
        self.state.tick = tick;
        self.mode = None;
        self.stats = [FighterStats::default(); 2];
        self.ai.reset();
        self.reset_round();
    }

    /// Start a fresh match with the same mode. Only valid after game over.
    pub fn rematch(&mut self) -> Vec<GameEvent> {
        let Some(mode) = self.mode else {
            return Vec::new();
        };
        if self.state.phase != MatchPhase::GameOver {
            return Vec::new();
        }

        let mut events = vec![GameEvent::PhaseChanged {
            from: MatchPhase::GameOver,
            to: MatchPhase::Menu,
        }];
        self.reset_game();
        events.extend(self.start_game(mode));
        events
    }

    /// Abandon whatever is running and go back to the menu
    pub fn return_to_menu(&mut self) -> Vec<GameEvent> {
        let from = self.state.phase;
        let had_announcement = self.state.announcement.is_some();
        if from != MatchPhase::Menu {
            info!(match_id = %self.id, phase = ?from, "Returning to menu");
        }
        self.reset_game();

        let mut events = Vec::new();
        if had_announcement {
            events.push(GameEvent::AnnouncementCleared);
        }
        if from != MatchPhase::Menu {
            events.push(GameEvent::PhaseChanged {
                from,
                to: MatchPhase::Menu,
            });
        }
        events
    }

    /// Explicitly abandon the running match
    pub fn abandon(&mut self) -> Vec<GameEvent> {
        self.return_to_menu()
    }

    /// Change the CPU tier; takes effect on the next decision
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.ai.set_difficulty(difficulty);
        if let Some(MatchMode::VsCpu(_)) = self.mode {
            self.mode = Some(MatchMode::VsCpu(difficulty));
        }
    }

    // ---- tick -----------------------------------------------------------

    /// Advance the match by one tick.
    ///
    /// `intents` holds side one's and side two's human input; side two's is
    /// ignored in CPU mode. Order within the tick: timers, intent gathering,
    /// intent application (skipped during the round-start freeze), combat
    /// resolution, round-end evaluation.
    pub fn tick(&mut self, intents: [Intent; 2], arena: Arena) -> Vec<GameEvent> {
        let mut events = Vec::new();
        self.arena = arena;
        self.state.tick += 1;

        self.tick_announcement(&mut events);
        self.state.round_start_delay = self.state.round_start_delay.saturating_sub(1);

        match self.state.phase {
            MatchPhase::Playing => {
                let intents = self.gather_intents(intents);
                if self.state.round_start_delay == 0 {
                    for (fighter, intent) in self.fighters.iter_mut().zip(intents.iter()) {
                        Self::apply_intent(fighter, intent);
                    }
                }

                let [one, two] = &mut self.fighters;
                let hits = CombatResolver::resolve(one, two, &self.arena);
                self.record_hits(hits, &mut events);

                self.check_round_end(&mut events);
            }
            MatchPhase::RoundEnd => {
                self.state.post_round_timer = self.state.post_round_timer.saturating_sub(1);
                if self.state.post_round_timer == 0 {
                    match self.state.winner {
                        Some(winner) => self.end_game(winner, &mut events),
                        None => self.start_next_round(&mut events),
                    }
                }
            }
            MatchPhase::Menu | MatchPhase::GameOver => {}
        }

        events
    }

    fn gather_intents(&mut self, intents: [Intent; 2]) -> [Intent; 2] {
        match self.mode {
            Some(MatchMode::VsCpu(_)) => {
                let cpu = self.ai.next_intent(&self.fighters[1], &self.fighters[0]);
                [intents[0], cpu]
            }
            _ => intents,
        }
    }

    /// Map an intent onto fighter commands, same for human and CPU
    pub fn apply_intent(fighter: &mut Fighter, intent: &Intent) {
        if intent.left {
            fighter.move_left();
        } else if intent.right {
            fighter.move_right();
        } else {
            fighter.stop();
        }

        if intent.jump {
            fighter.jump();
        }
        if intent.punch {
            fighter.punch();
        }
        if intent.kick {
            fighter.kick();
        }
        if intent.special {
            fighter.special();
        }
        fighter.block(intent.block);
    }

    fn record_hits(&mut self, hits: Vec<HitResult>, events: &mut Vec<GameEvent>) {
        for hit in hits {
            let attacker = &mut self.stats[hit.attacker.index()];
            attacker.hits_landed += 1;
            attacker.damage_dealt += hit.damage;

            let defender = &mut self.stats[hit.defender.index()];
            defender.damage_taken += hit.damage;
            if hit.blocked {
                defender.hits_blocked += 1;
            }

            events.push(GameEvent::Hit {
                attacker: hit.attacker,
                defender: hit.defender,
                attack: hit.attack,
                damage: hit.damage,
                blocked: hit.blocked,
                defender_health: hit.defender_health,
            });
        }
    }

    /// Side one's knock-out is checked first, so a double K.O. goes to side two
    fn check_round_end(&mut self, events: &mut Vec<GameEvent>) {
        let winner = if self.fighters[0].is_knocked_out() {
            Side::Two
        } else if self.fighters[1].is_knocked_out() {
            Side::One
        } else {
            return;
        };

        let wins = self.state.add_win(winner);
        let decisive = wins >= self.rules.wins_needed;

        info!(
            match_id = %self.id,
            round = self.state.round,
            winner = ?winner,
            p1_wins = self.state.p1_wins,
            p2_wins = self.state.p2_wins,
            "Round over"
        );

        self.set_phase(MatchPhase::RoundEnd, events);
        events.push(GameEvent::KnockOut {
            round: self.state.round,
            winner,
            p1_wins: self.state.p1_wins,
            p2_wins: self.state.p2_wins,
            decisive,
        });

        if decisive {
            self.state.winner = Some(winner);
            self.state.post_round_timer = self.rules.game_over_delay;
            let text = format!("{} WINS!", self.fighters[winner.index()].name());
            self.announce(text, self.rules.winner_announce_ticks, events);
        } else {
            self.state.post_round_timer = self.rules.round_end_delay;
            self.announce("K.O.!".to_string(), self.rules.ko_announce_ticks, events);
        }
    }

    fn start_next_round(&mut self, events: &mut Vec<GameEvent>) {
        self.state.round += 1;
        self.reset_round();
        self.begin_round(events);
    }

    fn begin_round(&mut self, events: &mut Vec<GameEvent>) {
        if self.state.round == 1 {
            self.reset_round();
        }
        self.set_phase(MatchPhase::Playing, events);
        self.state.round_start_delay = self.rules.round_start_delay;

        info!(match_id = %self.id, round = self.state.round, "Round started");

        events.push(GameEvent::RoundStarted {
            round: self.state.round,
            freeze_ticks: self.rules.round_start_delay,
        });
        let text = format!("ROUND {}", self.state.round);
        self.announce(text, self.rules.round_announce_ticks, events);
    }

    fn end_game(&mut self, winner: Side, events: &mut Vec<GameEvent>) {
        self.set_phase(MatchPhase::GameOver, events);
        if self.state.announcement.take().is_some() {
            events.push(GameEvent::AnnouncementCleared);
        }

        let stats = self.match_stats();
        info!(
            match_id = %self.id,
            winner = ?winner,
            rounds = stats.rounds_played,
            duration_ticks = stats.duration_ticks,
            "Match ended"
        );

        events.push(GameEvent::MatchEnded {
            winner,
            winner_name: self.fighters[winner.index()].name().to_string(),
            stats,
        });
    }

    fn set_phase(&mut self, to: MatchPhase, events: &mut Vec<GameEvent>) {
        let from = self.state.phase;
        if from == to {
            return;
        }
        self.state.phase = to;
        events.push(GameEvent::PhaseChanged { from, to });
    }

    fn announce(&mut self, text: String, ticks: u32, events: &mut Vec<GameEvent>) {
        debug!(match_id = %self.id, text = %text, ticks, "Announcement");
        events.push(GameEvent::Announcement {
            text: text.clone(),
            ticks,
        });
        self.state.announcement = Some(Announcement {
            text,
            remaining: ticks,
        });
    }

    fn tick_announcement(&mut self, events: &mut Vec<GameEvent>) {
        if let Some(announcement) = self.state.announcement.as_mut() {
            announcement.remaining = announcement.remaining.saturating_sub(1);
            if announcement.remaining == 0 {
                self.state.announcement = None;
                events.push(GameEvent::AnnouncementCleared);
            }
        }
    }

    fn match_stats(&self) -> MatchStats {
        MatchStats {
            rounds_played: self.state.round,
            duration_ticks: self.state.tick - self.state.started_at,
            fighters: self.stats,
        }
    }

    // ---- queries --------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    pub fn mode(&self) -> Option<MatchMode> {
        self.mode
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn phase(&self) -> MatchPhase {
        self.state.phase
    }

    pub fn round(&self) -> u32 {
        self.state.round
    }

    pub fn p1_wins(&self) -> u32 {
        self.state.p1_wins
    }

    pub fn p2_wins(&self) -> u32 {
        self.state.p2_wins
    }

    pub fn wins_needed(&self) -> u32 {
        self.rules.wins_needed
    }

    pub fn winner(&self) -> Option<Side> {
        self.state.winner
    }

    /// True while the round-start freeze ignores input
    pub fn is_frozen(&self) -> bool {
        self.state.phase == MatchPhase::Playing && self.state.round_start_delay > 0
    }

    pub fn announcement(&self) -> Option<&Announcement> {
        self.state.announcement.as_ref()
    }

    pub fn fighter(&self, side: Side) -> &Fighter {
        &self.fighters[side.index()]
    }

    pub fn fighters(&self) -> &[Fighter; 2] {
        &self.fighters
    }

    pub fn stats(&self, side: Side) -> &FighterStats {
        &self.stats[side.index()]
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn ai(&self) -> &AiPolicy {
        &self.ai
    }
}
