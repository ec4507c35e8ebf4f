//! Real-time driver: runs a match on a fixed tick interval
//!
//! Human input arrives on an mpsc channel and is held until replaced, the way
//! a key stays down between frames. Snapshots are broadcast to any number of
//! presentation subscribers.

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::ai::AiPolicy;
use crate::game::events::{GameEvent, MatchStats};
use crate::game::fighter::Side;
use crate::game::physics::Arena;
use crate::game::r#match::{MatchController, MatchMode, MatchPhase};
use crate::game::snapshot::{MatchSnapshot, SnapshotBuilder, SnapshotStats};
use crate::input::Intent;
use crate::util::time::{snapshot_interval, tick_duration, SIMULATION_TPS, SNAPSHOT_TPS};

/// Intent update for one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub side: Side,
    pub intent: Intent,
}

/// Tick loop settings
#[derive(Debug, Clone, Copy)]
pub struct RunnerOptions {
    pub sim_tps: u32,
    pub snapshot_tps: u32,
    /// Stop after this many ticks; 0 runs until game over
    pub max_ticks: u64,
    pub arena: Arena,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            sim_tps: SIMULATION_TPS,
            snapshot_tps: SNAPSHOT_TPS,
            max_ticks: 0,
            arena: Arena::default(),
        }
    }
}

/// Handle to a running match
#[derive(Clone)]
pub struct RunnerHandle {
    pub match_id: Uuid,
    pub input_tx: mpsc::Sender<PlayerInput>,
    pub snapshot_tx: broadcast::Sender<MatchSnapshot>,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub match_id: Uuid,
    pub ticks: u64,
    pub phase: MatchPhase,
    pub winner: Option<Side>,
    pub p1_wins: u32,
    pub p2_wins: u32,
    /// Present when the match reached game over
    pub stats: Option<MatchStats>,
    pub snapshots_sent: u64,
}

/// Drives a [`MatchController`] in real time
pub struct MatchRunner {
    controller: MatchController,
    /// Optional CPU standing in for side one's human input
    autopilot: Option<AiPolicy>,
    held: [Intent; 2],
    input_rx: mpsc::Receiver<PlayerInput>,
    snapshot_tx: broadcast::Sender<MatchSnapshot>,
    snapshot_builder: SnapshotBuilder,
    snapshot_stats: SnapshotStats,
    options: RunnerOptions,
    ticks: u64,
    final_stats: Option<MatchStats>,
}

impl MatchRunner {
    pub fn new(
        controller: MatchController,
        autopilot: Option<AiPolicy>,
        options: RunnerOptions,
    ) -> (Self, RunnerHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);

        let handle = RunnerHandle {
            match_id: controller.id(),
            input_tx,
            snapshot_tx: snapshot_tx.clone(),
        };

        let runner = Self {
            controller,
            autopilot,
            held: [Intent::default(); 2],
            input_rx,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(snapshot_interval(
                options.sim_tps,
                options.snapshot_tps,
            )),
            snapshot_stats: SnapshotStats::default(),
            options,
            ticks: 0,
            final_stats: None,
        };

        (runner, handle)
    }

    pub fn controller(&self) -> &MatchController {
        &self.controller
    }

    /// Leave the menu; the opening events go out with the first snapshot
    pub fn start(&mut self, mode: MatchMode) {
        let events = self.controller.start_game(mode);
        self.snapshot_builder.push_events(events);
    }

    /// Run the tick loop until game over or the tick limit
    pub async fn run(mut self) -> RunSummary {
        info!(
            match_id = %self.controller.id(),
            tps = self.options.sim_tps,
            autopilot = self.autopilot.is_some(),
            "Runner started"
        );

        let mut tick_interval = interval(tick_duration(self.options.sim_tps));
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tick_interval.tick().await;

            self.step();

            if self.controller.phase() == MatchPhase::GameOver {
                break;
            }

            if self.options.max_ticks > 0 && self.ticks >= self.options.max_ticks {
                info!(match_id = %self.controller.id(), ticks = self.ticks, "Tick limit reached");
                break;
            }
        }

        self.finish()
    }

    /// One tick without waiting: drain input, simulate, maybe broadcast
    pub fn step(&mut self) -> Vec<GameEvent> {
        self.process_inputs();

        let intents = self.current_intents();
        let events = self.controller.tick(intents, self.options.arena);
        self.ticks += 1;

        for event in &events {
            if let GameEvent::MatchEnded { stats, .. } = event {
                self.final_stats = Some(stats.clone());
            }
        }

        self.snapshot_builder.push_events(events.clone());
        if self.snapshot_builder.should_send() {
            self.broadcast();
        }

        events
    }

    /// Latest intent per side wins
    fn process_inputs(&mut self) {
        while let Ok(input) = self.input_rx.try_recv() {
            debug!(side = ?input.side, intent = ?input.intent, "Input received");
            self.held[input.side.index()] = input.intent;
        }
    }

    fn current_intents(&mut self) -> [Intent; 2] {
        let mut intents = self.held;
        if self.controller.phase() == MatchPhase::Playing {
            if let Some(autopilot) = self.autopilot.as_mut() {
                intents[0] = autopilot.next_intent(
                    self.controller.fighter(Side::One),
                    self.controller.fighter(Side::Two),
                );
            }
        }
        intents
    }

    fn broadcast(&mut self) {
        let snapshot = self.snapshot_builder.build(&self.controller);
        let bytes = serde_json::to_vec(&snapshot).map(|b| b.len()).unwrap_or(0);
        self.snapshot_stats.record(snapshot.events.len(), bytes);

        // No subscribers is fine
        let _ = self.snapshot_tx.send(snapshot);
    }

    fn finish(mut self) -> RunSummary {
        // Flush events that have not been sent yet
        self.broadcast();

        let state = self.controller.state();
        let summary = RunSummary {
            match_id: self.controller.id(),
            ticks: self.ticks,
            phase: state.phase,
            winner: state.winner,
            p1_wins: state.p1_wins,
            p2_wins: state.p2_wins,
            stats: self.final_stats.take(),
            snapshots_sent: self.snapshot_stats.total_snapshots,
        };

        if summary.phase != MatchPhase::GameOver {
            warn!(match_id = %summary.match_id, phase = ?summary.phase, "Runner stopped before game over");
        }
        info!(
            match_id = %summary.match_id,
            ticks = summary.ticks,
            winner = ?summary.winner,
            snapshots = summary.snapshots_sent,
            snapshot_bytes = self.snapshot_stats.total_bytes,
            "Runner finished"
        );

        summary
    }
}
