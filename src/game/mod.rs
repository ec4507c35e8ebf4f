//! Game simulation modules

pub mod ai;
pub mod combat;
pub mod error;
pub mod events;
pub mod fighter;
pub mod r#match;
pub mod physics;
pub mod snapshot;

pub use ai::{AiPolicy, Difficulty, DifficultyProfile, RollSource, ScriptedRolls, SeededRolls};
pub use combat::{AttackKind, AttackStats, CombatResolver, HitResult};
pub use error::{SetupError, SetupResult};
pub use events::{FighterStats, GameEvent, MatchStats};
pub use fighter::{AnimationState, Character, Fighter, FighterSpec, Side};
pub use physics::{Arena, Body, PhysicsSystem, Rect};
pub use r#match::{Announcement, MatchController, MatchMode, MatchPhase, MatchRules, MatchState};
pub use snapshot::{FighterSnapshot, MatchSnapshot, SnapshotBuilder, SnapshotStats};
