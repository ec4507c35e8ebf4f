//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;

use crate::game::ai::Difficulty;
use crate::game::physics::Arena;
use crate::game::r#match::{MatchMode, MatchRules};
use crate::util::time::{MAX_TPS, SIMULATION_TPS, SNAPSHOT_TPS};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,

    /// Simulation ticks per second
    pub sim_tps: u32,
    /// Snapshots pushed to stdout per second
    pub snapshot_tps: u32,

    /// Who drives side two
    pub mode: MatchMode,
    /// Drive side one with a CPU policy instead of idle input
    pub autopilot: bool,
    pub autopilot_difficulty: Difficulty,
    /// Seed for every CPU policy; random when unset
    pub seed: Option<u64>,

    pub viewport_width: f32,
    pub viewport_height: f32,

    pub wins_needed: u32,
    pub max_rounds: u32,
    /// Stop after this many ticks; 0 runs until game over
    pub max_ticks: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cpu_difficulty: Difficulty = parse_or(&lookup, "CPU_DIFFICULTY", Difficulty::Medium)?;
        let mode = match raw("MATCH_MODE").as_deref().map(str::trim) {
            None | Some("cpu") => MatchMode::VsCpu(cpu_difficulty),
            Some("versus") => MatchMode::Versus,
            Some(_) => return Err(ConfigError::Invalid("MATCH_MODE")),
        };

        let config = Self {
            log_level: raw("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format: parse_or(&lookup, "LOG_FORMAT", LogFormat::Pretty)?,

            sim_tps: parse_or(&lookup, "SIM_TPS", SIMULATION_TPS)?,
            snapshot_tps: parse_or(&lookup, "SNAPSHOT_TPS", SNAPSHOT_TPS)?,

            mode,
            autopilot: parse_or(&lookup, "AUTOPILOT", true)?,
            autopilot_difficulty: parse_or(&lookup, "AUTOPILOT_DIFFICULTY", Difficulty::Medium)?,
            seed: match raw("SEED") {
                Some(seed) => Some(seed.trim().parse().map_err(|_| ConfigError::Invalid("SEED"))?),
                None => None,
            },

            viewport_width: parse_or(&lookup, "VIEWPORT_WIDTH", 1280.0)?,
            viewport_height: parse_or(&lookup, "VIEWPORT_HEIGHT", 720.0)?,

            wins_needed: parse_or(&lookup, "WINS_NEEDED", 2)?,
            max_rounds: parse_or(&lookup, "MAX_ROUNDS", 3)?,
            max_ticks: parse_or(&lookup, "MAX_TICKS", 0)?,
        };

        if config.sim_tps == 0 || config.sim_tps > MAX_TPS {
            return Err(ConfigError::Invalid("SIM_TPS"));
        }
        if config.snapshot_tps == 0 {
            return Err(ConfigError::Invalid("SNAPSHOT_TPS"));
        }
        config.arena()?;
        if config.wins_needed == 0 || config.wins_needed.checked_mul(2).is_none() {
            return Err(ConfigError::Invalid("WINS_NEEDED"));
        }
        config
            .rules()
            .validate()
            .map_err(|_| ConfigError::Invalid("MAX_ROUNDS"))?;

        Ok(config)
    }

    /// Arena fitted to the configured viewport
    pub fn arena(&self) -> Result<Arena, ConfigError> {
        Arena::fit_viewport(self.viewport_width, self.viewport_height)
            .map_err(|_| ConfigError::Invalid("VIEWPORT_WIDTH"))
    }

    pub fn rules(&self) -> MatchRules {
        MatchRules {
            wins_needed: self.wins_needed,
            max_rounds: self.max_rounds,
            ..MatchRules::default()
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.sim_tps, 60);
        assert_eq!(config.snapshot_tps, 20);
        assert_eq!(config.mode, MatchMode::VsCpu(Difficulty::Medium));
        assert!(config.autopilot);
        assert!(config.seed.is_none());
        assert_eq!(config.max_ticks, 0);

        let arena = config.arena().unwrap();
        assert_eq!(arena.width, 800.0);
        assert_eq!(arena.height, 450.0);
        assert!((arena.ground_y - 382.5).abs() < 1e-4);
    }

    #[test]
    fn parses_overrides() {
        let config = load(&[
            ("LOG_FORMAT", "json"),
            ("MATCH_MODE", "versus"),
            ("AUTOPILOT", "false"),
            ("SEED", "1234"),
            ("WINS_NEEDED", "3"),
            ("MAX_ROUNDS", "5"),
            ("MAX_TICKS", "600"),
        ])
        .unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.mode, MatchMode::Versus);
        assert!(!config.autopilot);
        assert_eq!(config.seed, Some(1234));
        assert_eq!(config.rules().wins_needed, 3);
        assert_eq!(config.max_ticks, 600);
    }

    #[test]
    fn cpu_difficulty_flows_into_mode() {
        let config = load(&[("CPU_DIFFICULTY", "hard"), ("SIM_TPS", "1000000")]).unwrap();
        assert_eq!(config.sim_tps, 1_000_000);
        assert_eq!(config.mode, MatchMode::VsCpu(Difficulty::Hard));
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            load(&[("MATCH_MODE", "online")]).unwrap_err(),
            ConfigError::Invalid("MATCH_MODE")
        );
        assert_eq!(
            load(&[("CPU_DIFFICULTY", "brutal")]).unwrap_err(),
            ConfigError::Invalid("CPU_DIFFICULTY")
        );
        assert_eq!(
            load(&[("SIM_TPS", "0")]).unwrap_err(),
            ConfigError::Invalid("SIM_TPS")
        );
        assert_eq!(
            load(&[("SEED", "abc")]).unwrap_err(),
            ConfigError::Invalid("SEED")
        );
        assert_eq!(
            load(&[("SIM_TPS", "2000000")]).unwrap_err(),
            ConfigError::Invalid("SIM_TPS")
        );
        assert_eq!(
            load(&[("WINS_NEEDED", "0")]).unwrap_err(),
            ConfigError::Invalid("WINS_NEEDED")
        );
        assert_eq!(
            load(&[("WINS_NEEDED", "2147483648")]).unwrap_err(),
            ConfigError::Invalid("WINS_NEEDED")
        );
        assert_eq!(
            load(&[("WINS_NEEDED", "3")]).unwrap_err(),
            ConfigError::Invalid("MAX_ROUNDS")
        );
        assert_eq!(
            load(&[("MAX_ROUNDS", "2")]).unwrap_err(),
            ConfigError::Invalid("MAX_ROUNDS")
        );
        assert_eq!(
            load(&[("VIEWPORT_WIDTH", "-10")]).unwrap_err(),
            ConfigError::Invalid("VIEWPORT_WIDTH")
        );
    }
}
