//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Team names handed out in creation order
pub const TEAM_NAMES: [&str; 8] = [
    "Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot", "Golf", "Hotel",
];

/// Deterministic name for the team at `index`
pub fn team_name(index: usize) -> String {
    TEAM_NAMES
        .get(index)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("Team {}", index + 1))
}

/// Settings the match itself consumes
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Grubs spawned per team
    pub grub_count: usize,
    /// Turn time limit in seconds (enforced by the runner)
    pub turn_seconds: f32,
    /// Ask every live zone to debug-draw each step
    pub zone_debug: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grub_count: 4,
            turn_seconds: 45.0,
            zone_debug: false,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Seed for the match RNG
    pub match_seed: u64,
    /// Teams created at match start
    pub team_count: usize,
    /// Hard stop for the headless runner
    pub max_turns: u32,
    /// Optional weapon catalog replacing the built-in one
    pub weapons_path: Option<PathBuf>,
    pub game: GameConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = GameConfig::default();

        let team_count = parse_var("TEAM_COUNT", 2usize)?;
        if team_count < 2 {
            return Err(ConfigError::Invalid {
                var: "TEAM_COUNT",
                value: team_count.to_string(),
            });
        }

        let grub_count = parse_var("GRUB_COUNT", defaults.grub_count)?;
        if grub_count == 0 {
            return Err(ConfigError::Invalid {
                var: "GRUB_COUNT",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            match_seed: parse_var("MATCH_SEED", rand::random::<u64>())?,
            team_count,
            max_turns: parse_var("MAX_TURNS", 200u32)?,
            weapons_path: env::var("WEAPONS_PATH").ok().map(PathBuf::from),
            game: GameConfig {
                grub_count,
                turn_seconds: parse_var("TURN_SECONDS", defaults.turn_seconds)?,
                zone_debug: parse_var("ZONE_DEBUG", defaults.zone_debug)?,
            },
        })
    }
}

fn parse_var<T: FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
