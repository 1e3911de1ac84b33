//! Tunables for the engine and the learning agents
//!
//! Loaded from a JSON file; any field left out takes its default from
//! [`crate::consts`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;
use crate::sim::Physics;

/// Settings failed to load or validate
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid setting `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// RNG stream used for ball launches
pub const LAUNCH_STREAM: u64 = 0;
/// RNG stream used for agent exploration
pub const AGENT_STREAM: u64 = 1;

/// Engine and agent tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Real-time tick period
    pub tick_ms: u64,
    pub paddle_half_length: f64,
    /// Paddle displacement per tick at full move factor
    pub paddle_step: f64,
    /// Buckets per continuous dimension of the learning grid
    pub partitions: usize,
    /// γ
    pub discount: f64,
    /// λ
    pub trace_decay: f64,
    /// Monte Carlo episodes per practice/play cycle
    pub cycle_length: u64,
    /// Trailing episodes of each cycle played greedily
    pub play_episodes: u64,
    /// Fixed seed for reproducible runs; OS entropy when absent
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_ms: TICK_MS,
            paddle_half_length: PADDLE_HALF_LENGTH,
            paddle_step: PADDLE_STEP,
            partitions: PARTITIONS,
            discount: DISCOUNT,
            trace_decay: TRACE_DECAY,
            cycle_length: CYCLE_LENGTH,
            play_episodes: PLAY_EPISODES,
            seed: None,
        }
    }
}

impl Settings {
    /// Read, parse and validate a JSON settings file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        fn invalid(name: &'static str, reason: impl Into<String>) -> SettingsError {
            SettingsError::Invalid {
                name,
                reason: reason.into(),
            }
        }

        if !(1..=MAX_PARTITIONS).contains(&self.partitions) {
            return Err(invalid(
                "partitions",
                format!("must lie in 1..={MAX_PARTITIONS}"),
            ));
        }
        if !(self.paddle_half_length > 0.0 && self.paddle_half_length < 1.0) {
            return Err(invalid("paddle_half_length", "must lie in (0, 1)"));
        }
        if !(self.paddle_step > 0.0 && self.paddle_step.is_finite()) {
            return Err(invalid("paddle_step", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(invalid("discount", "must lie in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.trace_decay) {
            return Err(invalid("trace_decay", "must lie in [0, 1]"));
        }
        if self.cycle_length == 0 {
            return Err(invalid("cycle_length", "must be at least 1"));
        }
        if self.play_episodes > self.cycle_length {
            return Err(invalid(
                "play_episodes",
                format!("{} exceeds cycle_length {}", self.play_episodes, self.cycle_length),
            ));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn physics(&self) -> Physics {
        Physics {
            paddle_half_length: self.paddle_half_length,
            paddle_step: self.paddle_step,
        }
    }

    /// Independent RNG per stream; reproducible when a seed is set
    pub fn rng(&self, stream: u64) -> Pcg32 {
        match self.seed {
            Some(seed) => Pcg32::seed_from_u64(seed.wrapping_add(stream)),
            None => Pcg32::from_rng(&mut rand::rng()),
        }
    }
}
