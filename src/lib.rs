//! Pong RL - single-paddle continuous Pong with learning agents
//!
//! Core modules:
//! - `sim`: Physics (kinematics, game state, tick resolution)
//! - `sync`: Per-tick action/reward rendezvous between clock and agent
//! - `engine`: Real-time tick clock owning the authoritative state
//! - `session`: Runs one episode and reports its bounce count
//! - `agents`: Agent trait plus Monte Carlo and TD(λ) estimators
//! - `settings`: Tunables loaded from JSON
//! - `scoreboard`: Bounce history and best episodes of a run

pub mod agents;
pub mod engine;
pub mod scoreboard;
pub mod session;
pub mod settings;
pub mod sim;
pub mod sync;

pub use agents::{Agent, MonteCarlo, TemporalDifference, Tracker};
pub use engine::{Engine, Environment, Termination};
pub use scoreboard::{Scoreboard, ScoreboardError};
pub use session::Session;
pub use settings::{Settings, SettingsError};
pub use sim::{Action, Direction, Reward, State};

/// Default tunables
pub mod consts {
    /// Real-time tick period in milliseconds
    pub const TICK_MS: u64 = 20;
    /// Maximum boundary crossings resolved within one tick
    pub const MAX_BOUNCES_PER_TICK: u32 = 16;

    /// Paddle half-length (the paddle spans paddle_y ± this)
    pub const PADDLE_HALF_LENGTH: f64 = 0.2;
    /// Paddle displacement per tick at |move_factor| = 1
    pub const PADDLE_STEP: f64 = 0.1;

    /// Buckets per continuous dimension in the learning grid
    pub const PARTITIONS: usize = 10;
    /// Largest accepted partition count (tables hold `3·P⁴` cells each)
    pub const MAX_PARTITIONS: usize = 32;
    /// Discount factor γ
    pub const DISCOUNT: f64 = 0.9;
    /// Eligibility trace decay λ
    pub const TRACE_DECAY: f64 = 0.9;

    /// Monte Carlo episodes per practice/play cycle
    pub const CYCLE_LENGTH: u64 = 10;
    /// Trailing episodes of each cycle played greedily
    pub const PLAY_EPISODES: u64 = 2;

    /// Launch components smaller than this are resampled
    pub const MIN_LAUNCH_COMPONENT: f64 = 1e-6;
}
