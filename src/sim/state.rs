//! Game state and core simulation types
//!
//! `State` is the snapshot agents see. `GameState` adds the bookkeeping only
//! the engine needs (bounce and tick counters, terminal flag).

use glam::DVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Paddle movement direction
///
/// `Up` moves toward y = -1, `Down` toward y = +1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    #[default]
    None,
    Down,
}

impl Direction {
    /// Fixed enumeration order used for greedy tie-breaking
    pub const ALL: [Direction; 3] = [Direction::Up, Direction::None, Direction::Down];

    /// Signed unit step
    pub fn sign(self) -> f64 {
        match self {
            Direction::Up => -1.0,
            Direction::None => 0.0,
            Direction::Down => 1.0,
        }
    }

    /// Bucket index in `0..3`
    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::None => 1,
            Direction::Down => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// What an agent asks the paddle to do on the next tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
    pub direction: Direction,
    /// Scales the per-tick paddle step, in [-1, 1]
    pub move_factor: f64,
}

impl Action {
    pub fn new(direction: Direction, move_factor: f64) -> Self {
        Self {
            direction,
            move_factor: move_factor.clamp(-1.0, 1.0),
        }
    }

    /// Full-speed move in `direction`
    pub fn full(direction: Direction) -> Self {
        Self::new(direction, 1.0)
    }

    /// Signed paddle displacement for a given step size
    pub fn displacement(&self, step: f64) -> f64 {
        step * self.direction.sign() * self.move_factor
    }
}

/// Outcome of a tick as seen by the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Reward {
    /// Paddle returned the ball
    Good,
    #[default]
    None,
    /// Paddle missed; the episode is over
    Bad,
}

impl Reward {
    pub fn value(self) -> f64 {
        match self {
            Reward::Good => 1.0,
            Reward::None => 0.0,
            Reward::Bad => -1.0,
        }
    }
}

/// Snapshot of the board, copied out to agents
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct State {
    pub paddle_y: f64,
    pub ball_pos: DVec2,
    /// Displacement per tick
    pub ball_vel: DVec2,
}

impl State {
    /// Centered paddle and ball with the given launch velocity
    pub fn centered(ball_vel: DVec2) -> Self {
        Self {
            paddle_y: 0.0,
            ball_pos: DVec2::ZERO,
            ball_vel,
        }
    }
}

/// Paddle geometry and speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    pub paddle_half_length: f64,
    pub paddle_step: f64,
}

impl Default for Physics {
    fn default() -> Self {
        Self {
            paddle_half_length: PADDLE_HALF_LENGTH,
            paddle_step: PADDLE_STEP,
        }
    }
}

impl Physics {
    /// Lowest legal paddle center
    pub fn paddle_min(&self) -> f64 {
        -1.0 + self.paddle_half_length
    }

    /// Highest legal paddle center
    pub fn paddle_max(&self) -> f64 {
        1.0 - self.paddle_half_length
    }

    /// Whether a wall contact at `y` is covered by a paddle centered at `paddle_y`
    pub fn paddle_covers(&self, paddle_y: f64, y: f64) -> bool {
        (y - paddle_y).abs() <= self.paddle_half_length
    }
}

/// Sample a launch velocity with `|dx| >= |dy| > 0`
///
/// `dy` is drawn from [-0.5, 0.5) and its magnitude is added to `dx` so the
/// horizontal component always dominates. Near-zero draws are resampled.
pub fn launch_velocity<R: Rng>(rng: &mut R) -> DVec2 {
    loop {
        let mut dx: f64 = rng.random_range(-1.0..1.0);
        let dy: f64 = rng.random_range(-0.5..0.5);
        dx += sign(dx) * dy.abs();
        if dx.abs() >= MIN_LAUNCH_COMPONENT && dy.abs() >= MIN_LAUNCH_COMPONENT {
            return DVec2::new(dx, dy);
        }
        log::trace!("Resampling degenerate launch velocity ({dx}, {dy})");
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Authoritative engine state for one episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub state: State,
    /// Successful paddle returns so far
    pub bounces: u32,
    /// Ticks resolved so far
    pub ticks: u64,
    /// Set once by the miss that ends the episode
    pub over: bool,
}

impl GameState {
    /// Centered board with a freshly sampled launch
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        Self::from_state(State::centered(launch_velocity(rng)))
    }

    /// Start from an explicit snapshot
    pub fn from_state(state: State) -> Self {
        Self {
            state,
            bounces: 0,
            ticks: 0,
            over: false,
        }
    }
}
