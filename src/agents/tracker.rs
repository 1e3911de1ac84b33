//! Scripted baseline: chase the ball's height at full speed

use super::Agent;
use crate::consts::PADDLE_HALF_LENGTH;
use crate::engine::Environment;
use crate::sim::{Action, Direction, State};

/// Keeps the ball within the paddle's span; never learns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tracker {
    half_length: f64,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new(PADDLE_HALF_LENGTH)
    }
}

impl Tracker {
    pub fn new(paddle_half_length: f64) -> Self {
        Self {
            half_length: paddle_half_length,
        }
    }

    /// Move toward the ball unless the paddle already covers it
    pub fn choose(&self, state: &State) -> Action {
        let ball_y = state.ball_pos.y;
        let direction = if state.paddle_y - self.half_length > ball_y {
            Direction::Up
        } else if state.paddle_y + self.half_length < ball_y {
            Direction::Down
        } else {
            Direction::None
        };
        Action::full(direction)
    }
}

impl Agent for Tracker {
    fn explore(&mut self, env: &Environment<'_>) {
        while env.is_active() {
            let action = self.choose(&env.get_state());
            env.perform_action(action);
        }
    }
}
