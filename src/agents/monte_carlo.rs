//! Episodic Monte Carlo control
//!
//! Episodes come in cycles: most are practice (uniformly random actions,
//! trajectory recorded), the trailing few are played greedily from the
//! learned values. At episode end the recorded trajectory is replayed
//! backwards and each visited cell's value becomes the running mean of the
//! discounted returns observed from it.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::Agent;
use super::grid::{Grid, Table};
use crate::engine::Environment;
use crate::settings::{AGENT_STREAM, Settings};
use crate::sim::{Action, Direction, Reward, State};

/// Which half of the cycle an episode belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Random exploration, trajectory recorded
    Practice,
    /// Greedy exploitation
    Play,
}

/// One recorded tick of a practice episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Step {
    state: State,
    action: Action,
    reward: Reward,
}

/// Every-visit Monte Carlo control over the discretized grid
pub struct MonteCarlo {
    grid: Grid,
    visits: Table<u32>,
    values: Table<f64>,
    trajectory: Vec<Step>,
    episodes: u64,
    discount: f64,
    cycle_length: u64,
    play_episodes: u64,
    rng: Pcg32,
}

impl MonteCarlo {
    /// Zeroed tables sized by `settings.partitions`, agent RNG stream
    pub fn new(settings: &Settings) -> Self {
        let grid = Grid::new(settings.partitions);
        Self {
            grid,
            visits: Table::new(grid),
            values: Table::new(grid),
            trajectory: Vec::new(),
            episodes: 0,
            discount: settings.discount,
            cycle_length: settings.cycle_length.max(1),
            play_episodes: settings.play_episodes,
            rng: settings.rng(AGENT_STREAM),
        }
    }

    /// Mode of the upcoming episode, fixed by how many have finished
    pub fn mode(&self) -> Mode {
        if self.episodes % self.cycle_length >= self.cycle_length.saturating_sub(self.play_episodes)
        {
            Mode::Play
        } else {
            Mode::Practice
        }
    }

    /// Episodes finished so far
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Discretization of the value table
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Steps recorded so far in the current episode
    pub fn trajectory_len(&self) -> usize {
        self.trajectory.len()
    }

    /// Mean discounted return observed from `(state, action)`
    pub fn value(&self, state: &State, action: &Action) -> f64 {
        self.values.at(state, action)
    }

    /// Times `(state, action)` was folded into its mean
    pub fn visits(&self, state: &State, action: &Action) -> u32 {
        self.visits.at(state, action)
    }

    /// Best-valued action at `state`, as played in `Mode::Play`
    pub fn greedy_action(&self, state: &State) -> Action {
        self.values.greedy(state).0
    }

    fn random_action(&mut self) -> Action {
        let direction = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
        Action::new(direction, self.rng.random_range(-1.0..=1.0))
    }

    /// Append one step to the current trajectory
    pub fn record(&mut self, state: State, action: Action, reward: Reward) {
        self.trajectory.push(Step {
            state,
            action,
            reward,
        });
    }

    /// Fold the recorded trajectory into the value table and start a new episode
    pub fn finish_episode(&mut self) {
        let mut ret = 0.0;
        for step in self.trajectory.iter().rev() {
            ret = step.reward.value() + self.discount * ret;

            let cell = self.grid.cell(&step.state, &step.action);
            let visits = self.visits.get_mut(cell);
            *visits += 1;
            let n = f64::from(*visits);
            let value = self.values.get_mut(cell);
            *value += (ret - *value) / n;
        }

        log::debug!(
            "Monte Carlo episode {} processed {} steps",
            self.episodes,
            self.trajectory.len()
        );
        self.trajectory.clear();
        self.episodes += 1;
    }

    fn practice(&mut self, env: &Environment<'_>) {
        while env.is_active() {
            let state = env.get_state();
            let action = self.random_action();
            let reward = env.perform_action(action);
            self.record(state, action, reward);
        }
    }

    fn play(&self, env: &Environment<'_>) {
        while env.is_active() {
            let state = env.get_state();
            let (action, value) = self.values.greedy(&state);
            log::trace!("Greedy {action:?} valued {value:.4}");
            env.perform_action(action);
        }
    }
}

impl Agent for MonteCarlo {
    fn explore(&mut self, env: &Environment<'_>) {
        let mode = self.mode();
        log::debug!("Monte Carlo episode {} in {mode:?} mode", self.episodes);
        match mode {
            Mode::Practice => self.practice(env),
            Mode::Play => self.play(env),
        }
    }

    fn terminate(&mut self) {
        self.finish_episode();
    }
}
