//! Online TD(λ) Q-learning with eligibility traces
//!
//! One update per tick. The TD error of the previous transition is spread
//! over every cell in proportion to its eligibility trace, scaled by the
//! cell's visit count, and all traces then decay by `λγ`.

use rand::Rng;
use rand_pcg::Pcg32;

use super::Agent;
use super::grid::{Grid, Table};
use crate::engine::Environment;
use crate::settings::{AGENT_STREAM, Settings};
use crate::sim::{Action, Direction, Reward, State};

/// TD(λ) Q-learning with ε-greedy exploration, ε = 1 / episodes
pub struct TemporalDifference {
    grid: Grid,
    visits: Table<u32>,
    q: Table<f64>,
    traces: Table<f64>,
    /// Previous tick's state and action, if this episode has one
    last: Option<(State, Action)>,
    last_reward: Reward,
    episodes: u64,
    discount: f64,
    trace_decay: f64,
    rng: Pcg32,
}

impl TemporalDifference {
    /// Zeroed Q, visit and trace tables; agent RNG stream
    pub fn new(settings: &Settings) -> Self {
        let grid = Grid::new(settings.partitions);
        Self {
            grid,
            visits: Table::new(grid),
            q: Table::new(grid),
            traces: Table::new(grid),
            last: None,
            last_reward: Reward::None,
            episodes: 0,
            discount: settings.discount,
            trace_decay: settings.trace_decay,
            rng: settings.rng(AGENT_STREAM),
        }
    }

    /// Episodes finished so far
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Discretization of the Q table
    pub fn grid(&self) -> Grid {
        self.grid
    }

    /// Current action-value estimate
    pub fn q_value(&self, state: &State, action: &Action) -> f64 {
        self.q.at(state, action)
    }

    /// Eligibility of `(state, action)` in the running episode
    pub fn trace(&self, state: &State, action: &Action) -> f64 {
        self.traces.at(state, action)
    }

    /// Updates applied to `(state, action)` across all episodes
    pub fn visits(&self, state: &State, action: &Action) -> u32 {
        self.visits.at(state, action)
    }

    /// Exploration rate `1 / episodes`; fully random before the first episode ends
    pub fn epsilon(&self) -> f64 {
        if self.episodes == 0 {
            1.0
        } else {
            1.0 / self.episodes as f64
        }
    }

    /// Learn from the transition into `state`, then pick the next action
    pub fn act(&mut self, state: &State) -> Action {
        self.learn(state);
        self.choose(state)
    }

    /// Remember what was done this tick for the next update
    pub fn remember(&mut self, state: State, action: Action, reward: Reward) {
        self.last = Some((state, action));
        self.last_reward = reward;
    }

    fn choose(&mut self, state: &State) -> Action {
        if self.rng.random::<f64>() < self.epsilon() {
            let direction = Direction::ALL[self.rng.random_range(0..Direction::ALL.len())];
            Action::new(direction, self.rng.random_range(-1.0..=1.0))
        } else {
            self.q.greedy(state).0
        }
    }

    /// Bootstrapped update of the previous transition
    fn learn(&mut self, current: &State) {
        let Some((last_state, last_action)) = self.last else {
            return;
        };
        let (_, q_best) = self.q.greedy(current);
        let target = self.last_reward.value() + self.discount * q_best;
        self.update(&last_state, &last_action, target);
    }

    /// `δ = target - Q(s, a)`, bump the trace of `(s, a)`, then sweep the table
    fn update(&mut self, state: &State, action: &Action, target: f64) {
        let cell = self.grid.cell(state, action);
        *self.visits.get_mut(cell) += 1;
        let delta = target - self.q.get(cell);
        *self.traces.get_mut(cell) += 1.0;

        let decay = self.trace_decay * self.discount;
        let visits = self.visits.as_slice();
        let q = self.q.as_mut_slice();
        for ((trace, value), &n) in self
            .traces
            .as_mut_slice()
            .iter_mut()
            .zip(q.iter_mut())
            .zip(visits)
        {
            if *trace == 0.0 {
                continue;
            }
            if n > 0 {
                *value += *trace / f64::from(n) * delta;
            }
            *trace *= decay;
        }
        log::trace!("TD update at {cell:?}: delta {delta:.4}");
    }

    /// Terminal update (no bootstrap) and reset of per-episode memory
    pub fn finish_episode(&mut self) {
        if let Some((state, action)) = self.last.take() {
            self.update(&state, &action, self.last_reward.value());
        }
        self.last_reward = Reward::None;
        self.traces.fill(0.0);
        self.episodes += 1;
        log::debug!("TD episode {} finished, epsilon now {:.4}", self.episodes, self.epsilon());
    }
}

impl Agent for TemporalDifference {
    fn explore(&mut self, env: &Environment<'_>) {
        while env.is_active() {
            let state = env.get_state();
            let action = self.act(&state);
            let reward = env.perform_action(action);
            self.remember(state, action, reward);
        }
    }

    fn terminate(&mut self) {
        self.finish_episode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    fn settings() -> Settings {
        Settings {
            partitions: 4,
            seed: Some(17),
            ..Settings::default()
        }
    }

    fn state(x: f64) -> State {
        State {
            paddle_y: 0.0,
            ball_pos: DVec2::new(x, 0.0),
            ball_vel: DVec2::new(0.5, 0.0),
        }
    }

    #[test]
    fn test_first_tick_does_not_learn() {
        let mut agent = TemporalDifference::new(&settings());
        let s = state(0.0);
        agent.act(&s);
        assert!(agent.visits.as_slice().iter().all(|&n| n == 0));
        assert!(agent.q.as_slice().iter().all(|&q| q == 0.0));
    }

    #[test]
    fn test_reward_propagates_to_previous_cell() {
        let mut agent = TemporalDifference::new(&settings());
        let grid = agent.grid();
        let s0 = state(-0.9);
        let a0 = grid.action(Direction::Down, 1);
        agent.remember(s0, a0, Reward::Good);
        agent.act(&state(0.9));

        // δ = 1 + γ·0 - 0, E = 1, n = 1
        assert!((agent.q_value(&s0, &a0) - 1.0).abs() < 1e-12);
        assert_eq!(agent.visits(&s0, &a0), 1);
        let decay = agent.trace_decay * agent.discount;
        assert!((agent.trace(&s0, &a0) - decay).abs() < 1e-12);
    }

    #[test]
    fn test_unvisited_trace_decays_geometrically() {
        let mut agent = TemporalDifference::new(&settings());
        let grid = agent.grid();
        let decay = agent.trace_decay * agent.discount;

        let s0 = state(-0.9);
        let a0 = grid.action(Direction::Up, 0);
        agent.remember(s0, a0, Reward::None);
        agent.act(&state(-0.4));

        let a1 = grid.action(Direction::Down, 3);
        let mut previous = agent.trace(&s0, &a0);
        for x in [-0.4, 0.1, 0.6] {
            agent.remember(state(x), a1, Reward::None);
            agent.act(&state(x + 0.5));
            let current = agent.trace(&s0, &a0);
            assert!(current < previous);
            assert!((current - previous * decay).abs() < 1e-12);
            previous = current;
        }
    }

    #[test]
    fn test_trace_weighted_update_reaches_earlier_cells() {
        let mut agent = TemporalDifference::new(&settings());
        let grid = agent.grid();
        let s0 = state(-0.9);
        let s1 = state(0.1);
        let a = grid.action(Direction::None, 2);

        agent.remember(s0, a, Reward::None);
        agent.act(&s1);
        assert_eq!(agent.q_value(&s0, &a), 0.0);

        agent.remember(s1, a, Reward::Bad);
        agent.finish_episode();

        // Terminal δ = -1 lands fully on s1 and on s0 through its decayed trace
        let decay = agent.trace_decay * agent.discount;
        assert!((agent.q_value(&s1, &a) + 1.0).abs() < 1e-12);
        assert!((agent.q_value(&s0, &a) + decay).abs() < 1e-12);
    }

    #[test]
    fn test_episode_end_clears_memory_not_values() {
        let mut agent = TemporalDifference::new(&settings());
        let grid = agent.grid();
        let s = state(0.0);
        let a = grid.action(Direction::Up, 1);
        agent.remember(s, a, Reward::Bad);
        agent.finish_episode();

        assert_eq!(agent.episodes(), 1);
        assert!(agent.traces.as_slice().iter().all(|&e| e == 0.0));
        assert!((agent.q_value(&s, &a) + 1.0).abs() < 1e-12);

        // Next episode's first tick has nothing to bootstrap from
        agent.act(&state(0.5));
        assert_eq!(agent.visits(&s, &a), 1);
    }

    #[test]
    fn test_epsilon_decays_with_episodes() {
        let mut agent = TemporalDifference::new(&settings());
        assert_eq!(agent.epsilon(), 1.0);
        for _ in 0..4 {
            agent.finish_episode();
        }
        assert!((agent.epsilon() - 0.25).abs() < 1e-12);
    }
}
