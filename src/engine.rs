//! Real-time simulation engine
//!
//! Owns the authoritative `GameState` and a clock thread that resolves one
//! tick per period through the `TurnSync` rendezvous. Agents only ever see
//! copies of the state and talk to the engine through an [`Environment`].

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::{Action, GameState, Physics, Reward, State, tick};
use crate::sync::{AgentId, TickOutcome, TurnSync};

/// Summary handed to termination subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Termination {
    /// Paddle returns before the miss
    pub bounces: u32,
    /// Ticks resolved, including the one that missed
    pub ticks: u64,
}

#[derive(Debug, Default)]
struct Subscribers {
    waiting: Vec<Sender<Termination>>,
    fired: Option<Termination>,
}

#[derive(Debug)]
struct Shared {
    world: Mutex<GameState>,
    sync: TurnSync,
    physics: Physics,
    subscribers: Mutex<Subscribers>,
}

impl Shared {
    fn world(&self) -> MutexGuard<'_, GameState> {
        self.world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn summary(&self) -> Termination {
        let world = self.world();
        Termination {
            bounces: world.bounces,
            ticks: world.ticks,
        }
    }

    /// Wake every subscriber once; later calls are no-ops
    fn notify_termination(&self) {
        let summary = self.summary();
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        if subscribers.fired.is_some() {
            return;
        }
        subscribers.fired = Some(summary);
        for waiter in subscribers.waiting.drain(..) {
            // A dropped receiver just means nobody is listening anymore
            let _ = waiter.send(summary);
        }
    }
}

/// A running episode: game state plus its tick clock
#[derive(Debug)]
pub struct Engine {
    shared: Arc<Shared>,
    agent: AgentId,
    clock: Option<JoinHandle<()>>,
}

impl Engine {
    /// Centered board with a random launch; the clock starts immediately
    pub fn new<R: Rng>(rng: &mut R, physics: Physics, tick_period: Duration) -> Self {
        Self::start(GameState::new(rng), physics, tick_period)
    }

    /// Start the clock on an explicit initial state
    pub fn start(game: GameState, physics: Physics, tick_period: Duration) -> Self {
        let agent = AgentId::fresh();
        let shared = Arc::new(Shared {
            world: Mutex::new(game),
            sync: TurnSync::new(agent),
            physics,
            subscribers: Mutex::new(Subscribers::default()),
        });

        let clock_shared = Arc::clone(&shared);
        let clock = thread::Builder::new()
            .name("pong-clock".into())
            .spawn(move || run_clock(&clock_shared, tick_period));
        let clock = match clock {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::error!("Failed to spawn clock thread: {e}");
                shared.sync.close();
                shared.notify_termination();
                None
            }
        };

        Self {
            shared,
            agent,
            clock,
        }
    }

    /// Handle bound to the registered participant
    pub fn environment(&self) -> Environment<'_> {
        Environment {
            engine: self,
            agent: self.agent,
        }
    }

    /// Copy of the current board
    pub fn get_state(&self, _agent: AgentId) -> State {
        self.shared.world().state
    }

    /// Submit `action` for the next tick and block until that tick completes
    pub fn perform_action(&self, agent: AgentId, action: Action) -> Reward {
        self.shared.sync.submit(agent, action)
    }

    pub fn is_over(&self) -> bool {
        self.shared.sync.is_over()
    }

    /// Register a waiter to receive exactly one [`Termination`]
    ///
    /// Subscribing after the episode has ended delivers immediately.
    pub fn subscribe_to_termination(&self, waiter: Sender<Termination>) {
        let mut subscribers = self
            .shared
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match subscribers.fired {
            Some(summary) => {
                let _ = waiter.send(summary);
            }
            None => subscribers.waiting.push(waiter),
        }
    }

    /// Paddle returns so far
    pub fn number_of_bounces(&self) -> u32 {
        self.shared.world().bounces
    }

    /// Ticks resolved so far
    pub fn ticks(&self) -> u64 {
        self.shared.world().ticks
    }

    /// Bounce and tick counts as they stand now
    pub fn summary(&self) -> Termination {
        self.shared.summary()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shared.sync.close();
        if let Some(clock) = self.clock.take() {
            if clock.join().is_err() {
                log::error!("Clock thread panicked");
            }
        }
    }
}

fn run_clock(shared: &Shared, tick_period: Duration) {
    log::debug!("Clock started, {tick_period:?} per tick");
    loop {
        if shared.sync.pace(tick_period) {
            break;
        }
        let over = shared.sync.complete_tick(|action| {
            let mut world = shared.world();
            let report = tick(&mut world, action, &shared.physics);
            TickOutcome {
                reward: report.reward,
                over: world.over,
            }
        });
        if over {
            break;
        }
    }
    shared.notify_termination();
    log::debug!("Clock stopped");
}

/// An agent's view of a running engine
#[derive(Debug, Clone, Copy)]
pub struct Environment<'a> {
    engine: &'a Engine,
    agent: AgentId,
}

impl<'a> Environment<'a> {
    /// Handle for an arbitrary id; only the registered participant may act
    pub fn new(engine: &'a Engine, agent: AgentId) -> Self {
        Self { engine, agent }
    }

    /// Id this handle acts as
    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// Copy of the current board
    pub fn get_state(&self) -> State {
        self.engine.get_state(self.agent)
    }

    /// Act for the next tick; blocks until it completes and returns its reward
    pub fn perform_action(&self, action: Action) -> Reward {
        self.engine.perform_action(self.agent, action)
    }

    /// Episode still running
    pub fn is_active(&self) -> bool {
        !self.engine.is_over()
    }
}
