//! Episode runner
//!
//! Starts an engine, lets the agent explore it on its own thread, waits for
//! the termination notice, joins the agent, and reports the bounce count.

use std::sync::mpsc;
use std::thread;

use rand_pcg::Pcg32;

use crate::agents::Agent;
use crate::engine::{Engine, Termination};
use crate::settings::{LAUNCH_STREAM, Settings};
use crate::sim::GameState;

/// Plays consecutive episodes with shared settings and one launch RNG
pub struct Session {
    settings: Settings,
    rng: Pcg32,
    episodes: u64,
}

impl Session {
    /// Launches draw from the `LAUNCH_STREAM` of `settings`
    pub fn new(settings: Settings) -> Self {
        let rng = settings.rng(LAUNCH_STREAM);
        Self {
            settings,
            rng,
            episodes: 0,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Episodes played so far
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Play one episode from a fresh random launch
    pub fn play_episode(&mut self, agent: &mut dyn Agent) -> u32 {
        let game = GameState::new(&mut self.rng);
        self.play_episode_from(agent, game)
    }

    /// Play one episode from an explicit starting state
    pub fn play_episode_from(&mut self, agent: &mut dyn Agent, game: GameState) -> u32 {
        let engine = Engine::start(game, self.settings.physics(), self.settings.tick_period());
        let (tx, rx) = mpsc::channel();
        engine.subscribe_to_termination(tx);
        let env = engine.environment();

        let termination = thread::scope(|scope| {
            let explorer = thread::Builder::new()
                .name("pong-agent".into())
                .spawn_scoped(scope, move || {
                    agent.explore(&env);
                    agent.terminate();
                });

            let termination = rx.recv().unwrap_or_else(|_| {
                log::error!("Termination channel closed without notice");
                engine.summary()
            });

            match explorer {
                Ok(handle) => {
                    if handle.join().is_err() {
                        log::error!("Agent thread panicked");
                    }
                }
                Err(e) => log::error!("Failed to spawn agent thread: {e}"),
            }
            termination
        });

        self.episodes += 1;
        let Termination { bounces, ticks } = termination;
        log::info!("Episode {}: {bounces} bounces in {ticks} ticks", self.episodes);
        bounces
    }
}
