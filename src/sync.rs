//! Per-tick rendezvous between the engine clock and one agent
//!
//! Two slots live behind one lock: the agent's pending action and the result
//! of the tick that consumed it. The clock resolves a tick while holding the
//! lock, fills the result slot, and broadcasts. The agent waits on a
//! predicate rather than a bare signal, so a wakeup can never be lost.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::sim::{Action, Reward};

static NEXT_AGENT_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a registered participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    /// Process-unique id, so a handle from one engine is foreign to every other
    pub fn fresh() -> Self {
        Self(NEXT_AGENT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What the clock reports after resolving a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    pub reward: Reward,
    /// The tick ended the episode
    pub over: bool,
}

#[derive(Debug)]
struct Turn {
    agent: AgentId,
    /// Applied on every tick until replaced
    action: Action,
    /// Agent is blocked in `submit`
    awaiting: bool,
    /// Reward of the first tick completed after the last submission
    result: Option<Reward>,
    completed: u64,
    over: bool,
}

/// Action-in / reward-out handshake for a single agent
#[derive(Debug)]
pub struct TurnSync {
    turn: Mutex<Turn>,
    tick_done: Condvar,
}

impl TurnSync {
    /// Rendezvous registered to `agent`, holding still until it acts
    pub fn new(agent: AgentId) -> Self {
        Self {
            turn: Mutex::new(Turn {
                agent,
                action: Action::default(),
                awaiting: false,
                result: None,
                completed: 0,
                over: false,
            }),
            tick_done: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Turn> {
        self.turn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Agent side: store `action` and block until a tick has consumed it
    ///
    /// Returns that tick's reward. Unregistered callers and calls made after
    /// termination get `Reward::None` immediately.
    pub fn submit(&self, agent: AgentId, action: Action) -> Reward {
        let mut turn = self.lock();
        if turn.agent != agent {
            log::error!("Unregistered agent {agent:?} tried to perform an action");
            return Reward::None;
        }
        if turn.over {
            return Reward::None;
        }

        turn.action = action;
        turn.awaiting = true;
        turn.result = None;

        let mut turn = self
            .tick_done
            .wait_while(turn, |t| t.result.is_none() && !t.over)
            .unwrap_or_else(PoisonError::into_inner);
        turn.awaiting = false;
        turn.result.take().unwrap_or_default()
    }

    /// Clock side: resolve one tick against the pending action and wake the agent
    ///
    /// `resolve` runs under the rendezvous lock, so the agent can neither
    /// swap its action nor miss the result mid-tick. Returns whether the
    /// episode is over; once it is, `resolve` is never called again.
    pub fn complete_tick<F>(&self, resolve: F) -> bool
    where
        F: FnOnce(&Action) -> TickOutcome,
    {
        let mut turn = self.lock();
        if turn.over {
            return true;
        }

        let outcome = resolve(&turn.action);
        turn.completed += 1;
        if turn.awaiting && turn.result.is_none() {
            turn.result = Some(outcome.reward);
        }
        turn.over = outcome.over;
        let over = turn.over;
        drop(turn);

        self.tick_done.notify_all();
        over
    }

    /// Clock side: sleep one tick period, cut short if the episode is closed
    ///
    /// Returns whether the episode is over.
    pub fn pace(&self, period: Duration) -> bool {
        let turn = self.lock();
        let (turn, _) = self
            .tick_done
            .wait_timeout_while(turn, period, |t| !t.over)
            .unwrap_or_else(PoisonError::into_inner);
        turn.over
    }

    /// Mark the episode over without a tick and release any waiter
    pub fn close(&self) {
        self.lock().over = true;
        self.tick_done.notify_all();
    }

    pub fn is_over(&self) -> bool {
        self.lock().over
    }

    /// Whether the agent is currently blocked waiting for a tick
    pub fn is_awaiting(&self) -> bool {
        self.lock().awaiting
    }

    pub fn completed_ticks(&self) -> u64 {
        self.lock().completed
    }

    /// The action the next tick will apply
    pub fn current_action(&self) -> Action {
        self.lock().action
    }
}
