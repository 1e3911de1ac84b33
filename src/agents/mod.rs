//! Decision-making agents
//!
//! Every agent drives one episode through an [`Environment`] and gets a
//! bookkeeping hook once the episode is over.

pub mod grid;
pub mod monte_carlo;
pub mod td;
pub mod tracker;

pub use grid::{Cell, Grid, Table};
pub use monte_carlo::{Mode, MonteCarlo};
pub use td::TemporalDifference;
pub use tracker::Tracker;

use crate::engine::Environment;

/// A decision maker that plays episodes through an [`Environment`]
///
/// `explore` runs on its own thread while the engine clock ticks; `terminate`
/// runs on that same thread after the episode is over.
pub trait Agent: Send {
    /// Act until the environment reports the episode is over
    fn explore(&mut self, env: &Environment<'_>);

    /// Post-episode bookkeeping (value updates, counters)
    fn terminate(&mut self) {}
}
