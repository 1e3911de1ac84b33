//! Physics simulation module
//!
//! Pure, single-threaded game logic. The engine wraps this in a clock:
//! - Board is the fixed square [-1, 1] x [-1, 1]
//! - The paddle lives on the right wall (x = +1)
//! - One call to `tick` resolves every bounce inside the tick

pub mod kinematics;
pub mod state;
pub mod tick;

pub use kinematics::{
    Crossing, Edge, ball_in_bounds, ball_on_board, distance, earliest_crossing, edge_crossing,
    move_ball,
};
pub use state::{Action, Direction, GameState, Physics, Reward, State, launch_velocity};
pub use tick::{GameEvent, TickReport, tick, update_paddle};
