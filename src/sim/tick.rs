//! Fixed timestep simulation tick
//!
//! Advances the game by exactly one tick. The ball's travel is split at every
//! edge it meets, so a fast ball may bounce several times within one tick.

use serde::{Deserialize, Serialize};

use glam::DVec2;

use super::kinematics::{
    Edge, ball_in_bounds, ball_on_board, distance, earliest_crossing, move_ball,
};
use super::state::{Action, GameState, Physics, Reward};
use crate::consts::MAX_BOUNCES_PER_TICK;

/// Something that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Reflection off the top, bottom or left wall
    WallBounce { edge: Edge, point: DVec2 },
    /// Paddle returned the ball at wall height `y`
    PaddleBounce { y: f64 },
    /// Ball reached the paddle wall outside the paddle
    Miss { y: f64 },
}

/// Result of resolving one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub reward: Reward,
    /// Events in the order they happened
    pub events: Vec<GameEvent>,
    /// Path length the ball covered this tick
    pub traveled: f64,
}

/// Move the paddle by the action's displacement, kept fully on the board
pub fn update_paddle(paddle_y: f64, action: &Action, physics: &Physics) -> f64 {
    (paddle_y + action.displacement(physics.paddle_step))
        .clamp(physics.paddle_min(), physics.paddle_max())
}

/// Advance the game by one tick
///
/// The paddle moves first, then the ball. Once a miss has been recorded the
/// game is frozen and further calls report `Reward::None` without changes.
pub fn tick(game: &mut GameState, action: &Action, physics: &Physics) -> TickReport {
    let mut report = TickReport::default();
    if game.over {
        return report;
    }

    game.ticks += 1;
    let state = &mut game.state;
    state.paddle_y = update_paddle(state.paddle_y, action, physics);

    let mut remaining = 1.0;
    let mut crossings = 0;
    loop {
        let candidate = move_ball(state.ball_pos, state.ball_vel, remaining);
        if ball_in_bounds(candidate) {
            report.traveled += distance(state.ball_pos, candidate);
            state.ball_pos = candidate;
            break;
        }

        let crossing = if crossings < MAX_BOUNCES_PER_TICK {
            earliest_crossing(state.ball_pos, state.ball_vel, remaining)
        } else {
            None
        };
        let Some(crossing) = crossing else {
            // On a wall it is already leaving (contact resolved at the very end of the tick)
            if ball_on_board(candidate) {
                report.traveled += distance(state.ball_pos, candidate);
                state.ball_pos = candidate;
                break;
            }
            log::warn!(
                "Tick {}: no resolvable crossing from {:?} (remaining {remaining}), clamping",
                game.ticks,
                state.ball_pos
            );
            let clamped = candidate.clamp(DVec2::NEG_ONE, DVec2::ONE);
            report.traveled += distance(state.ball_pos, clamped);
            state.ball_pos = clamped;
            break;
        };
        crossings += 1;

        report.traveled += distance(state.ball_pos, crossing.point);
        state.ball_pos = crossing.point;
        remaining = (remaining - crossing.t).max(0.0);

        match crossing.edge {
            Edge::Bottom | Edge::Top => {
                state.ball_vel.y = -state.ball_vel.y;
                report.events.push(GameEvent::WallBounce {
                    edge: crossing.edge,
                    point: crossing.point,
                });
            }
            Edge::Left => {
                state.ball_vel.x = -state.ball_vel.x;
                report.events.push(GameEvent::WallBounce {
                    edge: crossing.edge,
                    point: crossing.point,
                });
            }
            Edge::Right => {
                let y = crossing.point.y;
                if physics.paddle_covers(state.paddle_y, y) {
                    state.ball_vel.x = -state.ball_vel.x;
                    game.bounces += 1;
                    report.reward = Reward::Good;
                    report.events.push(GameEvent::PaddleBounce { y });
                    log::debug!("Bounce {} at y={y:.3}", game.bounces);
                } else {
                    game.over = true;
                    report.reward = Reward::Bad;
                    report.events.push(GameEvent::Miss { y });
                    log::debug!(
                        "Miss at y={y:.3}, paddle at {:.3} after {} bounces",
                        state.paddle_y,
                        game.bounces
                    );
                    break;
                }
            }
        }
    }

    log::trace!(
        "Tick {}: ball {:?} vel {:?} paddle {:.3}",
        game.ticks,
        state.ball_pos,
        state.ball_vel,
        state.paddle_y
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Direction, State};
    use proptest::prelude::*;

    fn game_at(paddle_y: f64, pos: DVec2, vel: DVec2) -> GameState {
        GameState::from_state(State {
            paddle_y,
            ball_pos: pos,
            ball_vel: vel,
        })
    }

    #[test]
    fn test_tick_inside_board_has_no_events() {
        let mut game = game_at(0.0, DVec2::ZERO, DVec2::new(0.6, 0.1));
        let report = tick(&mut game, &Action::default(), &Physics::default());
        assert_eq!(report.reward, Reward::None);
        assert!(report.events.is_empty());
        assert!((game.state.ball_pos.x - 0.6).abs() < 1e-12);
        assert!((game.state.ball_pos.y - 0.1).abs() < 1e-12);
        assert_eq!(game.ticks, 1);
    }

    #[test]
    fn test_paddle_bounce_continues_with_remaining_fraction() {
        let physics = Physics::default();
        let mut game = game_at(0.0, DVec2::ZERO, DVec2::new(0.6, 0.1));
        tick(&mut game, &Action::default(), &physics);

        let report = tick(&mut game, &Action::default(), &physics);
        assert_eq!(report.reward, Reward::Good);
        assert_eq!(game.bounces, 1);
        assert!(!game.over);
        assert_eq!(report.events.len(), 1);
        assert!(matches!(report.events[0], GameEvent::PaddleBounce { y } if (y - 1.0 / 6.0).abs() < 1e-9));
        assert!((game.state.ball_vel.x + 0.6).abs() < 1e-12);
        // Remaining third of the tick is spent moving back left
        assert!((game.state.ball_pos.x - 0.8).abs() < 1e-9);
        assert!((game.state.ball_pos.y - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_miss_ends_game() {
        let physics = Physics::default();
        let mut game = game_at(0.8, DVec2::ZERO, DVec2::new(0.6, 0.1));
        tick(&mut game, &Action::default(), &physics);

        let report = tick(&mut game, &Action::default(), &physics);
        assert_eq!(report.reward, Reward::Bad);
        assert!(game.over);
        assert_eq!(game.bounces, 0);
        assert!(matches!(report.events.last(), Some(GameEvent::Miss { .. })));
        assert_eq!(game.state.ball_pos.x, 1.0);
    }

    #[test]
    fn test_contact_at_end_of_tick_resolves_in_that_tick() {
        let physics = Physics::default();
        let mut game = game_at(0.15, DVec2::ZERO, DVec2::new(0.5, 0.0));
        assert_eq!(tick(&mut game, &Action::default(), &physics).reward, Reward::None);

        // Second tick ends exactly on x = 1 while the paddle covers y = 0
        let report = tick(&mut game, &Action::default(), &physics);
        assert_eq!(report.reward, Reward::Good);
        assert_eq!(game.bounces, 1);
        assert!(!game.over);
        assert_eq!(game.state.ball_pos, DVec2::new(1.0, 0.0));
        assert_eq!(game.state.ball_vel, DVec2::new(-0.5, 0.0));
        assert!((report.traveled - 0.5).abs() < 1e-12);

        // Moving the paddle away afterwards cannot turn it into a miss
        let report = tick(&mut game, &Action::full(Direction::Down), &physics);
        assert_eq!(report.reward, Reward::None);
        assert!(!game.over);
        assert!(report.events.is_empty());
        assert!((game.state.ball_pos.x - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_miss_at_end_of_tick_ends_game_in_that_tick() {
        let physics = Physics::default();
        let mut game = game_at(0.5, DVec2::new(0.5, 0.0), DVec2::new(0.5, 0.0));
        let report = tick(&mut game, &Action::default(), &physics);
        assert_eq!(report.reward, Reward::Bad);
        assert!(game.over);
        assert_eq!(game.ticks, 1);
    }

    #[test]
    fn test_over_is_terminal() {
        let physics = Physics::default();
        let mut game = game_at(0.8, DVec2::new(0.9, 0.0), DVec2::new(0.5, 0.0));
        assert_eq!(tick(&mut game, &Action::default(), &physics).reward, Reward::Bad);
        let frozen = game.state;

        for _ in 0..5 {
            let report = tick(&mut game, &Action::full(Direction::Up), &physics);
            assert_eq!(report.reward, Reward::None);
            assert!(game.over);
        }
        assert_eq!(game.state, frozen);
        assert_eq!(game.ticks, 1);
    }

    #[test]
    fn test_wall_then_paddle_in_one_tick() {
        let physics = Physics::default();
        let mut game = game_at(0.8, DVec2::new(0.8, 0.9), DVec2::new(0.4, 0.4));
        let report = tick(&mut game, &Action::default(), &physics);

        assert_eq!(report.reward, Reward::Good);
        assert_eq!(report.events.len(), 2);
        assert!(matches!(report.events[0], GameEvent::WallBounce { edge: Edge::Top, .. }));
        assert!(matches!(report.events[1], GameEvent::PaddleBounce { .. }));
        assert!((game.state.ball_pos.x - 0.8).abs() < 1e-9);
        assert!((game.state.ball_pos.y - 0.7).abs() < 1e-9);
        assert!(game.state.ball_vel.x < 0.0 && game.state.ball_vel.y < 0.0);
    }

    #[test]
    fn test_left_wall_reflects() {
        let physics = Physics::default();
        let mut game = game_at(0.0, DVec2::new(-0.8, 0.0), DVec2::new(-0.4, 0.0));
        let report = tick(&mut game, &Action::default(), &physics);
        assert_eq!(report.reward, Reward::None);
        assert!(matches!(report.events[0], GameEvent::WallBounce { edge: Edge::Left, .. }));
        assert!((game.state.ball_pos.x + 0.8).abs() < 1e-9);
        assert!(game.state.ball_vel.x > 0.0);
    }

    #[test]
    fn test_paddle_clamped_at_edges() {
        let physics = Physics::default();
        let down = Action::full(Direction::Down);
        let mut paddle = 0.0;
        for _ in 0..50 {
            paddle = update_paddle(paddle, &down, &physics);
        }
        assert_eq!(paddle, physics.paddle_max());

        // Negative move factor reverses the direction
        let reversed = Action::new(Direction::Down, -1.0);
        assert!((update_paddle(0.0, &reversed, &physics) + physics.paddle_step).abs() < 1e-12);
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        (0usize..3, -1.0f64..=1.0).prop_map(|(d, f)| {
            Action::new(Direction::from_index(d).unwrap_or_default(), f)
        })
    }

    proptest! {
        #[test]
        fn tick_keeps_ball_and_paddle_on_board(
            x in -1.0f64..=1.0,
            y in -1.0f64..=1.0,
            dx in -1.5f64..1.5,
            dy in -1.5f64..1.5,
            paddle in -0.8f64..=0.8,
            actions in proptest::collection::vec(arb_action(), 1..20),
        ) {
            let physics = Physics::default();
            let mut game = game_at(paddle, DVec2::new(x, y), DVec2::new(dx, dy));
            for action in &actions {
                let bounces_before = game.bounces;
                let was_over = game.over;
                let report = tick(&mut game, action, &physics);

                prop_assert!(ball_on_board(game.state.ball_pos));
                prop_assert!(game.state.paddle_y >= physics.paddle_min());
                prop_assert!(game.state.paddle_y <= physics.paddle_max());
                if was_over {
                    prop_assert!(game.over);
                    prop_assert_eq!(report.reward, Reward::None);
                }
                match report.reward {
                    Reward::Good => prop_assert!(game.bounces > bounces_before),
                    Reward::Bad => prop_assert!(game.over),
                    Reward::None => prop_assert_eq!(game.bounces, bounces_before),
                }
            }
        }

        #[test]
        fn tick_travels_full_speed_unless_missed(
            x in -0.99f64..0.99,
            y in -0.99f64..0.99,
            dx in -1.5f64..1.5,
            dy in -1.0f64..1.0,
        ) {
            let physics = Physics::default();
            let mut game = game_at(0.0, DVec2::new(x, y), DVec2::new(dx, dy));
            let speed = game.state.ball_vel.length();
            let report = tick(&mut game, &Action::default(), &physics);
            if !game.over {
                prop_assert!((report.traveled - speed).abs() < 1e-9);
                prop_assert!((game.state.ball_vel.length() - speed).abs() < 1e-12);
            }
        }
    }
}
