//! Ball kinematics on the unit board
//!
//! Straight-line extrapolation and exact edge intersection. Nothing here holds
//! state; the tick resolver chains these calls to split a tick at each bounce.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Board edge, listed in tie-break priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Bottom,
    Top,
    Left,
    /// Paddle wall
    Right,
}

impl Edge {
    /// Priority order used when two crossings happen at the same instant.
    /// At an exact corner the earlier entry wins, so which wall "sees" the
    /// ball first depends on float rounding there.
    pub const ALL: [Edge; 4] = [Edge::Bottom, Edge::Top, Edge::Left, Edge::Right];

    /// Whether this edge reflects the horizontal velocity component
    pub fn is_vertical(self) -> bool {
        matches!(self, Edge::Left | Edge::Right)
    }
}

/// Where and when the ball meets an edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Crossing {
    pub edge: Edge,
    /// Fraction of a full tick needed to reach the edge
    pub t: f64,
    /// Contact point (the crossing coordinate is exactly ±1)
    pub point: DVec2,
}

/// Extrapolate the ball by `fraction` of a tick
#[inline]
pub fn move_ball(pos: DVec2, vel: DVec2, fraction: f64) -> DVec2 {
    pos + vel * fraction
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: DVec2, b: DVec2) -> f64 {
    a.distance(b)
}

/// Strictly inside the board
///
/// A position exactly on a wall is out of bounds, so travel that ends on a
/// wall is resolved as a contact within the same tick.
#[inline]
pub fn ball_in_bounds(pos: DVec2) -> bool {
    pos.x > -1.0 && pos.x < 1.0 && pos.y > -1.0 && pos.y < 1.0
}

/// Inside the board or on one of its walls
#[inline]
pub fn ball_on_board(pos: DVec2) -> bool {
    (-1.0..=1.0).contains(&pos.x) && (-1.0..=1.0).contains(&pos.y)
}

/// Intersection of the ball's path with one edge
///
/// Uses `t = (target - origin) / velocity_component`. Only edges the ball is
/// moving toward are considered, so a ball sitting on a wall after a bounce
/// cannot re-hit it at `t = 0`. Accepted when `0 <= t <= remaining` and the
/// perpendicular coordinate at `t` lies on the board.
pub fn edge_crossing(pos: DVec2, vel: DVec2, edge: Edge, remaining: f64) -> Option<Crossing> {
    let (target, along, speed, across, across_vel) = match edge {
        Edge::Bottom if vel.y < 0.0 => (-1.0, pos.y, vel.y, pos.x, vel.x),
        Edge::Top if vel.y > 0.0 => (1.0, pos.y, vel.y, pos.x, vel.x),
        Edge::Left if vel.x < 0.0 => (-1.0, pos.x, vel.x, pos.y, vel.y),
        Edge::Right if vel.x > 0.0 => (1.0, pos.x, vel.x, pos.y, vel.y),
        _ => return None,
    };

    let t = (target - along) / speed;
    if !(0.0..=remaining).contains(&t) {
        return None;
    }

    let other = across + across_vel * t;
    if !(-1.0..=1.0).contains(&other) {
        return None;
    }

    let point = if edge.is_vertical() {
        DVec2::new(target, other)
    } else {
        DVec2::new(other, target)
    };
    Some(Crossing { edge, t, point })
}

/// Earliest crossing among all four edges within `remaining`
///
/// Ties go to the edge listed first in [`Edge::ALL`].
pub fn earliest_crossing(pos: DVec2, vel: DVec2, remaining: f64) -> Option<Crossing> {
    let mut best: Option<Crossing> = None;
    for edge in Edge::ALL {
        if let Some(crossing) = edge_crossing(pos, vel, edge, remaining) {
            match best {
                Some(current) if crossing.t >= current.t => {}
                _ => best = Some(crossing),
            }
        }
    }
    best
}
