//! Discretized state/action grid shared by the learning agents
//!
//! A cell is `(ball_x, ball_y, paddle_y, direction, move_factor)`, each
//! continuous coordinate split into `partitions` equal buckets over [-1, 1].
//! Tables are flat vectors addressed by a row-major offset.

use serde::{Deserialize, Serialize};

use crate::consts::MAX_PARTITIONS;
use crate::sim::{Action, Direction, State};

/// Index of one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub ball_x: usize,
    pub ball_y: usize,
    pub paddle_y: usize,
    pub direction: usize,
    pub move_factor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    partitions: usize,
}

impl Grid {
    /// Bucket count is kept within `1..=MAX_PARTITIONS`
    pub fn new(partitions: usize) -> Self {
        Self {
            partitions: partitions.clamp(1, MAX_PARTITIONS),
        }
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.partitions.pow(4) * Direction::ALL.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `clamp(floor(P * (x + 1) / 2), 0, P - 1)`; NaN maps to bucket 0
    pub fn discretize(&self, x: f64) -> usize {
        let bucket = (self.partitions as f64 * (x + 1.0) / 2.0).floor();
        if bucket.is_nan() || bucket < 0.0 {
            0
        } else {
            (bucket as usize).min(self.partitions - 1)
        }
    }

    /// Representative value of a bucket (its midpoint)
    pub fn bucket_center(&self, index: usize) -> f64 {
        -1.0 + (2 * index + 1) as f64 / self.partitions as f64
    }

    pub fn cell(&self, state: &State, action: &Action) -> Cell {
        Cell {
            ball_x: self.discretize(state.ball_pos.x),
            ball_y: self.discretize(state.ball_pos.y),
            paddle_y: self.discretize(state.paddle_y),
            direction: action.direction.index(),
            move_factor: self.discretize(action.move_factor),
        }
    }

    /// Row-major offset into a flat table
    pub fn offset(&self, cell: Cell) -> usize {
        let p = self.partitions;
        (((cell.ball_x * p + cell.ball_y) * p + cell.paddle_y) * Direction::ALL.len()
            + cell.direction)
            * p
            + cell.move_factor
    }

    /// Action represented by a `(direction, move_factor bucket)` pair
    pub fn action(&self, direction: Direction, move_factor: usize) -> Action {
        Action::new(direction, self.bucket_center(move_factor))
    }

    /// All actions in fixed `(direction, move_factor)` order
    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        Direction::ALL
            .into_iter()
            .flat_map(move |d| (0..self.partitions).map(move |m| self.action(d, m)))
    }
}

/// Dense per-cell table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table<T> {
    grid: Grid,
    cells: Vec<T>,
}

impl<T: Copy + Default> Table<T> {
    /// Every entry starts at `T::default()`
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            cells: vec![T::default(); grid.len()],
        }
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn get(&self, cell: Cell) -> T {
        self.cells[self.grid.offset(cell)]
    }

    pub fn get_mut(&mut self, cell: Cell) -> &mut T {
        let offset = self.grid.offset(cell);
        &mut self.cells[offset]
    }

    /// Entry for `state` taking `action`
    pub fn at(&self, state: &State, action: &Action) -> T {
        self.get(self.grid.cell(state, action))
    }

    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.cells
    }

    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }
}

impl Table<f64> {
    /// Highest-valued action at `state`
    ///
    /// Scans actions in [`Grid::actions`] order and keeps the first maximum.
    pub fn greedy(&self, state: &State) -> (Action, f64) {
        let mut best: Option<(Action, f64)> = None;
        for action in self.grid.actions() {
            let value = self.at(state, &action);
            match best {
                Some((_, top)) if value <= top => {}
                _ => best = Some((action, value)),
            }
        }
        best.unwrap_or_default()
    }
}
