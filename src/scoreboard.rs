//! Per-run bounce leaderboard
//!
//! Keeps the full bounce history of a training run plus the ten best
//! episodes, and can be written to or read back from a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Scoreboard file could not be read, written or parsed
#[derive(Debug, Error)]
pub enum ScoreboardError {
    #[error("scoreboard file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scoreboard JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Maximum number of best episodes to keep
pub const MAX_BEST_EPISODES: usize = 10;

/// A single leaderboard entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeEntry {
    /// 1-indexed episode number
    pub episode: u64,
    pub bounces: u32,
}

/// Bounce leaderboard for one training run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scoreboard {
    /// Best episodes, sorted descending by bounces
    pub best: Vec<EpisodeEntry>,
    /// Bounce count of every episode in order
    pub history: Vec<u32>,
}

impl Scoreboard {
    /// Create an empty scoreboard
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a bounce count would enter the leaderboard
    pub fn qualifies(&self, bounces: u32) -> bool {
        if bounces == 0 {
            return false;
        }
        if self.best.len() < MAX_BEST_EPISODES {
            return true;
        }
        self.best.last().is_none_or(|e| bounces > e.bounces)
    }

    /// Rank a bounce count would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, bounces: u32) -> Option<usize> {
        if !self.qualifies(bounces) {
            return None;
        }
        let rank = self.best.iter().position(|e| bounces > e.bounces);
        Some(rank.unwrap_or(self.best.len()) + 1)
    }

    /// Record the next episode's result
    /// Returns the leaderboard rank achieved, if any
    pub fn record(&mut self, bounces: u32) -> Option<usize> {
        self.history.push(bounces);
        let episode = self.history.len() as u64;
        if !self.qualifies(bounces) {
            return None;
        }

        let entry = EpisodeEntry { episode, bounces };
        // Ties keep the earlier episode ahead
        let rank = match self.best.iter().position(|e| bounces > e.bounces) {
            Some(i) => {
                self.best.insert(i, entry);
                i + 1
            }
            None => {
                self.best.push(entry);
                self.best.len()
            }
        };
        self.best.truncate(MAX_BEST_EPISODES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Episodes recorded so far
    pub fn episodes(&self) -> usize {
        self.history.len()
    }

    /// Best episode (if any)
    pub fn top(&self) -> Option<EpisodeEntry> {
        self.best.first().copied()
    }

    /// Mean bounces over the last `window` episodes
    pub fn mean_recent(&self, window: usize) -> Option<f64> {
        let start = self.history.len().saturating_sub(window);
        let recent = &self.history[start..];
        if recent.is_empty() {
            return None;
        }
        let total: u64 = recent.iter().map(|&b| u64::from(b)).sum();
        Some(total as f64 / recent.len() as f64)
    }

    /// Read a scoreboard previously written by [`Scoreboard::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScoreboardError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ScoreboardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scores: Scoreboard = serde_json::from_str(&json)?;
        log::info!("Loaded {} episodes of history", scores.history.len());
        Ok(scores)
    }

    /// Write the scoreboard as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ScoreboardError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ScoreboardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Scoreboard saved ({} best entries)", self.best.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_never_qualifies() {
        let mut board = Scoreboard::new();
        assert!(!board.qualifies(0));
        assert_eq!(board.record(0), None);
        assert_eq!(board.episodes(), 1);
        assert!(board.best.is_empty());
    }

    #[test]
    fn test_sorted_descending_with_stable_ties() {
        let mut board = Scoreboard::new();
        assert_eq!(board.record(3), Some(1));
        assert_eq!(board.record(7), Some(1));
        assert_eq!(board.record(3), Some(3));
        let order: Vec<(u64, u32)> = board.best.iter().map(|e| (e.episode, e.bounces)).collect();
        assert_eq!(order, vec![(2, 7), (1, 3), (3, 3)]);
        assert_eq!(board.top(), Some(EpisodeEntry { episode: 2, bounces: 7 }));
    }

    #[test]
    fn test_capped_at_max() {
        let mut board = Scoreboard::new();
        for b in 1..=(MAX_BEST_EPISODES as u32 + 5) {
            board.record(b);
        }
        assert_eq!(board.best.len(), MAX_BEST_EPISODES);
        assert!(!board.qualifies(5));
        assert_eq!(board.potential_rank(100), Some(1));
        assert_eq!(board.best.last().map(|e| e.bounces), Some(6));
    }

    #[test]
    fn test_mean_recent_window() {
        let mut board = Scoreboard::new();
        assert_eq!(board.mean_recent(5), None);
        for b in [0, 2, 4, 6] {
            board.record(b);
        }
        assert_eq!(board.mean_recent(2), Some(5.0));
        assert_eq!(board.mean_recent(100), Some(3.0));
    }

    #[test]
    fn test_json_round_trip_on_disk() {
        let mut board = Scoreboard::new();
        board.record(4);
        board.record(1);
        let path = std::env::temp_dir().join(format!("pong-rl-scores-{}.json", std::process::id()));
        board.save(&path).unwrap();
        let mut loaded = Scoreboard::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, board);

        // A loaded board keeps numbering episodes where it left off
        assert_eq!(loaded.record(9), Some(1));
        assert_eq!(loaded.top(), Some(EpisodeEntry { episode: 3, bounces: 9 }));
    }
}
