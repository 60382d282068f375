//! High score leaderboard
//!
//! Tracks the top 10 runs. Receives run results as a [`ScoreSink`].

use serde::{Deserialize, Serialize};

use crate::ledger::{ScoreSink, ScoreSubmission};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub run_id: u64,
    pub score: u64,
    pub blocks_stacked: u32,
    pub highest_row: u32,
    /// Engine clock (seconds) when submitted
    pub timestamp: f64,
}

/// High score leaderboard, best first
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Zero never ranks; otherwise the board must have room or the score
    /// must beat the current last place.
    pub fn qualifies(&self, score: u64) -> bool {
        score > 0
            && (self.entries.len() < MAX_HIGH_SCORES
                || self.entries.last().is_some_and(|last| score > last.score))
    }

    /// Record a run. Returns its 1-indexed rank, or `None` if it missed the board.
    pub fn add(&mut self, submission: &ScoreSubmission, timestamp: f64) -> Option<usize> {
        if !self.qualifies(submission.score) {
            return None;
        }
        // Ties rank below earlier runs with the same score
        let index = self
            .entries
            .partition_point(|e| e.score >= submission.score);
        self.entries.insert(
            index,
            HighScoreEntry {
                run_id: submission.run_id,
                score: submission.score,
                blocks_stacked: submission.blocks_stacked,
                highest_row: submission.highest_row,
                timestamp,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(index + 1)
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

impl ScoreSink for HighScores {
    fn submit_score(&mut self, submission: ScoreSubmission, timestamp: f64) {
        if let Some(rank) = self.add(&submission, timestamp) {
            log::info!("Run {} placed #{} with {} points", submission.run_id, rank, submission.score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(score: u64) -> ScoreSubmission {
        ScoreSubmission {
            run_id: score,
            score,
            blocks_stacked: 4,
            highest_row: 4,
        }
    }

    #[test]
    fn zero_never_qualifies() {
        let mut scores = HighScores::new();
        assert!(!scores.qualifies(0));
        assert_eq!(scores.add(&run(0), 0.0), None);
        assert!(scores.entries.is_empty());
    }

    #[test]
    fn sorted_descending_and_truncated() {
        let mut scores = HighScores::new();
        for s in 1..=12 {
            scores.add(&run(s * 10), s as f64);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(120));
        assert_eq!(scores.entries.last().map(|e| e.score), Some(30));
        assert!(!scores.qualifies(30));
        // 120..=60 stay ahead of it
        assert_eq!(scores.add(&run(55), 13.0), Some(8));
        assert_eq!(scores.entries.last().map(|e| e.score), Some(40));
    }

    #[test]
    fn ties_rank_after_earlier_runs() {
        let mut scores = HighScores::new();
        let mut first = run(50);
        first.run_id = 1;
        let mut second = run(50);
        second.run_id = 2;
        assert_eq!(scores.add(&first, 1.0), Some(1));
        assert_eq!(scores.add(&second, 2.0), Some(2));
        assert_eq!(scores.entries[1].run_id, 2);
    }

    #[test]
    fn sink_records_entry() {
        let mut scores = HighScores::new();
        scores.submit_score(run(45), 1.5);
        assert_eq!(scores.entries[0].score, 45);
        assert_eq!(scores.entries[0].run_id, 45);
        assert_eq!(scores.entries[0].timestamp, 1.5);
    }
}
