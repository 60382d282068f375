//! Perfect-alignment combos and placement scoring

use serde::{Deserialize, Serialize};

use crate::consts::{BONUS_POINTS_PER_COLUMN, COMBO_STEP, MAX_COMBO_MULTIPLIER, POINTS_PER_COLUMN};

/// Streak of consecutive perfect placements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboState {
    pub streak: u32,
    /// `min(1 + streak * 0.5, 5)`
    pub multiplier: f32,
}

impl Default for ComboState {
    fn default() -> Self {
        Self {
            streak: 0,
            multiplier: 1.0,
        }
    }
}

/// Multiplier for a given streak
pub fn multiplier_for(streak: u32) -> f32 {
    (1.0 + streak as f32 * COMBO_STEP).min(MAX_COMBO_MULTIPLIER)
}

/// A placement is perfect when it keeps the full width of the block below
pub fn is_perfect(active_count: usize, previous_active_count: usize) -> bool {
    active_count > 0 && active_count == previous_active_count
}

impl ComboState {
    /// Record a placement. Returns true if it was perfect.
    pub fn register(&mut self, active_count: usize, previous_active_count: usize) -> bool {
        let perfect = is_perfect(active_count, previous_active_count);
        if perfect {
            self.streak += 1;
            self.multiplier = multiplier_for(self.streak);
        } else {
            *self = Self::default();
        }
        perfect
    }
}

/// Points earned by one placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlacementScore {
    /// Added to `score`
    pub awarded: u64,
    /// Added to `bonus_points`
    pub bonus: u64,
}

/// Score a placement of `active_count` columns on `row` with the combo
/// multiplier already updated for this placement.
pub fn score_placement(
    active_count: usize,
    multiplier: f32,
    row: u32,
    scoring_row: u32,
    bonus_requires_scoring_row: bool,
) -> PlacementScore {
    let scoring = row >= scoring_row;
    let base = active_count as u64 * POINTS_PER_COLUMN;
    let awarded = if scoring {
        (base as f64 * f64::from(multiplier)).round() as u64
    } else {
        0
    };
    let bonus = if scoring || !bonus_requires_scoring_row {
        active_count as u64 * BONUS_POINTS_PER_COLUMN
    } else {
        0
    };
    PlacementScore { awarded, bonus }
}
