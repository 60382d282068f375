//! End-of-run prize calculation
//!
//! A monotone step table maps the highest row reached to either a cash
//! multiplier on the stake or a number of points. Cash multipliers are basis
//! points (10_000 = 1x) so `stake * multiplier` is exact in hundredths.

use serde::{Deserialize, Serialize};

use crate::stake::{Credits, Stake, StakeLadder};

/// Basis points per 1x
pub const BPS_ONE: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrizeKind {
    Cash,
    Points,
}

/// Result of a run. `amount` is hundredths of a credit for cash, raw points otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prize {
    pub amount: u64,
    pub kind: PrizeKind,
}

impl Prize {
    pub const NOTHING: Prize = Prize {
        amount: 0,
        kind: PrizeKind::Points,
    };

    pub fn cash(amount: Credits) -> Self {
        Self {
            amount: amount.cents(),
            kind: PrizeKind::Cash,
        }
    }

    pub fn points(amount: u64) -> Self {
        Self {
            amount,
            kind: PrizeKind::Points,
        }
    }

    pub fn is_nothing(&self) -> bool {
        self.amount == 0
    }

    /// Cash amount, if this is a cash prize
    pub fn as_credits(&self) -> Option<Credits> {
        (self.kind == PrizeKind::Cash).then(|| Credits::from_cents(self.amount))
    }
}

/// What reaching a tier pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TierReward {
    Points { points: u64 },
    Cash { multiplier_bps: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeTier {
    /// Lowest row (inclusive) that qualifies for this tier
    pub min_row: u32,
    pub reward: TierReward,
}

/// How points tiers are valued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointsPolicy {
    /// Tier points as listed
    Flat,
    /// Tier points times the stake's 1-based ladder position
    StakeTiered,
    /// Fixed schedule indexed from the scoring row, paid on every row below
    /// the first cash tier whether or not a points tier covers it. Rows past
    /// the end use the last entry.
    PerRow { points: Vec<u64> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeTable {
    /// Sorted by `min_row`, strictly increasing
    pub tiers: Vec<PrizeTier>,
    pub points_policy: PointsPolicy,
    /// Points per 1x of cash multiplier, paid to free-play runs that reach a cash tier
    pub free_play_points_per_x: u64,
}

impl Default for PrizeTable {
    fn default() -> Self {
        let points = |min_row, points| PrizeTier {
            min_row,
            reward: TierReward::Points { points },
        };
        let cash = |min_row, multiplier_bps| PrizeTier {
            min_row,
            reward: TierReward::Cash { multiplier_bps },
        };
        Self {
            tiers: vec![
                points(5, 100),
                points(7, 250),
                points(9, 500),
                cash(10, 2 * BPS_ONE),
                cash(11, 5 * BPS_ONE),
                cash(12, 20 * BPS_ONE),
                cash(13, 100 * BPS_ONE),
            ],
            points_policy: PointsPolicy::Flat,
            free_play_points_per_x: 100,
        }
    }
}

impl PrizeTable {
    /// Tier reached at `row`, if any
    pub fn tier_for(&self, row: u32) -> Option<&PrizeTier> {
        self.tiers.iter().rev().find(|t| t.min_row <= row)
    }

    /// Lowest row that pays anything
    pub fn lowest_row(&self) -> Option<u32> {
        self.tiers.first().map(|t| t.min_row)
    }

    /// Rows strictly increase, cash multipliers never decrease, cash tiers
    /// never precede points tiers.
    pub fn is_monotone(&self) -> bool {
        let rows_increase = self.tiers.windows(2).all(|w| w[0].min_row < w[1].min_row);
        let mut seen_cash = false;
        let mut last_bps = 0;
        let mut last_points = 0;
        for tier in &self.tiers {
            match tier.reward {
                TierReward::Cash { multiplier_bps } => {
                    if multiplier_bps < last_bps {
                        return false;
                    }
                    seen_cash = true;
                    last_bps = multiplier_bps;
                }
                TierReward::Points { points } => {
                    if seen_cash || points < last_points {
                        return false;
                    }
                    last_points = points;
                }
            }
        }
        rows_increase
    }

    /// Points for a non-cash result. `tier_points` is `None` when no points
    /// tier covers the row.
    fn points_value(
        &self,
        tier_points: Option<u64>,
        highest_row: u32,
        scoring_row: u32,
        stake: Stake,
        ladder: &StakeLadder,
    ) -> Option<u64> {
        match &self.points_policy {
            PointsPolicy::Flat => tier_points,
            PointsPolicy::StakeTiered => {
                let rung = ladder.position(stake).map(|i| i + 1).unwrap_or(1) as u64;
                tier_points.map(|p| p.saturating_mul(rung))
            }
            PointsPolicy::PerRow { points } => {
                let index = highest_row.saturating_sub(scoring_row) as usize;
                points
                    .get(index)
                    .or_else(|| points.last())
                    .copied()
                    .or(tier_points)
            }
        }
    }
}

/// Prize for a run that reached `highest_row` at `stake`.
///
/// Rows below `scoring_row` never pay. Free-play never yields cash.
pub fn calculate_prize(
    table: &PrizeTable,
    highest_row: u32,
    stake: Stake,
    scoring_row: u32,
    ladder: &StakeLadder,
) -> Prize {
    if highest_row < scoring_row {
        return Prize::NOTHING;
    }

    let tier_points = match table.tier_for(highest_row).map(|t| t.reward) {
        Some(TierReward::Cash { multiplier_bps }) => {
            return match stake {
                Stake::Amount(amount) => Prize::cash(amount.scale_bps(multiplier_bps)),
                Stake::Free => Prize::points(
                    multiplier_bps.saturating_mul(table.free_play_points_per_x) / BPS_ONE,
                ),
            };
        }
        Some(TierReward::Points { points }) => Some(points),
        None => None,
    };

    table
        .points_value(tier_points, highest_row, scoring_row, stake, ladder)
        .map_or(Prize::NOTHING, Prize::points)
}
