//! Stakes and fixed-point credit amounts
//!
//! Money is tracked in hundredths ("cents") so payouts are exact integers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed-point credit amount, stored in hundredths of a credit
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Credits(u64);

impl Credits {
    pub const ZERO: Credits = Credits(0);
    /// Hundredths per whole credit
    pub const SCALE: u64 = 100;

    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn from_whole(whole: u64) -> Self {
        Self(whole * Self::SCALE)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_sub(self, other: Credits) -> Option<Credits> {
        self.0.checked_sub(other.0).map(Credits)
    }

    pub fn saturating_add(self, other: Credits) -> Credits {
        Credits(self.0.saturating_add(other.0))
    }

    /// Multiply by a basis-point multiplier (10_000 = 1x).
    ///
    /// Uses 128-bit intermediates; the result truncates toward zero only when
    /// the product is not a whole number of hundredths.
    pub fn scale_bps(self, multiplier_bps: u64) -> Credits {
        let product = u128::from(self.0) * u128::from(multiplier_bps) / 10_000;
        Credits(u64::try_from(product).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / Self::SCALE, self.0 % Self::SCALE)
    }
}

/// Wager for one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Stake {
    /// Play for points only, nothing is debited
    #[default]
    Free,
    Amount(Credits),
}

impl Stake {
    pub fn whole(amount: u64) -> Self {
        Stake::Amount(Credits::from_whole(amount))
    }

    pub fn amount(&self) -> Option<Credits> {
        match self {
            Stake::Free => None,
            Stake::Amount(c) => Some(*c),
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Stake::Free)
    }
}

impl fmt::Display for Stake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stake::Free => write!(f, "free"),
            Stake::Amount(c) => write!(f, "{}", c),
        }
    }
}

/// One rung of the stake ladder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StakeTier {
    pub stake: Stake,
    /// Multiplier applied to block speed for runs at this stake
    pub speed_multiplier: f32,
}

/// Ordered set of allowed stakes, free-play first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StakeLadder {
    tiers: Vec<StakeTier>,
}

impl Default for StakeLadder {
    fn default() -> Self {
        let tier = |stake, speed_multiplier| StakeTier {
            stake,
            speed_multiplier,
        };
        Self {
            tiers: vec![
                tier(Stake::Free, 0.85),
                tier(Stake::Amount(Credits::from_cents(50)), 1.0),
                tier(Stake::whole(1), 1.05),
                tier(Stake::whole(2), 1.1),
                tier(Stake::whole(5), 1.2),
                tier(Stake::whole(10), 1.3),
                tier(Stake::whole(20), 1.45),
            ],
        }
    }
}

impl StakeLadder {
    pub fn new(tiers: Vec<StakeTier>) -> Self {
        Self { tiers }
    }

    pub fn tiers(&self) -> &[StakeTier] {
        &self.tiers
    }

    pub fn contains(&self, stake: Stake) -> bool {
        self.position(stake).is_some()
    }

    /// Index of a stake on the ladder (free-play is index 0 on the default ladder)
    pub fn position(&self, stake: Stake) -> Option<usize> {
        self.tiers.iter().position(|t| t.stake == stake)
    }

    /// Speed multiplier for a stake; unknown stakes move at 1x
    pub fn speed_multiplier(&self, stake: Stake) -> f32 {
        self.tiers
            .iter()
            .find(|t| t.stake == stake)
            .map(|t| t.speed_multiplier)
            .unwrap_or(1.0)
    }

    /// Next stake on the ladder, wrapping to the first
    pub fn cycle(&self, current: Stake) -> Stake {
        if self.tiers.is_empty() {
            return current;
        }
        let next = self
            .position(current)
            .map(|i| (i + 1) % self.tiers.len())
            .unwrap_or(0);
        self.tiers[next].stake
    }

    /// Free-play must be the slowest tier, and paid tiers must get strictly
    /// faster as the amount grows.
    pub fn is_well_ordered(&self) -> bool {
        let free = self
            .tiers
            .iter()
            .find(|t| t.stake.is_free())
            .map(|t| t.speed_multiplier);
        let mut paid: Vec<(Credits, f32)> = self
            .tiers
            .iter()
            .filter_map(|t| t.stake.amount().map(|a| (a, t.speed_multiplier)))
            .collect();
        paid.sort_by_key(|(a, _)| *a);

        let increasing = paid
            .windows(2)
            .all(|w| w[0].0 < w[1].0 && w[0].1 < w[1].1);
        let free_slowest = match (free, paid.first()) {
            (Some(f), Some((_, slowest_paid))) => f < *slowest_paid,
            _ => true,
        };
        increasing && free_slowest && self.tiers.iter().all(|t| t.speed_multiplier > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credits_display_two_decimals() {
        assert_eq!(Credits::from_cents(50).to_string(), "0.50");
        assert_eq!(Credits::from_whole(500).to_string(), "500.00");
    }

    #[test]
    fn scale_bps_is_exact() {
        assert_eq!(Credits::from_whole(5).scale_bps(1_000_000), Credits::from_whole(500));
        assert_eq!(Credits::from_cents(50).scale_bps(15_000), Credits::from_cents(75));
    }

    #[test]
    fn cycle_wraps_around() {
        let ladder = StakeLadder::default();
        let last = ladder.tiers().last().unwrap().stake;
        assert_eq!(ladder.cycle(last), Stake::Free);
        assert_eq!(ladder.cycle(Stake::Free), Stake::Amount(Credits::from_cents(50)));
    }

    #[test]
    fn default_ladder_is_well_ordered() {
        assert!(StakeLadder::default().is_well_ordered());

        let bad = StakeLadder::new(vec![
            StakeTier { stake: Stake::Free, speed_multiplier: 1.2 },
            StakeTier { stake: Stake::whole(1), speed_multiplier: 1.0 },
        ]);
        assert!(!bad.is_well_ordered());
    }
}
