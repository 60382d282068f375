//! Engine configuration
//!
//! All tuning lives here, including the policy switches on which the two
//! shipped game variants disagree. Loaded from JSON; missing fields fall back
//! to the Classic preset.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::prize::{PointsPolicy, PrizeTable};
use crate::stake::StakeLadder;

/// Named configuration presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConfigPreset {
    /// Centered base block, bonus only at scoring rows, flat points
    #[default]
    Classic,
    /// Randomized base block, bonus on every placement, stake-tiered points
    FreshDeal,
}

impl ConfigPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigPreset::Classic => "Classic",
            ConfigPreset::FreshDeal => "FreshDeal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "classic" => Some(ConfigPreset::Classic),
            "freshdeal" | "fresh" => Some(ConfigPreset::FreshDeal),
            _ => None,
        }
    }
}

/// Where the base block of a run sits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FirstBlockPlacement {
    #[default]
    Centered,
    /// Uniformly random run that fits the grid
    Random,
}

/// Uniform sampling band `[lo, hi]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub lo: f32,
    pub hi: f32,
}

impl Band {
    pub const fn new(lo: f32, hi: f32) -> Self {
        Self { lo, hi }
    }

    pub fn is_valid(&self) -> bool {
        self.lo.is_finite() && self.hi.is_finite() && self.lo <= self.hi
    }
}

/// Demo-mode auto-stop tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoplayConfig {
    /// Probability of aiming at the aligned position rather than anywhere
    pub accuracy: f32,
    /// Max absolute aim error (columns) when aiming at the aligned position
    pub jitter: f32,
    /// Floor on the auto-stop delay (seconds)
    pub min_delay: f32,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            accuracy: 0.8,
            jitter: 0.45,
            min_delay: 0.2,
        }
    }
}

/// Game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Board ===
    pub first_block: FirstBlockPlacement,
    /// Width of the base block run
    pub first_block_width: usize,

    // === Rows ===
    /// Rows at or above this earn score and prizes
    pub scoring_row: u32,
    /// Rows at or above this get the speed spike
    pub money_line_row: u32,
    /// Reaching this row ends the run
    pub terminal_row: u32,

    // === Speed (columns per second) ===
    pub base_speed: f32,
    /// Per-row speed increment band
    pub speed_increment: Band,
    /// Multiplicative spike band for rows at/after the money line
    pub money_line_spike: Band,
    /// Probability of reversing direction between consecutive blocks
    pub flip_probability: f32,

    // === Scoring ===
    /// Whether bonus points also require the scoring row
    pub bonus_requires_scoring_row: bool,
    pub prizes: PrizeTable,
    pub stakes: StakeLadder,

    // === Timing (seconds) ===
    pub spawn_delay: f32,
    pub demo_restart_delay: f32,
    pub settlement_delay: f32,
    pub autoplay: AutoplayConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            first_block: FirstBlockPlacement::Centered,
            first_block_width: 3,

            scoring_row: 5,
            money_line_row: 10,
            terminal_row: 13,

            base_speed: 3.0,
            speed_increment: Band::new(0.25, 0.45),
            money_line_spike: Band::new(1.15, 1.5),
            flip_probability: 0.7,

            bonus_requires_scoring_row: true,
            prizes: PrizeTable::default(),
            stakes: StakeLadder::default(),

            spawn_delay: 0.35,
            demo_restart_delay: 2.5,
            settlement_delay: 0.8,
            autoplay: AutoplayConfig::default(),
        }
    }
}

impl GameConfig {
    /// Create a config from a preset (applies preset defaults)
    pub fn from_preset(preset: ConfigPreset) -> Self {
        let mut config = Self::default();
        config.apply_preset(preset);
        config
    }

    /// Apply a preset's policy switches
    pub fn apply_preset(&mut self, preset: ConfigPreset) {
        match preset {
            ConfigPreset::Classic => {
                self.first_block = FirstBlockPlacement::Centered;
                self.bonus_requires_scoring_row = true;
                self.prizes.points_policy = PointsPolicy::Flat;
            }
            ConfigPreset::FreshDeal => {
                self.first_block = FirstBlockPlacement::Random;
                self.bonus_requires_scoring_row = false;
                self.prizes.points_policy = PointsPolicy::StakeTiered;
            }
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded game config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        use crate::consts::GRID_WIDTH;

        if self.first_block_width == 0 || self.first_block_width > GRID_WIDTH {
            return Err(ConfigError::invalid(
                "first_block_width",
                format!("must be in 1..={GRID_WIDTH}"),
            ));
        }
        if self.scoring_row == 0 || self.scoring_row > self.terminal_row {
            return Err(ConfigError::invalid(
                "scoring_row",
                "must be in 1..=terminal_row",
            ));
        }
        if self.money_line_row > self.terminal_row {
            return Err(ConfigError::invalid("money_line_row", "must not exceed terminal_row"));
        }
        if !(self.base_speed.is_finite() && self.base_speed > 0.0) {
            return Err(ConfigError::invalid("base_speed", "must be > 0"));
        }
        if !self.speed_increment.is_valid() || self.speed_increment.lo < 0.0 {
            return Err(ConfigError::invalid("speed_increment", "need 0 <= lo <= hi"));
        }
        if !self.money_line_spike.is_valid() || self.money_line_spike.lo < 1.0 {
            return Err(ConfigError::invalid("money_line_spike", "need 1 <= lo <= hi"));
        }
        if !(0.0..=1.0).contains(&self.flip_probability) {
            return Err(ConfigError::invalid("flip_probability", "must be in [0, 1]"));
        }
        if !self.prizes.is_monotone() {
            return Err(ConfigError::invalid("prizes", "tiers must be a monotone step table"));
        }
        if !self.stakes.is_well_ordered() {
            return Err(ConfigError::invalid(
                "stakes",
                "speed multipliers must increase with stake, free-play slowest",
            ));
        }
        let delays = [
            self.spawn_delay,
            self.demo_restart_delay,
            self.settlement_delay,
            self.autoplay.min_delay,
        ];
        if delays.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(ConfigError::invalid("delays", "must be finite and >= 0"));
        }
        if !(0.0..=1.0).contains(&self.autoplay.accuracy) {
            return Err(ConfigError::invalid("autoplay.accuracy", "must be in [0, 1]"));
        }
        if !(self.autoplay.jitter.is_finite() && self.autoplay.jitter >= 0.0) {
            return Err(ConfigError::invalid("autoplay.jitter", "must be finite and >= 0"));
        }
        Ok(())
    }
}
