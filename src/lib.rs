//! Block Stacker - a stake-the-moving-block wagering game engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (motion, placement, scoring, phases)
//! - `stake`: Fixed-point credits and the stake ladder
//! - `ledger`: Wallet and score-persistence collaborator contracts
//! - `settings`: Data-driven game balance and variant policies
//! - `highscores`: In-memory leaderboard

pub mod error;
pub mod highscores;
pub mod ledger;
pub mod settings;
pub mod sim;
pub mod stake;

pub use error::{CommandError, ConfigError, LedgerError, RngError, StartError};
pub use highscores::HighScores;
pub use ledger::{MemoryWallet, ScoreSink, ScoreSubmission, Wallet};
pub use settings::{ConfigPreset, GameConfig};
pub use sim::{Command, Game, GameEvent, GamePhase, GameState};
pub use stake::{Credits, Stake};

/// Game configuration constants
pub mod consts {
    /// Fixed timestep used by the headless runner (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum deferred tasks fired in one tick
    pub const MAX_TASKS_PER_TICK: u32 = 8;

    /// Grid columns; constant for the whole run
    pub const GRID_WIDTH: usize = 7;

    /// Score per surviving column
    pub const POINTS_PER_COLUMN: u64 = 10;
    /// Bonus pool accrual per surviving column
    pub const BONUS_POINTS_PER_COLUMN: u64 = 50;
    /// Combo multiplier gained per perfect placement
    pub const COMBO_STEP: f32 = 0.5;
    pub const MAX_COMBO_MULTIPLIER: f32 = 5.0;
}
