//! Game state and core simulation types
//!
//! Everything a renderer needs to draw a frame lives in [`GameState`].

use serde::{Deserialize, Serialize};

use super::combo::ComboState;
use super::placement::Placement;
use super::prize::Prize;
use crate::consts::GRID_WIDTH;
use crate::stake::Stake;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for a stake and a start command
    #[default]
    Ready,
    /// Paid or free-play run driven by player input
    Playing,
    /// Self-playing presentation loop
    Demo,
    /// Run finished, prize computed
    Ended,
}

impl GamePhase {
    /// Phases in which a block may be moving
    pub fn is_active(self) -> bool {
        matches!(self, GamePhase::Playing | GamePhase::Demo)
    }
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// Stopped block missed the stack entirely
    Missed,
    /// Reached the terminal row
    TopReached,
    /// Random source failed while spawning
    RngFailure,
}

/// One row's column occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub row: u32,
    pub occupied: [bool; GRID_WIDTH],
}

impl Block {
    pub fn empty(row: u32) -> Self {
        Self {
            row,
            occupied: [false; GRID_WIDTH],
        }
    }

    /// A contiguous run of `len` columns starting at `start` (clipped to the grid)
    pub fn run(row: u32, start: usize, len: usize) -> Self {
        let mut block = Self::empty(row);
        for col in start..(start + len).min(GRID_WIDTH) {
            block.occupied[col] = true;
        }
        block
    }

    /// A run of `len` columns centered on the grid
    pub fn centered(row: u32, len: usize) -> Self {
        let len = len.min(GRID_WIDTH);
        Self::run(row, (GRID_WIDTH - len) / 2, len)
    }

    pub fn from_columns(row: u32, columns: &[usize]) -> Self {
        let mut block = Self::empty(row);
        for &col in columns {
            if col < GRID_WIDTH {
                block.occupied[col] = true;
            }
        }
        block
    }

    #[inline]
    pub fn is_occupied(&self, column: usize) -> bool {
        self.occupied.get(column).copied().unwrap_or(false)
    }

    pub fn columns(&self) -> impl Iterator<Item = usize> + '_ {
        self.occupied
            .iter()
            .enumerate()
            .filter_map(|(i, &on)| on.then_some(i))
    }

    pub fn active_count(&self) -> usize {
        self.occupied.iter().filter(|&&on| on).count()
    }

    pub fn leftmost(&self) -> Option<usize> {
        self.occupied.iter().position(|&on| on)
    }

    pub fn rightmost(&self) -> Option<usize> {
        self.occupied.iter().rposition(|&on| on)
    }

    /// True if every occupied column of `self` is also occupied in `other`
    pub fn is_subset_of(&self, other: &Block) -> bool {
        self.columns().all(|c| other.is_occupied(c))
    }
}

/// Horizontal travel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Position and velocity of the moving block.
///
/// `position` is a fractional column offset applied to the block's mask:
/// column `i` of the mask sits over grid column `position + i`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub position: f32,
    pub direction: Direction,
    /// Columns per second, always > 0
    pub speed: f32,
}

/// The block currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovingBlock {
    pub block: Block,
    pub motion: MotionState,
}

/// Run counters. Never decrease within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressState {
    pub highest_row: u32,
    pub blocks_stacked: u32,
    pub score: u64,
    pub bonus_points: u64,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

/// Complete observable game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Seed the engine's random source was built from (if seeded)
    pub rng_state: Option<RngState>,
    /// Incremented on every start/demo start
    pub run_id: u64,
    pub phase: GamePhase,
    /// Selected stake; fixed once a run starts
    pub stake: Stake,
    /// Stacked blocks, base block (row 0) first
    pub stack: Vec<Block>,
    /// Block in flight, present iff phase is Playing/Demo and a block was spawned
    pub current: Option<MovingBlock>,
    pub combo: ComboState,
    pub progress: ProgressState,
    pub last_placement: Option<Placement>,
    pub end_reason: Option<EndReason>,
    /// Computed when the run ends
    pub prize: Option<Prize>,
    /// Engine clock in seconds
    pub clock: f64,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(None)
    }
}

impl GameState {
    pub fn new(rng_state: Option<RngState>) -> Self {
        Self {
            rng_state,
            run_id: 0,
            phase: GamePhase::Ready,
            stake: Stake::Free,
            stack: Vec::new(),
            current: None,
            combo: ComboState::default(),
            progress: ProgressState::default(),
            last_placement: None,
            end_reason: None,
            prize: None,
            clock: 0.0,
        }
    }

    /// Topmost stacked block
    pub fn top_block(&self) -> Option<&Block> {
        self.stack.last()
    }

    /// Clear all per-run state, keeping stake, seed, run id and clock
    pub fn clear_run(&mut self) {
        self.stack.clear();
        self.current = None;
        self.combo = ComboState::default();
        self.progress = ProgressState::default();
        self.last_placement = None;
        self.end_reason = None;
        self.prize = None;
    }

    /// Begin a new run on top of `base`
    pub fn begin_run(&mut self, phase: GamePhase, base: Block) {
        self.clear_run();
        self.run_id += 1;
        self.phase = phase;
        self.stack.push(base);
    }
}
