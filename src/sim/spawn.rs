//! Block spawning
//!
//! Each new block inherits the mask of the block it must land on, starts at a
//! random legal offset and gets faster row by row.

use super::motion::travel_range;
use super::rng::{UniformSource, chance, uniform_in};
use super::state::{Block, Direction, MotionState, MovingBlock};
use crate::consts::GRID_WIDTH;
use crate::error::RngError;
use crate::settings::{FirstBlockPlacement, GameConfig};
use crate::stake::Stake;

/// Base block for a new run (row 0)
pub fn base_block(config: &GameConfig, rng: &mut dyn UniformSource) -> Result<Block, RngError> {
    first_mask(0, config, rng)
}

fn first_mask(
    row: u32,
    config: &GameConfig,
    rng: &mut dyn UniformSource,
) -> Result<Block, RngError> {
    let width = config.first_block_width.clamp(1, GRID_WIDTH);
    match config.first_block {
        FirstBlockPlacement::Centered => Ok(Block::centered(row, width)),
        FirstBlockPlacement::Random => {
            let slots = GRID_WIDTH - width + 1;
            let start = ((rng.next_unit()? * slots as f32) as usize).min(slots - 1);
            Ok(Block::run(row, start, width))
        }
    }
}

/// Speed for a block on `row`: linear growth with jittered increment, a
/// spike from the money line up, scaled by the stake tier.
pub fn block_speed(
    row: u32,
    stake: Stake,
    config: &GameConfig,
    rng: &mut dyn UniformSource,
) -> Result<f32, RngError> {
    let increment = uniform_in(rng, config.speed_increment.lo, config.speed_increment.hi)?;
    let mut speed = config.base_speed + row.saturating_sub(1) as f32 * increment;

    if row >= config.money_line_row {
        let spike = uniform_in(rng, config.money_line_spike.lo, config.money_line_spike.hi)?;
        speed *= spike;
    }

    Ok(speed * config.stakes.speed_multiplier(stake))
}

/// Plan the next moving block.
///
/// `previous_direction` is the direction the last block was travelling when
/// it stopped, `None` for the first block of a run.
pub fn plan_spawn(
    previous: Option<&Block>,
    previous_direction: Option<Direction>,
    stake: Stake,
    config: &GameConfig,
    rng: &mut dyn UniformSource,
) -> Result<MovingBlock, RngError> {
    let row = previous.map(|b| b.row + 1).unwrap_or(1);

    let block = match previous {
        Some(prev) => Block {
            row,
            occupied: prev.occupied,
        },
        None => first_mask(row, config, rng)?,
    };

    let range = travel_range(&block);
    let position = uniform_in(rng, range.min, range.max)?.clamp(range.min, range.max);

    let direction = match previous_direction {
        None => {
            if chance(rng, 0.5)? {
                Direction::Right
            } else {
                Direction::Left
            }
        }
        Some(prev) => {
            if chance(rng, config.flip_probability)? {
                prev.flipped()
            } else {
                prev
            }
        }
    };

    let speed = block_speed(row, stake, config, rng)?;
    log::debug!(
        "Spawn row {} at {:.2} heading {:?} speed {:.2}",
        row,
        position,
        direction,
        speed
    );

    Ok(MovingBlock {
        block,
        motion: MotionState {
            position,
            direction,
            speed,
        },
    })
}
