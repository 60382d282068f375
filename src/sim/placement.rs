//! Placement resolution
//!
//! Stopping the moving block snaps each occupied column to the nearest grid
//! column and keeps only the columns that land on the block beneath.
//!
//! Snapping rounds half away from zero (`f32::round`): an offset of exactly
//! +0.5 moves a column right, -0.5 moves it left. Payouts depend on this at
//! half-column boundaries, so it must not change without a config switch.

use serde::{Deserialize, Serialize};

use super::state::Block;
use crate::consts::GRID_WIDTH;

/// Outcome of stopping a block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Surviving columns; empty when there was no overlap
    pub block: Block,
    pub has_overlap: bool,
    pub active_count: usize,
    /// Offset at the stop instant
    pub position: f32,
}

/// Grid column a mask column lands in, `None` when off the grid
#[inline]
pub fn snap_column(position: f32, mask_column: usize) -> Option<usize> {
    let snapped = (position + mask_column as f32).round();
    if snapped >= 0.0 && snapped < GRID_WIDTH as f32 {
        Some(snapped as usize)
    } else {
        None
    }
}

/// Intersect `moving` stopped at `position` with `previous`
pub fn resolve(moving: &Block, position: f32, previous: &Block) -> Placement {
    let mut block = Block::empty(moving.row);
    for column in moving.columns() {
        if let Some(grid) = snap_column(position, column)
            && previous.is_occupied(grid)
        {
            block.occupied[grid] = true;
        }
    }

    let active_count = block.active_count();
    Placement {
        block,
        has_overlap: active_count > 0,
        active_count,
        position,
    }
}
