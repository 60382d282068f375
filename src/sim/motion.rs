//! Horizontal motion of the moving block
//!
//! The block bounces between the two offsets at which its outermost occupied
//! column touches a grid edge.

use super::state::{Block, Direction, MotionState};
use crate::consts::GRID_WIDTH;

/// Closed interval of legal position offsets
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelRange {
    pub min: f32,
    pub max: f32,
}

impl TravelRange {
    pub fn contains(&self, position: f32) -> bool {
        position >= self.min && position <= self.max
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }
}

/// `[-leftmost, width - 1 - rightmost]` for the block's occupied columns.
/// An empty mask gets a zero-width range at the origin.
pub fn travel_range(block: &Block) -> TravelRange {
    match (block.leftmost(), block.rightmost()) {
        (Some(left), Some(right)) => TravelRange {
            min: -(left as f32),
            max: (GRID_WIDTH - 1 - right) as f32,
        },
        _ => TravelRange { min: 0.0, max: 0.0 },
    }
}

/// Advance `motion` by `dt` seconds, reflecting at the range bounds
pub fn integrate(motion: &mut MotionState, dt: f32, range: TravelRange) {
    if dt <= 0.0 {
        return;
    }
    motion.position += motion.direction.sign() * motion.speed * dt;

    if motion.position >= range.max {
        motion.position = range.max;
        motion.direction = Direction::Left;
    } else if motion.position <= range.min {
        motion.position = range.min;
        motion.direction = Direction::Right;
    }
}

/// Distance the block travels from `position` heading `direction` until it
/// first reaches `target`, bouncing off the bounds at most once.
pub fn travel_distance(
    position: f32,
    direction: Direction,
    target: f32,
    range: TravelRange,
) -> f32 {
    let target = target.clamp(range.min, range.max);
    let position = position.clamp(range.min, range.max);
    match direction {
        Direction::Right if target >= position => target - position,
        Direction::Right => (range.max - position) + (range.max - target),
        Direction::Left if target <= position => position - target,
        Direction::Left => (position - range.min) + (target - range.min),
    }
}
