//! Demo-mode auto-stop planning
//!
//! Picks where the demo "player" wants to stop and how long the block needs
//! to get there. Usually aims near the aligned position so the demo stacks a
//! few rows before missing.

use super::motion::{travel_distance, travel_range};
use super::rng::{UniformSource, chance, uniform_in};
use super::state::MovingBlock;
use crate::error::RngError;
use crate::settings::AutoplayConfig;

/// Where and when the demo stops the current block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoStopPlan {
    pub target: f32,
    /// Seconds from now
    pub delay: f32,
}

pub fn plan_auto_stop(
    moving: &MovingBlock,
    config: &AutoplayConfig,
    rng: &mut dyn UniformSource,
) -> Result<AutoStopPlan, RngError> {
    let range = travel_range(&moving.block);
    let target = if chance(rng, config.accuracy)? {
        uniform_in(rng, -config.jitter, config.jitter)?
    } else {
        uniform_in(rng, range.min, range.max)?
    }
    .clamp(range.min, range.max);

    let motion = &moving.motion;
    let distance = travel_distance(motion.position, motion.direction, target, range);
    let mut delay = distance / motion.speed;

    if delay < config.min_delay {
        // A full round trip brings the block back to the same spot and heading
        let round_trip = 2.0 * range.span() / motion.speed;
        delay = if round_trip > 0.0 {
            delay + round_trip
        } else {
            config.min_delay
        };
    }

    Ok(AutoStopPlan { target, delay })
}
