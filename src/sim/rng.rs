//! Uniform random sources
//!
//! The engine only ever asks for uniform samples in `[0, 1)`. Sources may fail;
//! the engine treats a failure while spawning as the end of the run.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::RngState;
use crate::error::RngError;

/// A synchronous uniform `[0, 1)` generator
pub trait UniformSource {
    fn next_unit(&mut self) -> Result<f32, RngError>;

    /// Seed this source was built from, if any
    fn rng_state(&self) -> Option<RngState> {
        None
    }
}

/// Uniform value in `[lo, hi)`
pub fn uniform_in(rng: &mut dyn UniformSource, lo: f32, hi: f32) -> Result<f32, RngError> {
    let u = rng.next_unit()?;
    Ok(lo + (hi - lo) * u)
}

/// True with probability `p`
pub fn chance(rng: &mut dyn UniformSource, p: f32) -> Result<bool, RngError> {
    Ok(rng.next_unit()? < p)
}

/// Seeded PCG source used for real runs
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: RngState,
    rng: Pcg32,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: RngState::new(seed),
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl UniformSource for SeededRng {
    fn next_unit(&mut self) -> Result<f32, RngError> {
        Ok(self.rng.random::<f32>())
    }

    fn rng_state(&self) -> Option<RngState> {
        Some(self.state)
    }
}

/// Replays a fixed list of samples, then reports exhaustion
#[derive(Debug, Clone, Default)]
pub struct ScriptedRng {
    samples: VecDeque<f32>,
    /// Sample to repeat forever once the script runs out
    fallback: Option<f32>,
}

impl ScriptedRng {
    pub fn new(samples: impl IntoIterator<Item = f32>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            fallback: None,
        }
    }

    /// Repeat `value` after the scripted samples are consumed
    pub fn then_repeat(mut self, value: f32) -> Self {
        self.fallback = Some(value);
        self
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }
}

impl UniformSource for ScriptedRng {
    fn next_unit(&mut self) -> Result<f32, RngError> {
        let sample = self
            .samples
            .pop_front()
            .or(self.fallback)
            .ok_or(RngError::Exhausted)?;
        if (0.0..1.0).contains(&sample) {
            Ok(sample)
        } else {
            Err(RngError::OutOfRange(sample.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_is_deterministic() {
        let mut a = SeededRng::new(42);
        let mut b = SeededRng::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_unit(), b.next_unit());
        }
        assert_eq!(a.rng_state(), Some(RngState::new(42)));
    }

    #[test]
    fn scripted_exhausts() {
        let mut rng = ScriptedRng::new([0.25]);
        assert_eq!(rng.next_unit(), Ok(0.25));
        assert_eq!(rng.next_unit(), Err(RngError::Exhausted));
    }

    #[test]
    fn scripted_rejects_out_of_range() {
        let mut rng = ScriptedRng::new([1.0]);
        assert!(matches!(rng.next_unit(), Err(RngError::OutOfRange(_))));
    }

    #[test]
    fn uniform_in_maps_range() {
        let mut rng = ScriptedRng::new([0.5]);
        assert_eq!(uniform_in(&mut rng, 1.0, 3.0), Ok(2.0));
    }
}
