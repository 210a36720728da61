/*!
 * Random Sources
 * Every random draw of the simulation goes through `RandomSource`
 */

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of the simulation's random draws
pub trait RandomSource: Send {
    /// Uniform integer in `[low, high)`. Returns `low` for an empty range.
    fn next_in_range(&mut self, low: u64, high: u64) -> u64;

    /// Uniform float in `[0, 1)`
    fn next_unit(&mut self) -> f64;

    /// Uniform index into a collection of `len` items
    fn next_index(&mut self, len: usize) -> usize {
        self.next_in_range(0, len as u64) as usize
    }

    /// Draw from a half-open `(low, high)` range pair as stored in `core::limits`
    fn draw(&mut self, range: (u64, u64)) -> u64 {
        self.next_in_range(range.0, range.1)
    }
}

/// Production source backed by `StdRng`
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Reproducible source for a given seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_in_range(&mut self, low: u64, high: u64) -> u64 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..high)
    }

    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays queued values, then falls back to a fixed-seed `SeededRandom`
///
/// Queued integers are clamped into the requested range and queued floats
/// into `[0, 1)`, so a script can never push the simulation out of domain.
pub struct ScriptedRandom {
    ints: VecDeque<u64>,
    units: VecDeque<f64>,
    fallback: SeededRandom,
}

impl ScriptedRandom {
    pub fn new() -> Self {
        Self {
            ints: VecDeque::new(),
            units: VecDeque::new(),
            fallback: SeededRandom::new(0),
        }
    }

    /// Queue integer draws, consumed in order by `next_in_range`
    pub fn with_ints(mut self, values: impl IntoIterator<Item = u64>) -> Self {
        self.ints.extend(values);
        self
    }

    /// Queue float draws, consumed in order by `next_unit`
    pub fn with_units(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.units.extend(values);
        self
    }

    /// Queued values not yet consumed
    pub fn pending(&self) -> (usize, usize) {
        (self.ints.len(), self.units.len())
    }
}

impl Default for ScriptedRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_in_range(&mut self, low: u64, high: u64) -> u64 {
        match self.ints.pop_front() {
            Some(_) if low >= high => low,
            Some(value) => value.clamp(low, high - 1),
            None => self.fallback.next_in_range(low, high),
        }
    }

    fn next_unit(&mut self) -> f64 {
        match self.units.pop_front() {
            Some(value) if value.is_nan() => 0.0,
            Some(value) => value.clamp(0.0, 1.0 - f64::EPSILON),
            None => self.fallback.next_unit(),
        }
    }
}
