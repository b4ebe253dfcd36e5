use rand::{rngs::StdRng, Rng, SeedableRng};
#[cfg(test)]
use std::collections::VecDeque;

/// Source of the uniform draws used for dice rolls and card selection.
pub trait RandomSource {
    /// Uniform integer in `low..=high`. Returns `low` when the range is empty.
    fn range_inclusive(&mut self, low: usize, high: usize) -> usize;

    fn roll_die(&mut self, sides: u8) -> u8 {
        let sides = usize::from(sides.max(1));
        self.range_inclusive(1, sides) as u8
    }
}

#[derive(Debug, Clone)]
pub struct RngState {
    seed: u64,
    rng: StdRng,
}

impl RngState {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random::<u64>())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for RngState {
    fn range_inclusive(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Replays fixed values, then cycles through the requested range. Values
/// outside the requested range are clamped into it.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: VecDeque<usize>,
    calls: usize,
}

#[cfg(test)]
impl ScriptedRandom {
    pub fn new(values: &[usize]) -> Self {
        Self {
            values: values.iter().copied().collect(),
            calls: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn range_inclusive(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            self.calls += 1;
            let _ = self.values.pop_front();
            return low;
        }
        let fallback = low + self.calls % (high - low + 1);
        self.calls += 1;
        self.values
            .pop_front()
            .map(|value| value.clamp(low, high))
            .unwrap_or(fallback)
    }
}
