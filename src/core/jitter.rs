//! Random source for price and size jitter

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform integer source used by the pulse rules.
pub trait Jitter: Send {
    /// Value in `[0, upper)`, or `0` when `upper` is zero.
    fn below(&mut self, upper: u32) -> u32;
}

/// `StdRng`-backed jitter, seeded or from the OS.
pub struct RandomJitter {
    rng: StdRng,
}

impl RandomJitter {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Jitter for RandomJitter {
    fn below(&mut self, upper: u32) -> u32 {
        if upper == 0 {
            return 0;
        }
        self.rng.random_range(0..upper)
    }
}

/// Replays a fixed sequence, cycling when exhausted.
///
/// Each draw yields `value % upper`. Draws with `upper == 0` return `0`
/// without consuming a value.
#[derive(Debug, Clone, Default)]
pub struct ScriptedJitter {
    values: Vec<u32>,
    cursor: usize,
}

impl ScriptedJitter {
    pub fn new(values: impl Into<Vec<u32>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }

    /// Always draws `value`.
    pub fn constant(value: u32) -> Self {
        Self::new(vec![value])
    }
}

impl Jitter for ScriptedJitter {
    fn below(&mut self, upper: u32) -> u32 {
        if upper == 0 || self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = (self.cursor + 1) % self.values.len();
        value % upper
    }
}
