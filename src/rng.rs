//! Shared random source and the count sampler built on top of it.
//!
//! A single [`SimRng`] is created per run and handed down by `&mut` through
//! every tick call. The order in which groups, cities and provinces draw from
//! it is part of the reproducibility contract.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Binomial, Distribution, Normal};

/// Draw primitives the simulation needs.
///
/// `uniform` and `binomial` are optional: a source that returns `None` makes
/// callers fall back to a deterministic rule (midpoint threshold, `round(n * p)`).
pub trait RandomSource {
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64;

    fn uniform(&mut self, _low: f64, _high: f64) -> Option<f64> {
        None
    }

    fn binomial(&mut self, _trials: u64, _probability: f64) -> Option<u64> {
        None
    }
}

pub struct SimRng {
    inner: ChaCha8Rng,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl RngCore for SimRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

impl RandomSource for SimRng {
    fn normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        match Normal::new(mean, std_dev) {
            Ok(dist) => dist.sample(&mut self.inner),
            Err(_) => mean,
        }
    }

    fn uniform(&mut self, low: f64, high: f64) -> Option<f64> {
        if !(high > low) {
            return Some(low);
        }
        Some(self.inner.gen_range(low..high))
    }

    fn binomial(&mut self, trials: u64, probability: f64) -> Option<u64> {
        Binomial::new(trials, probability)
            .ok()
            .map(|dist| dist.sample(&mut self.inner))
    }
}

/// Draws a non-negative event count around `expected`.
///
/// Gaussian proxy for a Poisson draw with standard deviation `sqrt(expected)`,
/// truncated toward zero. Non-positive expectations never touch the source.
pub fn sample_count(expected: f64, rng: &mut dyn RandomSource) -> u64 {
    if !(expected > 0.0) {
        return 0;
    }
    let sample = rng.normal(expected, expected.sqrt());
    // `as` saturates: negatives and NaN land on 0.
    sample.max(0.0) as u64
}
