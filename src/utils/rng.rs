//! Small deterministic random number generator.
//!
//! Used for random crop offsets in the sample generator and for drawing
//! initial parameters from the per-layer normal distributions. A seed makes
//! both reproducible in tests.

use std::time::{SystemTime, UNIX_EPOCH};

const FALLBACK_SEED: u64 = 0x9e3779b97f4a7c15;

/// Xorshift generator. Not cryptographic.
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    /// Create a new RNG with explicit seed (zero maps to a fixed non-zero state).
    pub fn new(seed: u64) -> Self {
        let state = if seed == 0 { FALLBACK_SEED } else { seed };
        Self { state }
    }

    /// Seed from the wall clock, for runs where reproducibility is not wanted.
    pub fn from_time() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        Self::new(nanos)
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x >> 32) as u32
    }

    /// Uniform sample in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / (u32::MAX as f64 + 1.0)
    }

    /// Integer sample in [0, max], both ends inclusive.
    pub fn gen_inclusive_u32(&mut self, max: u32) -> u32 {
        if max == u32::MAX {
            return self.next_u32();
        }
        self.next_u32() % (max + 1)
    }

    /// Normal sample via Box-Muller. A zero standard deviation returns `mean`.
    pub fn next_gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        if std_dev == 0.0 {
            return mean;
        }
        // u1 must stay away from zero for the logarithm
        let u1 = 1.0 - self.next_f64();
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut rng1 = SimpleRng::new(42);
        let mut rng2 = SimpleRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_zero_seed_is_usable() {
        let mut rng = SimpleRng::new(0);
        assert_ne!(rng.next_u32(), 0);
    }

    #[test]
    fn test_next_f64_range() {
        let mut rng = SimpleRng::new(12345);

        for _ in 0..1000 {
            let val = rng.next_f64();
            assert!((0.0..1.0).contains(&val));
        }
    }

    #[test]
    fn test_gen_inclusive_u32_hits_both_ends() {
        let mut rng = SimpleRng::new(11111);
        let mut seen = [false; 4];

        for _ in 0..1000 {
            let val = rng.gen_inclusive_u32(3);
            assert!(val <= 3);
            seen[val as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_gen_inclusive_u32_zero() {
        let mut rng = SimpleRng::new(22222);
        assert_eq!(rng.gen_inclusive_u32(0), 0);
    }

    #[test]
    fn test_gaussian_moments() {
        let mut rng = SimpleRng::new(33333);
        let n = 20_000;
        let samples: Vec<f64> = (0..n).map(|_| rng.next_gaussian(0.5, 0.1)).collect();

        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;
        assert!((mean - 0.5).abs() < 0.01, "mean {}", mean);
        assert!((var.sqrt() - 0.1).abs() < 0.01, "std dev {}", var.sqrt());
    }

    #[test]
    fn test_gaussian_zero_std_dev_is_constant() {
        let mut rng = SimpleRng::new(44444);
        assert_eq!(rng.next_gaussian(0.25, 0.0), 0.25);
    }
}
