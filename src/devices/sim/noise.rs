//! Seeded randomness for the simulated sensor

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Gaussian range noise and random dropouts
pub struct RangeNoise {
    rng: SmallRng,
    stddev_mm: f32,
    timeout_rate: f32,
}

impl RangeNoise {
    /// Seed 0 draws from entropy; any other seed is reproducible.
    pub fn new(seed: u64, stddev_mm: f32, timeout_rate: f32) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self {
            rng,
            stddev_mm,
            timeout_rate: timeout_rate.clamp(0.0, 1.0),
        }
    }

    /// Whether this reading should be lost
    pub fn timed_out(&mut self) -> bool {
        self.timeout_rate > 0.0 && self.rng.gen::<f32>() < self.timeout_rate
    }

    /// Perturb a true distance
    pub fn apply(&mut self, distance_mm: f32) -> f32 {
        if self.stddev_mm <= 0.0 {
            return distance_mm;
        }
        let n: f32 = self.rng.sample(StandardNormal);
        distance_mm + n * self.stddev_mm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_noise() {
        let mut a = RangeNoise::new(42, 10.0, 0.5);
        let mut b = RangeNoise::new(42, 10.0, 0.5);
        for _ in 0..50 {
            assert_eq!(a.apply(1000.0), b.apply(1000.0));
            assert_eq!(a.timed_out(), b.timed_out());
        }
    }

    #[test]
    fn test_noiseless() {
        let mut noise = RangeNoise::new(1, 0.0, 0.0);
        for _ in 0..20 {
            assert!(!noise.timed_out());
            assert_eq!(noise.apply(750.0), 750.0);
        }
    }

    #[test]
    fn test_timeout_rate_roughly_honoured() {
        let mut noise = RangeNoise::new(9, 0.0, 0.25);
        let lost = (0..10_000).filter(|_| noise.timed_out()).count();
        let ratio = lost as f32 / 10_000.0;
        assert!((ratio - 0.25).abs() < 0.03, "ratio {}", ratio);
    }
}
