use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use crate::config::PacingConfig;

/// Generates a random delay within the configured range
pub fn random_delay<R: Rng>(rng: &mut R, min_ms: u64, max_ms: u64) -> Duration {
    let delay_ms = rng.gen_range(min_ms..=max_ms);
    Duration::from_millis(delay_ms)
}

/// Per-TA source of delays and correction decisions.
#[derive(Debug, Clone)]
pub struct Pacing {
    rng: StdRng,
    config: PacingConfig,
}

impl Pacing {
    pub fn seeded(config: PacingConfig, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    /// Seed for TA `ta` given the run's base seed.
    pub fn seed_for(base: u64, ta: usize) -> u64 {
        base.wrapping_add(ta as u64)
    }

    pub fn review_delay(&mut self) -> Duration {
        random_delay(
            &mut self.rng,
            self.config.review_min_ms,
            self.config.review_max_ms,
        )
    }

    pub fn mark_delay(&mut self) -> Duration {
        random_delay(&mut self.rng, self.config.mark_min_ms, self.config.mark_max_ms)
    }

    pub fn should_correct(&mut self) -> bool {
        self.rng.gen_ratio(1, self.config.correction_odds.max(1))
    }
}
