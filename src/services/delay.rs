use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Upper bound (inclusive) of the random delay, in milliseconds.
pub const MAX_DELAY_MS: u64 = 500;

/// Process-wide random source for the random delay endpoint
pub struct DelaySource {
    rng: Mutex<StdRng>,
}

impl DelaySource {
    /// Seed from the current wall-clock time.
    pub fn from_time() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();
        debug!(seed, "Seeding delay source");
        Self::from_seed(seed)
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draw a delay uniformly from `[0, MAX_DELAY_MS]` milliseconds.
    pub fn draw(&self) -> Duration {
        let millis = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            rng.gen_range(0..=MAX_DELAY_MS)
        };
        Duration::from_millis(millis)
    }
}

impl Default for DelaySource {
    fn default() -> Self {
        Self::from_time()
    }
}

impl std::fmt::Debug for DelaySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelaySource")
            .field("max_delay_ms", &MAX_DELAY_MS)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draws_stay_in_range() {
        let source = DelaySource::from_time();
        for _ in 0..10_000 {
            assert!(source.draw() <= Duration::from_millis(MAX_DELAY_MS));
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = DelaySource::from_seed(7);
        let b = DelaySource::from_seed(7);
        let first: Vec<_> = (0..32).map(|_| a.draw()).collect();
        let second: Vec<_> = (0..32).map(|_| b.draw()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_draws_cover_the_range() {
        let source = DelaySource::from_seed(42);
        let draws: Vec<u64> = (0..5_000).map(|_| source.draw().as_millis() as u64).collect();
        assert!(draws.iter().any(|&ms| ms < 50));
        assert!(draws.iter().any(|&ms| ms > 450));
    }
}
