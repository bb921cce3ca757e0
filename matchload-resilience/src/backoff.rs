//! Randomized wait durations

use rand::Rng;
use std::time::Duration;

/// Delay drawn uniformly from an inclusive `[min, max]` interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformDelay {
    min: Duration,
    max: Duration,
}

impl UniformDelay {
    /// Create a delay range; inverted bounds are swapped
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// A range that always yields `delay`
    pub fn fixed(delay: Duration) -> Self {
        Self::new(delay, delay)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Draw a delay using the thread-local generator
    pub fn sample(&self) -> Duration {
        self.sample_with(&mut rand::rng())
    }

    /// Draw a delay from the given generator
    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let low = saturating_nanos(self.min);
        let high = saturating_nanos(self.max);
        if low == high {
            return self.min;
        }
        Duration::from_nanos(rng.random_range(low..=high))
    }
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
