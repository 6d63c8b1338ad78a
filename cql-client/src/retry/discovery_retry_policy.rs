use derive_more::Constructor;
use rand::{rng, Rng};
use std::time::Duration;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);
const DEFAULT_MAX_ATTEMPTS: usize = 6;

/// Determines the time for the next attempt at integrating a node which reported itself as up.
pub trait RetrySchedule {
    /// Returns next delay or `None` if no more attempts should be made.
    fn next_delay(&mut self) -> Option<Duration>;
}

/// Creates retry schedules for peer discovery triggered by topology events.
pub trait DiscoveryRetryPolicy {
    /// Creates new schedule for a single discovery loop.
    fn new_schedule(&self) -> Box<dyn RetrySchedule + Send + Sync>;
}

/// Retries at constant interval, indefinitely.
#[derive(Copy, Clone, Constructor, Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct ConstantDiscoveryRetryPolicy {
    delay: Duration,
}

impl Default for ConstantDiscoveryRetryPolicy {
    fn default() -> Self {
        ConstantDiscoveryRetryPolicy::new(DEFAULT_BASE_DELAY)
    }
}

impl DiscoveryRetryPolicy for ConstantDiscoveryRetryPolicy {
    fn new_schedule(&self) -> Box<dyn RetrySchedule + Send + Sync> {
        Box::new(ConstantSchedule(self.delay))
    }
}

struct ConstantSchedule(Duration);

impl RetrySchedule for ConstantSchedule {
    fn next_delay(&mut self) -> Option<Duration> {
        Some(self.0)
    }
}

/// Never retries. Discovery runs once per event.
#[derive(Default, Copy, Clone, Debug, PartialEq, Ord, PartialOrd, Eq, Hash)]
pub struct NeverDiscoveryRetryPolicy;

impl DiscoveryRetryPolicy for NeverDiscoveryRetryPolicy {
    fn new_schedule(&self) -> Box<dyn RetrySchedule + Send + Sync> {
        Box::new(NeverSchedule)
    }
}

struct NeverSchedule;

impl RetrySchedule for NeverSchedule {
    fn next_delay(&mut self) -> Option<Duration> {
        None
    }
}

/// Waits exponentially longer between attempts, with added jitter, and gives up after given
/// number of attempts.
#[derive(Copy, Clone, Constructor, Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct ExponentialDiscoveryRetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: usize,
}

impl Default for ExponentialDiscoveryRetryPolicy {
    fn default() -> Self {
        ExponentialDiscoveryRetryPolicy::new(
            DEFAULT_BASE_DELAY,
            DEFAULT_MAX_DELAY,
            DEFAULT_MAX_ATTEMPTS,
        )
    }
}

impl DiscoveryRetryPolicy for ExponentialDiscoveryRetryPolicy {
    fn new_schedule(&self) -> Box<dyn RetrySchedule + Send + Sync> {
        Box::new(ExponentialSchedule {
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            max_attempts: self.max_attempts,
            attempt: 0,
        })
    }
}

struct ExponentialSchedule {
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: usize,
    attempt: usize,
}

impl RetrySchedule for ExponentialSchedule {
    fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }

        let delay = self
            .base_delay
            .saturating_mul(1u32.checked_shl(self.attempt as u32).unwrap_or(u32::MAX))
            .min(self.max_delay);

        self.attempt += 1;

        let jitter = rng().random_range(85..116);

        Some(
            (delay / 100)
                .saturating_mul(jitter)
                .clamp(self.base_delay.min(self.max_delay), self.max_delay),
        )
    }
}
