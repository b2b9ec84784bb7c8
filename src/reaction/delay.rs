use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::settings::ReactionSettings;

/// Inclusive bounds for the wait before a target appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub fn from_settings(settings: &ReactionSettings) -> Self {
        Self {
            min: Duration::from_millis(settings.min_delay_ms),
            max: Duration::from_millis(settings.max_delay_ms.max(settings.min_delay_ms)),
        }
    }

    pub fn contains(&self, delay: Duration) -> bool {
        delay >= self.min && delay <= self.max
    }
}

/// Source of per-trial delays. Each call must be independent of the last.
pub trait DelaySampler: Send + Sync {
    fn sample(&mut self, range: DelayRange) -> Duration;
}

/// Uniform draw in milliseconds over the configured range.
pub struct UniformDelay<R = StdRng> {
    rng: R,
}

impl UniformDelay<StdRng> {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng + Send + Sync> DelaySampler for UniformDelay<R> {
    fn sample(&mut self, range: DelayRange) -> Duration {
        let min_ms = range.min.as_millis() as u64;
        let max_ms = range.max.as_millis() as u64;
        Duration::from_millis(self.rng.gen_range(min_ms..=max_ms))
    }
}

/// Replays a fixed list of delays, then repeats the last one.
#[cfg(test)]
pub struct ScriptedDelays {
    delays: std::collections::VecDeque<Duration>,
    last: Duration,
}

#[cfg(test)]
impl ScriptedDelays {
    pub fn new(delays_ms: &[u64]) -> Self {
        Self {
            delays: delays_ms.iter().map(|ms| Duration::from_millis(*ms)).collect(),
            last: Duration::from_millis(delays_ms.last().copied().unwrap_or(800)),
        }
    }
}

#[cfg(test)]
impl DelaySampler for ScriptedDelays {
    fn sample(&mut self, _range: DelayRange) -> Duration {
        self.delays.pop_front().unwrap_or(self.last)
    }
}
