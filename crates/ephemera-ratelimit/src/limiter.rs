use crate::config::RateLimitConfig;
use dashmap::DashMap;
use ephemera_core::{Clock, SystemClock};
use jiff::{SignedDuration, Timestamp};
use std::collections::VecDeque;
use tracing::debug;

/// Sliding-window limiter keyed by client.
///
/// Each key keeps the instants of its admitted requests. A request is
/// admitted when fewer than `max_requests` of those instants are strictly
/// newer than `now - window`; refused requests are not recorded. Checks on
/// one key are serialized by the map's shard lock, so the count can never
/// overshoot under concurrency.
#[derive(Debug)]
pub struct SlidingWindowLimiter<C = SystemClock> {
    config: RateLimitConfig,
    window: SignedDuration,
    requests: DashMap<String, VecDeque<Timestamp>>,
    clock: C,
}

impl SlidingWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> SlidingWindowLimiter<C> {
    pub fn with_clock(config: RateLimitConfig, clock: C) -> Self {
        // windows beyond SignedDuration's range are effectively unbounded
        let window = SignedDuration::try_from(config.window).unwrap_or(SignedDuration::MAX);
        Self {
            config,
            window,
            requests: DashMap::new(),
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    fn cutoff(&self, now: Timestamp) -> Timestamp {
        now.checked_sub(self.window).unwrap_or(Timestamp::MIN)
    }

    /// Records a request for `key` and reports whether it is within the allowance.
    pub fn is_allowed(&self, key: &str) -> bool {
        let now = self.clock.now();
        let cutoff = self.cutoff(now);
        let max = self.config.max_requests;

        if let Some(mut times) = self.requests.get_mut(key) {
            return admit(&mut times, now, cutoff, max);
        }

        let mut times = self.requests.entry(key.to_owned()).or_default();
        admit(&mut times, now, cutoff, max)
    }

    /// How many more requests `key` could make right now.
    pub fn remaining(&self, key: &str) -> usize {
        let cutoff = self.cutoff(self.clock.now());
        let used = self
            .requests
            .get(key)
            .map_or(0, |times| times.iter().filter(|t| **t > cutoff).count());
        self.config.max_requests.saturating_sub(used)
    }

    /// Drops timestamps that have left the window and forgets keys with none left.
    ///
    /// Returns the number of keys removed.
    pub fn cleanup(&self) -> usize {
        let cutoff = self.cutoff(self.clock.now());
        let before = self.requests.len();
        self.requests.retain(|_, times| {
            times.retain(|t| *t > cutoff);
            !times.is_empty()
        });
        let removed = before.saturating_sub(self.requests.len());
        debug!(removed, tracked = self.requests.len(), "rate limiter sweep");
        removed
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.requests.len()
    }
}

fn admit(times: &mut VecDeque<Timestamp>, now: Timestamp, cutoff: Timestamp, max: usize) -> bool {
    times.retain(|t| *t > cutoff);
    if times.len() >= max {
        return false;
    }
    times.push_back(now);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use ephemera_core::ManualClock;
    use std::sync::Arc;
    use std::time::Duration;

    fn limiter(max: usize) -> (SlidingWindowLimiter<ManualClock>, ManualClock) {
        let clock = ManualClock::new(Timestamp::from_second(1_700_000_000).unwrap());
        let config = RateLimitConfig::builder()
            .max_requests(max)
            .window(Duration::from_secs(60))
            .build();
        (SlidingWindowLimiter::with_clock(config, clock.clone()), clock)
    }

    #[test]
    fn admits_up_to_max_then_refuses() {
        let (limiter, clock) = limiter(3);

        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(limiter.is_allowed("10.0.0.1"));
        assert!(!limiter.is_allowed("10.0.0.1"));

        clock.advance(SignedDuration::from_secs(61));
        assert!(limiter.is_allowed("10.0.0.1"));
    }

    #[test]
    fn keys_are_independent() {
        let (limiter, _clock) = limiter(1);

        assert!(limiter.is_allowed("a"));
        assert!(!limiter.is_allowed("a"));
        assert!(limiter.is_allowed("b"));
    }

    #[test]
    fn refused_requests_are_not_recorded() {
        let (limiter, clock) = limiter(2);

        assert!(limiter.is_allowed("k"));
        clock.advance(SignedDuration::from_secs(30));
        assert!(limiter.is_allowed("k"));
        for _ in 0..10 {
            assert!(!limiter.is_allowed("k"));
        }

        // the first admission leaves the window; refusals never entered it
        clock.advance(SignedDuration::from_secs(31));
        assert_eq!(limiter.remaining("k"), 1);
        assert!(limiter.is_allowed("k"));
        assert!(!limiter.is_allowed("k"));
    }

    #[test]
    fn timestamp_exactly_window_old_is_pruned() {
        let (limiter, clock) = limiter(1);

        assert!(limiter.is_allowed("k"));
        clock.advance(SignedDuration::from_secs(59));
        assert!(!limiter.is_allowed("k"));
        clock.advance(SignedDuration::from_secs(1));
        assert!(limiter.is_allowed("k"));
    }

    #[test]
    fn remaining_counts_down() {
        let (limiter, _clock) = limiter(3);

        assert_eq!(limiter.remaining("k"), 3);
        limiter.is_allowed("k");
        assert_eq!(limiter.remaining("k"), 2);
        limiter.is_allowed("k");
        limiter.is_allowed("k");
        limiter.is_allowed("k");
        assert_eq!(limiter.remaining("k"), 0);
    }

    #[test]
    fn zero_allowance_refuses_everything() {
        let (limiter, _clock) = limiter(0);
        assert!(!limiter.is_allowed("k"));
        assert_eq!(limiter.remaining("k"), 0);
    }

    #[test]
    fn cleanup_forgets_idle_keys() {
        let (limiter, clock) = limiter(5);

        limiter.is_allowed("old");
        clock.advance(SignedDuration::from_secs(45));
        limiter.is_allowed("recent");
        assert_eq!(limiter.tracked_keys(), 2);

        clock.advance(SignedDuration::from_secs(20));
        assert_eq!(limiter.cleanup(), 1);
        assert_eq!(limiter.tracked_keys(), 1);
        assert_eq!(limiter.remaining("recent"), 4);

        clock.advance(SignedDuration::from_secs(60));
        assert_eq!(limiter.cleanup(), 1);
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn concurrent_checks_never_overshoot() {
        let (limiter, _clock) = limiter(50);
        let limiter = Arc::new(limiter);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    let mut admitted = 0;
                    for _ in 0..100 {
                        if limiter.is_allowed("shared") {
                            admitted += 1;
                        }
                        if admitted % 10 == 0 {
                            limiter.cleanup();
                        }
                    }
                    admitted
                })
            })
            .collect();

        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 50);
    }
}
