use crate::config::RateLimitConfig;
use crate::limiter::SlidingWindowLimiter;
use ephemera_core::{Clock, SystemClock};
use std::fmt;

/// Which allowance a request draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Create,
    View,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Create => "create",
            Bucket::View => "view",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The create and view limiters, checked by client key.
#[derive(Debug)]
pub struct RateLimiters<C = SystemClock> {
    create: SlidingWindowLimiter<C>,
    view: SlidingWindowLimiter<C>,
}

impl RateLimiters {
    pub fn new(create: RateLimitConfig, view: RateLimitConfig) -> Self {
        Self {
            create: SlidingWindowLimiter::new(create),
            view: SlidingWindowLimiter::new(view),
        }
    }
}

impl Default for RateLimiters {
    fn default() -> Self {
        Self::new(RateLimitConfig::create(), RateLimitConfig::view())
    }
}

impl<C: Clock + Clone> RateLimiters<C> {
    pub fn with_clock(create: RateLimitConfig, view: RateLimitConfig, clock: C) -> Self {
        Self {
            create: SlidingWindowLimiter::with_clock(create, clock.clone()),
            view: SlidingWindowLimiter::with_clock(view, clock),
        }
    }
}

impl<C: Clock> RateLimiters<C> {
    fn limiter(&self, bucket: Bucket) -> &SlidingWindowLimiter<C> {
        match bucket {
            Bucket::Create => &self.create,
            Bucket::View => &self.view,
        }
    }

    pub fn is_allowed(&self, client_key: &str, bucket: Bucket) -> bool {
        self.limiter(bucket).is_allowed(client_key)
    }

    pub fn remaining(&self, client_key: &str, bucket: Bucket) -> usize {
        self.limiter(bucket).remaining(client_key)
    }

    pub fn limit(&self, bucket: Bucket) -> usize {
        self.limiter(bucket).config().max_requests
    }

    /// Sweeps both buckets and returns the total number of keys dropped.
    pub fn cleanup(&self) -> usize {
        self.create.cleanup() + self.view.cleanup()
    }
}
