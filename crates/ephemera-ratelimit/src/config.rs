use std::time::Duration;
use typed_builder::TypedBuilder;

/// Allowance for one bucket: at most `max_requests` within any trailing `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    #[builder(default = Duration::from_secs(60))]
    pub window: Duration,
}

impl RateLimitConfig {
    /// Paste creation: 10 per minute.
    pub fn create() -> Self {
        Self::builder().max_requests(10).build()
    }

    /// Paste viewing: 100 per minute.
    pub fn view() -> Self {
        Self::builder().max_requests(100).build()
    }
}
