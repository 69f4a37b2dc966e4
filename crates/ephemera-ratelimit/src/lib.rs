//! Per-client request throttling.
//!
//! [`SlidingWindowLimiter`] remembers when each client was last admitted and
//! refuses requests once a client has used up its allowance for the trailing
//! window. [`RateLimiters`] groups the create and view buckets used by the
//! gateway.

pub mod buckets;
pub mod config;
pub mod limiter;

pub use buckets::{Bucket, RateLimiters};
pub use config::RateLimitConfig;
pub use limiter::SlidingWindowLimiter;
