//! Per-client request rate limiting

mod limiter;

pub use limiter::{RateLimitResult, RateLimiter, RateLimiterConfig};
