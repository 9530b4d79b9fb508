use crate::error::AppError;
use dashmap::DashMap;
use std::time::Instant;

/// Token bucket state for one key
#[derive(Clone)]
struct Bucket {
    capacity: u32,
    tokens: f64,
    refill_rate: f64,
    last_update: Instant,
}

impl Bucket {
    fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            capacity,
            tokens: capacity as f64,
            refill_rate,
            last_update: Instant::now(),
        }
    }

    fn allow_request(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = f64::min(
            self.capacity as f64,
            self.tokens + elapsed * self.refill_rate,
        );
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-user, per-operation token bucket limiter
///
/// Keys combine the user id and the operation, e.g. `"{user}:send_message"`,
/// so a chatty socket cannot starve the same user's REST calls.
pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
        }
    }

    pub fn check_rate_limit(
        &self,
        key: &str,
        capacity: u32,
        refill_rate: f64,
    ) -> Result<(), AppError> {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| Bucket::new(capacity, refill_rate));

        if bucket.allow_request() {
            Ok(())
        } else {
            Err(AppError::RateLimitExceeded(format!("Rate limit for {}", key)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_capacity() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(limiter.check_rate_limit("user:send_message", 5, 0.0).is_ok());
        }
        assert!(limiter.check_rate_limit("user:send_message", 5, 0.0).is_err());
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new();
        assert!(limiter.check_rate_limit("a:initiate", 1, 0.0).is_ok());
        assert!(limiter.check_rate_limit("a:initiate", 1, 0.0).is_err());
        assert!(limiter.check_rate_limit("b:initiate", 1, 0.0).is_ok());
    }
}
