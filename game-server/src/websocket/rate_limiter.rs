use std::time::{Duration, Instant};

/// Token-bucket limiter for inbound messages on one socket. A word game
/// never needs more than a handful of messages per second; anything past the
/// bucket is a misbehaving client.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    tokens: u32,
    max_tokens: u32,
    refill_interval: Duration,
    last_refill: Instant,
}

impl RateLimiter {
    pub fn new() -> Self {
        // 20 messages of burst, one token back per second.
        Self::with_limits(20, Duration::from_secs(1))
    }

    pub fn with_limits(max_tokens: u32, refill_interval: Duration) -> Self {
        Self {
            tokens: max_tokens,
            max_tokens,
            refill_interval,
            last_refill: Instant::now(),
        }
    }

    /// Spend a token if one is available.
    pub fn allow(&mut self) -> bool {
        self.refill();
        if self.tokens > 0 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill(&mut self) {
        let elapsed = self.last_refill.elapsed();
        if elapsed >= self.refill_interval {
            let intervals = elapsed.as_millis() / self.refill_interval.as_millis().max(1);
            self.tokens = (self.tokens + intervals as u32).min(self.max_tokens);
            self.last_refill = Instant::now();
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_exhausts() {
        let mut limiter = RateLimiter::with_limits(3, Duration::from_secs(60));
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }

    #[test]
    fn test_tokens_refill_over_time() {
        let mut limiter = RateLimiter::with_limits(1, Duration::from_millis(10));
        assert!(limiter.allow());
        assert!(!limiter.allow());

        std::thread::sleep(Duration::from_millis(25));
        assert!(limiter.allow());
    }

    #[test]
    fn test_refill_caps_at_max() {
        let mut limiter = RateLimiter::with_limits(2, Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(50));
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }
}
