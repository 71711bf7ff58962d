//! Sliding-window limiter guarding outbound searches.

use std::collections::VecDeque;

use tracing::debug;

use crate::error::ThrottleError;

/// Trailing window over which searches are counted.
pub const WINDOW_MS: u64 = 20_000;

/// Searches admitted per window.
pub const MAX_REQ_IN_WINDOW: usize = 6;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    window_ms: u64,
    max_requests: usize,
    // Oldest first.
    timestamps: VecDeque<u64>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(WINDOW_MS, MAX_REQ_IN_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(window_ms: u64, max_requests: usize) -> Self {
        Self {
            window_ms,
            max_requests,
            timestamps: VecDeque::with_capacity(max_requests),
        }
    }

    /// Prunes expired timestamps, then records `now_ms` if there is room.
    ///
    /// A denied attempt is not recorded; the error carries the number of whole
    /// seconds until the oldest kept request leaves the window.
    pub fn admit(&mut self, now_ms: u64) -> Result<(), ThrottleError> {
        let window = self.window_ms;
        self.timestamps
            .retain(|&t| now_ms.saturating_sub(t) < window);

        if self.timestamps.len() >= self.max_requests {
            let oldest = self.timestamps.front().copied().unwrap_or(now_ms);
            let remaining = window.saturating_sub(now_ms.saturating_sub(oldest));
            let wait_seconds = remaining.div_ceil(1000);
            debug!(
                "Rate limit hit: {} requests in window, wait {}s",
                self.timestamps.len(),
                wait_seconds
            );
            return Err(ThrottleError { wait_seconds });
        }

        self.timestamps.push_back(now_ms);
        Ok(())
    }

    /// Requests currently counted against the window.
    pub fn in_window(&self) -> usize {
        self.timestamps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admits_up_to_limit_then_denies() {
        let mut limiter = RateLimiter::default();
        for i in 0..MAX_REQ_IN_WINDOW as u64 {
            assert!(limiter.admit(1_000 + i * 100).is_ok());
        }

        let denied = limiter.admit(1_700).unwrap_err();
        assert!(denied.wait_seconds > 0);
        // 20s window, oldest at 1000ms, now 1700ms -> 19.3s left
        assert_eq!(denied.wait_seconds, 20);
        assert_eq!(limiter.in_window(), MAX_REQ_IN_WINDOW);
    }

    #[test]
    fn test_denied_attempt_is_not_recorded() {
        let mut limiter = RateLimiter::new(1_000, 1);
        assert!(limiter.admit(0).is_ok());
        assert!(limiter.admit(500).is_err());
        // Only the admitted request at t=0 counts, so t=1000 is clear.
        assert!(limiter.admit(1_000).is_ok());
    }

    #[test]
    fn test_window_slides() {
        let mut limiter = RateLimiter::default();
        for i in 0..MAX_REQ_IN_WINDOW as u64 {
            limiter.admit(i * 1_000).unwrap();
        }
        assert!(limiter.admit(19_999).is_err());

        // The request at t=0 expires at exactly WINDOW_MS.
        assert!(limiter.admit(WINDOW_MS).is_ok());
        assert!(limiter.admit(WINDOW_MS + 1).is_err());
    }

    #[test]
    fn test_wait_estimate_rounds_up() {
        let mut limiter = RateLimiter::new(20_000, 1);
        limiter.admit(0).unwrap();
        assert_eq!(limiter.admit(18_500).unwrap_err().wait_seconds, 2);
        assert_eq!(limiter.admit(19_999).unwrap_err().wait_seconds, 1);
    }

    #[test]
    fn test_admitted_never_exceeds_limit_within_window() {
        let mut limiter = RateLimiter::default();
        let admitted = (0..50u64)
            .filter(|i| limiter.admit(i * 300).is_ok())
            .count();
        // 50 attempts over 15s all fall inside one window.
        assert_eq!(admitted, MAX_REQ_IN_WINDOW);
    }
}
