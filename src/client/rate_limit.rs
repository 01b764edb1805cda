//! Reactive rate limiting for the Heroku Platform API
//!
//! Heroku grants each account a budget of 4500 requests per hour and reports
//! what is left in the `RateLimit-Remaining` header. Pacing stays off until a
//! 429 arrives or the remaining budget drops under [`LOW_WATER_MARK`].

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use reqwest::header::HeaderMap;

/// Requests per hour granted by Heroku
pub const REQUESTS_PER_HOUR: u32 = 4500;

/// Remaining budget below which pacing starts
pub const LOW_WATER_MARK: u32 = 100;

/// Response header reporting the remaining request budget
pub const REMAINING_HEADER: &str = "RateLimit-Remaining";

/// Account-wide limiter, inactive until activated.
pub struct ReactiveRateLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    active: AtomicBool,
}

impl Default for ReactiveRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactiveRateLimiter {
    /// Create a limiter pacing to the hourly budget spread over minutes.
    pub fn new() -> Self {
        let per_min = REQUESTS_PER_HOUR / 60;
        let quota = Quota::per_minute(NonZeroU32::new(per_min).unwrap_or(NonZeroU32::MIN));

        Self {
            limiter: RateLimiter::direct(quota),
            active: AtomicBool::new(false),
        }
    }

    /// Activate rate limiting (called on 429 or low budget).
    pub fn activate(&self) {
        let was_active = self.active.swap(true, Ordering::SeqCst);
        if !was_active {
            debug!("Rate limiting activated for Heroku API");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait for permission if rate limiting is active.
    pub async fn wait_if_active(&self) {
        if self.is_active() {
            debug!("Waiting for Heroku rate limiter");
            self.limiter.until_ready().await;
        }
    }

    /// Feed the `RateLimit-Remaining` header of a response.
    pub fn observe(&self, headers: &HeaderMap) {
        if let Some(remaining) = remaining_budget(headers)
            && remaining < LOW_WATER_MARK
        {
            debug!("Heroku rate limit budget low: {} remaining", remaining);
            self.activate();
        }
    }
}

/// Parse the remaining request budget from response headers.
pub fn remaining_budget(headers: &HeaderMap) -> Option<u32> {
    headers
        .get(REMAINING_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers_with_remaining(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REMAINING_HEADER, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_starts_inactive() {
        let limiter = ReactiveRateLimiter::new();
        assert!(!limiter.is_active());
    }

    #[test]
    fn test_activation_is_idempotent() {
        let limiter = ReactiveRateLimiter::new();

        limiter.activate();
        assert!(limiter.is_active());

        limiter.activate();
        assert!(limiter.is_active());
    }

    #[test]
    fn test_remaining_budget_parse() {
        assert_eq!(remaining_budget(&headers_with_remaining("4321")), Some(4321));
        assert_eq!(remaining_budget(&headers_with_remaining("lots")), None);
        assert_eq!(remaining_budget(&HeaderMap::new()), None);
    }

    #[test]
    fn test_observe_high_budget_stays_inactive() {
        let limiter = ReactiveRateLimiter::new();
        limiter.observe(&headers_with_remaining("4000"));
        assert!(!limiter.is_active());
    }

    #[test]
    fn test_observe_low_budget_activates() {
        let limiter = ReactiveRateLimiter::new();
        limiter.observe(&headers_with_remaining("12"));
        assert!(limiter.is_active());
    }

    #[tokio::test]
    async fn test_wait_if_inactive_returns_immediately() {
        let limiter = ReactiveRateLimiter::new();
        limiter.wait_if_active().await;
        assert!(!limiter.is_active());
    }
}
