//! Bounded retry policy for page fetches.

use std::time::Duration;

use super::config::BrowserConfig;
use super::error::FetchError;

/// Error text that means the automation handle itself is gone.
const DEAD_SESSION_MARKERS: &[&str] = &[
    "invalid session id",
    "chrome not reachable",
    "session deleted",
    "browser closed",
    "connection closed",
    "channel closed",
    "websocket",
    "target closed",
];

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Try again on the same handle.
    Retry,
    /// Tear the handle down and rebuild it before trying again.
    ResetAndRetry,
    /// Stop retrying.
    GiveUp,
}

/// How many times to try a fetch and how long to wait between tries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Multiplier applied per retry. 1 keeps the delay constant.
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            backoff_factor: 1,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &BrowserConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_delay_ms),
            ..Self::default()
        }
    }

    /// A policy with no waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::ZERO,
            backoff_factor: 1,
        }
    }

    /// Delay before retry number `retry` (1-based), capped at 60 seconds.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = u64::from(self.backoff_factor.max(1)).saturating_pow(retry.saturating_sub(1));
        let delay_ms = (self.base_delay.as_millis() as u64).saturating_mul(factor);
        Duration::from_millis(delay_ms.min(60_000))
    }

    /// Decide what follows a failure on attempt `attempt` (1-based).
    pub fn classify(&self, attempt: u32, error: &FetchError) -> RetryAction {
        if attempt >= self.max_attempts {
            return RetryAction::GiveUp;
        }
        if let FetchError::SessionUnavailable(_) = error {
            return RetryAction::GiveUp;
        }
        if is_dead_session(error) {
            RetryAction::ResetAndRetry
        } else {
            RetryAction::Retry
        }
    }
}

/// Whether the error means the automation handle is dead or unreachable.
pub fn is_dead_session(error: &FetchError) -> bool {
    let text = error.to_string().to_lowercase();
    DEAD_SESSION_MARKERS.iter().any(|m| text.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_session_detection() {
        let dead = FetchError::navigation("https://x", "invalid session id");
        assert!(is_dead_session(&dead));
        let dead = FetchError::navigation("https://x", "Chrome not reachable");
        assert!(is_dead_session(&dead));
        let alive = FetchError::navigation("https://x", "net::ERR_NAME_NOT_RESOLVED");
        assert!(!is_dead_session(&alive));
    }

    #[test]
    fn test_classify() {
        let policy = RetryPolicy::default();
        let dead = FetchError::navigation("u", "invalid session id");
        let flaky = FetchError::Timeout("u".into());

        assert_eq!(policy.classify(1, &dead), RetryAction::ResetAndRetry);
        assert_eq!(policy.classify(2, &flaky), RetryAction::Retry);
        assert_eq!(policy.classify(3, &flaky), RetryAction::GiveUp);
        assert_eq!(
            policy.classify(1, &FetchError::SessionUnavailable("x".into())),
            RetryAction::GiveUp
        );
    }

    #[test]
    fn test_delay_for() {
        let constant = RetryPolicy::default();
        assert_eq!(constant.delay_for(1), Duration::from_secs(2));
        assert_eq!(constant.delay_for(2), Duration::from_secs(2));

        let growing = RetryPolicy {
            backoff_factor: 2,
            ..RetryPolicy::default()
        };
        assert_eq!(growing.delay_for(1), Duration::from_secs(2));
        assert_eq!(growing.delay_for(3), Duration::from_secs(8));
        assert_eq!(growing.delay_for(30), Duration::from_secs(60));
    }
}
