//! Retry policies for node RPC calls.
//!
//! Every node RPC method is a read-only query, so retrying is always safe;
//! whether to retry is still the caller's choice.

use std::time::Duration;

use rand::Rng;

use crate::error::SdkError;

/// Retry policy for a call.
#[derive(Debug, Clone)]
pub enum RetryPolicy {
    /// No retries: failures surface immediately.
    None,
    /// Retry timeouts and transient RPC statuses with the default backoff.
    Idempotent,
    /// User-provided retry logic.
    Custom(RetryConfig),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::None
    }
}

impl RetryPolicy {
    /// Resolved config, or `None` when retries are off.
    pub fn config(&self) -> Option<RetryConfig> {
        match self {
            RetryPolicy::None => None,
            RetryPolicy::Idempotent => Some(RetryConfig::idempotent()),
            RetryPolicy::Custom(c) => Some(c.clone()),
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the initial call).
    pub max_retries: u32,
    /// Initial delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
    /// Whether to add jitter to the delay.
    pub jitter: bool,
    /// Whether a call that hit its deadline is retried.
    pub retry_on_timeout: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
            jitter: true,
            retry_on_timeout: false,
        }
    }
}

impl RetryConfig {
    /// The default config for read-only queries.
    pub fn idempotent() -> Self {
        Self {
            retry_on_timeout: true,
            ..Self::default()
        }
    }

    /// Whether `error` is worth another attempt under this config.
    pub fn should_retry(&self, error: &SdkError) -> bool {
        match error {
            SdkError::Transport(crate::error::TransportError::Timeout(_)) => self.retry_on_timeout,
            other => other.is_retryable(),
        }
    }

    /// Backoff before retry number `attempt + 1`, capped at `max_delay`.
    ///
    /// With jitter, the capped delay is scaled by a random factor in
    /// `[0.75, 1.25]`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        let capped = Duration::try_from_secs_f64(scaled)
            .unwrap_or(self.max_delay)
            .min(self.max_delay);

        if !self.jitter {
            return capped;
        }
        capped.mul_f64(rand::thread_rng().gen_range(0.75..=1.25))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AuthError, TransportError};

    #[test]
    fn test_retry_policy_default_is_none() {
        assert!(matches!(RetryPolicy::default(), RetryPolicy::None));
        assert!(RetryPolicy::None.config().is_none());
    }

    #[test]
    fn test_idempotent_retries_timeouts_but_default_does_not() {
        let timeout: SdkError = TransportError::Timeout(Duration::from_secs(1)).into();
        assert!(RetryConfig::idempotent().should_retry(&timeout));
        assert!(!RetryConfig::default().should_retry(&timeout));
    }

    #[test]
    fn test_never_retries_auth_failures() {
        let err: SdkError = AuthError::InvalidSignature.into();
        assert!(!RetryConfig::idempotent().should_retry(&err));
    }

    #[test]
    fn test_retries_unavailable_status() {
        let err: SdkError = TransportError::Status {
            code: "Unavailable".into(),
            message: "connection refused".into(),
        }
        .into();
        assert!(RetryConfig::default().should_retry(&err));
    }

    #[test]
    fn test_node_backoff_doubles_until_cap() {
        let config = RetryConfig {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(1),
            jitter: false,
            ..RetryConfig::idempotent()
        };
        let delays: Vec<_> = (0..4).map(|a| config.delay_for_attempt(a).as_millis()).collect();
        assert_eq!(delays, [250, 500, 1000, 1000]);
    }

    #[test]
    fn test_backoff_survives_huge_attempt_counts() {
        let config = RetryConfig {
            jitter: false,
            ..RetryConfig::default()
        };
        assert_eq!(config.delay_for_attempt(u32::MAX), config.max_delay);
    }

    #[test]
    fn test_jitter_stays_within_a_quarter() {
        let config = RetryConfig {
            initial_delay: Duration::from_millis(400),
            ..RetryConfig::default()
        };
        for _ in 0..50 {
            let d = config.delay_for_attempt(0).as_millis();
            assert!((299..=500).contains(&d), "delay {d}ms out of range");
        }
    }
}
