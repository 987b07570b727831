//! Retry policy and failure classification

use super::FetchError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How 4xx responses are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientErrorPolicy {
    /// Abandon the page immediately
    #[default]
    Fatal,
    /// Retry like any other transient failure
    Retry,
}

/// Outcome of classifying a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Transient,
    Fatal,
}

/// Bounded retry with linearly increasing delay (`attempt × base_delay`)
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub client_errors: ClientErrorPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            client_errors: ClientErrorPolicy::Fatal,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            client_errors: ClientErrorPolicy::default(),
        }
    }

    /// Policy that never sleeps, for tests and dry runs
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    pub fn with_client_errors(mut self, policy: ClientErrorPolicy) -> Self {
        self.client_errors = policy;
        self
    }

    /// Delay before the retry that follows failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    pub fn classify(&self, error: &FetchError) -> FailureClass {
        match error {
            FetchError::Network(_)
            | FetchError::Malformed(_)
            | FetchError::MissingContainer(_) => FailureClass::Transient,
            FetchError::Status { status, .. } => {
                if (400..500).contains(status) {
                    match self.client_errors {
                        ClientErrorPolicy::Fatal => FailureClass::Fatal,
                        ClientErrorPolicy::Retry => FailureClass::Transient,
                    }
                } else {
                    FailureClass::Transient
                }
            }
            FetchError::Service { transient, .. } => {
                if *transient {
                    FailureClass::Transient
                } else {
                    FailureClass::Fatal
                }
            }
            FetchError::Shape(_) | FetchError::Exhausted { .. } => FailureClass::Fatal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_linear_delay() {
        let policy = RetryPolicy::new(4, Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(3));
        assert_eq!(RetryPolicy::immediate(3).delay_for(3), Duration::ZERO);
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn test_server_errors_are_transient() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.classify(&status(503)), FailureClass::Transient);
        assert_eq!(policy.classify(&status(500)), FailureClass::Transient);
        assert_eq!(
            policy.classify(&FetchError::Malformed("eof".into())),
            FailureClass::Transient
        );
        assert_eq!(
            policy.classify(&FetchError::MissingContainer("response".into())),
            FailureClass::Transient
        );
    }

    #[test]
    fn test_client_error_split_is_configurable() {
        let fatal = RetryPolicy::default();
        assert_eq!(fatal.classify(&status(404)), FailureClass::Fatal);

        let lenient = RetryPolicy::default().with_client_errors(ClientErrorPolicy::Retry);
        assert_eq!(lenient.classify(&status(404)), FailureClass::Transient);
    }

    #[test]
    fn test_service_codes_follow_their_flag() {
        let policy = RetryPolicy::default();
        let transient = FetchError::Service {
            code: "22".into(),
            message: "LIMITED_NUMBER_OF_SERVICE_REQUESTS_EXCEEDS_ERROR".into(),
            transient: true,
        };
        let fatal = FetchError::Service {
            code: "30".into(),
            message: "SERVICE_KEY_IS_NOT_REGISTERED_ERROR".into(),
            transient: false,
        };
        assert_eq!(policy.classify(&transient), FailureClass::Transient);
        assert_eq!(policy.classify(&fatal), FailureClass::Fatal);
    }
}
