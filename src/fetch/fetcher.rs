//! Page fetcher: one page, retried until it succeeds or the policy gives up

use super::envelope::Envelope;
use super::retry::{FailureClass, RetryPolicy};
use super::transport::{PageRequest, Transport};
use super::{FetchError, Page};
use std::sync::Arc;
use tracing::{debug, warn};

/// Longest body excerpt kept in status errors
const STATUS_BODY_EXCERPT: usize = 200;

/// Fetches and validates pages over a [`Transport`]
pub struct PageFetcher<T: Transport> {
    transport: Arc<T>,
    policy: RetryPolicy,
}

impl<T: Transport> Clone for PageFetcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            policy: self.policy.clone(),
        }
    }
}

impl<T: Transport> PageFetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport: Arc::new(transport),
            policy,
        }
    }

    /// Fetch one page.
    ///
    /// Transient failures are retried with `attempt × base_delay` sleeps.
    /// A fatal failure is returned as-is; running out of attempts returns
    /// [`FetchError::Exhausted`] carrying the last failure.
    pub async fn fetch(&self, request: &PageRequest, envelope: &Envelope) -> Result<Page, FetchError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let error = match self.attempt(request, envelope).await {
                Ok(mut page) => {
                    page.attempts = attempt;
                    debug!(
                        "Fetched {} rows (total {:?}) in {} attempt(s)",
                        page.rows.len(),
                        page.total,
                        attempt
                    );
                    return Ok(page);
                }
                Err(e) => e,
            };

            if self.policy.classify(&error) == FailureClass::Fatal {
                warn!("Fatal fetch error for {}: {}", request.describe(), error);
                return Err(error);
            }

            if attempt >= self.policy.max_attempts {
                return Err(FetchError::Exhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                "Attempt {}/{} failed: {}; retrying in {:?}",
                attempt, self.policy.max_attempts, error, delay
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    async fn attempt(&self, request: &PageRequest, envelope: &Envelope) -> Result<Page, FetchError> {
        let response = self.transport.get(request).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                status: response.status,
                body: crate::util::truncate_str(&response.body, STATUS_BODY_EXCERPT),
            });
        }
        envelope.parse(&response.body)
    }
}
