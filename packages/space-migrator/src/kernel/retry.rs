//! Bounded retry with exponential backoff for remote calls.
//!
//! Reads and writes get separate policies. Reads retry anything transient
//! (transport errors, 429, 5xx). Writes only retry a 429, where the server
//! refused the request before acting on it; retrying a create that timed out
//! could duplicate the page or comment.

use confluence_client::{ConfluenceError, Result};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Which kind of remote call is being retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallClass {
    Read,
    Write,
}

impl CallClass {
    fn should_retry(self, error: &ConfluenceError) -> bool {
        match self {
            Self::Read => error.is_transient(),
            Self::Write => error.is_rate_limited(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetryPolicy {
    /// Total attempts including the first; 1 disables retrying.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt + 1`, doubling from `base_delay` and capped at `max_delay`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Read and write policies for one instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetryConfig {
    pub read: RetryPolicy,
    pub write: RetryPolicy,
}

impl RetryConfig {
    pub fn none() -> Self {
        Self {
            read: RetryPolicy::none(),
            write: RetryPolicy::none(),
        }
    }

    pub fn policy(&self, class: CallClass) -> &RetryPolicy {
        match class {
            CallClass::Read => &self.read,
            CallClass::Write => &self.write,
        }
    }

    /// Run `operation` under the policy for `class`.
    pub async fn run<T, O, Fut>(&self, class: CallClass, what: &str, operation: O) -> Result<T>
    where
        O: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        retry(self.policy(class), class, what, operation).await
    }
}

pub async fn retry<T, O, Fut>(
    policy: &RetryPolicy,
    class: CallClass,
    what: &str,
    mut operation: O,
) -> Result<T>
where
    O: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= policy.max_attempts.max(1) || !class.should_retry(&error) {
                    return Err(error);
                }

                let delay = policy.backoff(attempt);
                warn!(
                    what,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Remote call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
