//! Backoff and pagination plumbing for the Directory API.
//!
//! List endpoints hand back one page at a time; every page fetch is retried
//! through [`with_backoff`] when the API signals throttling, and
//! [`drain_pages`] follows `nextPageToken` until the collection is complete.

use std::future::Future;
use std::time::Duration;

use tokio::time;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// Exponential backoff bounds for rate-limited requests.
///
/// The wait starts at `initial_delay`, doubles per attempt, and is capped at
/// `max_delay`. With `max_attempts: None` the request retries until the API
/// stops throttling; the wait cap is the only bound.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Millisecond delays and a bounded attempt count, so tests finish fast.
    pub fn for_testing() -> Self {
        Self {
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            max_attempts: Some(4),
        }
    }

    /// Wait before retry number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// One page of a listing, plus the token for the next one.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// Runs `op`, retrying with the policy's backoff while it fails with a
/// rate-limit error. Any other error propagates immediately. A bounded
/// policy that runs out of attempts fails with
/// [`AppError::RetriesExhausted`].
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_rate_limit() => {
                if let Some(max) = policy.max_attempts {
                    if attempt >= max {
                        return Err(AppError::RetriesExhausted {
                            attempts: attempt,
                            last: err.to_string(),
                        });
                    }
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "directory api throttled, backing off"
                );
                time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Fetches every page of a listing, in server order, with per-page backoff.
///
/// `fetch` receives the page token to request (`None` for the first page)
/// and returns that page. The loop stops when a page carries no next token,
/// so each page is requested exactly once on the success path.
pub async fn drain_pages<T, F, Fut>(policy: &RetryPolicy, mut fetch: F) -> AppResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = AppResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = with_backoff(policy, || fetch(page_token.clone())).await?;
        items.extend(page.items);

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => return Ok(items),
        }
    }
}
