//! Bounded retry around a single rank lookup.

use std::time::Duration;

use crate::serp::{LookupError, RankLookup, RankQuery, RankResult};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Pause between consecutive attempts. There is no pause after the last one.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// How one keyword check ended.
#[derive(Debug)]
pub enum CheckOutcome {
    Found(i32),
    NotFound,
    /// Every allowed attempt failed, or the failure could not be retried. `error` is the last one.
    Failed { attempts: u32, error: LookupError },
}

impl CheckOutcome {
    /// Rank to persist, `None` for not found. Failures have nothing to persist.
    pub fn rank(&self) -> Option<i32> {
        match self {
            CheckOutcome::Found(rank) => Some(*rank),
            CheckOutcome::NotFound | CheckOutcome::Failed { .. } => None,
        }
    }
}

impl From<RankResult> for CheckOutcome {
    fn from(result: RankResult) -> Self {
        match result {
            RankResult::Found(rank) => CheckOutcome::Found(rank),
            RankResult::NotFound => CheckOutcome::NotFound,
        }
    }
}

/// Runs the lookup until it succeeds or `policy.max_attempts` attempts have failed.
/// Non-retryable failures (bad or missing API key) end the loop immediately.
///
/// `stop` interrupts the pause between attempts, never a request in flight. Returns `None` when
/// it fired during a pause.
pub async fn lookup_with_retry<L, F>(
    lookup: &L,
    query: &RankQuery,
    policy: &RetryPolicy,
    stop: F,
) -> Option<CheckOutcome>
where
    L: RankLookup + ?Sized,
    F: Future<Output = ()>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    let mut stop = std::pin::pin!(stop);

    loop {
        match lookup.lookup(query).await {
            Ok(result) => return Some(result.into()),
            Err(error) if attempt >= max_attempts || !error.is_retryable() => {
                return Some(CheckOutcome::Failed {
                    attempts: attempt,
                    error,
                });
            }
            Err(error) => {
                tracing::warn!(
                    "[{} ({})] Attempt {}/{} failed, retrying in {:?}: {}",
                    query.keyword,
                    query.domain,
                    attempt,
                    max_attempts,
                    policy.delay,
                    error
                );
                tokio::select! {
                    biased;
                    _ = &mut stop => return None,
                    _ = tokio::time::sleep(policy.delay) => {}
                }
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::pending;

    use super::*;
    use crate::serp::mock::{MockRankLookup, MockResponse};

    fn query() -> RankQuery {
        RankQuery::new("seo tools", "example.com", "United States")
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_try_no_delay() {
        let mock = MockRankLookup::with_default(MockResponse::Found(4));
        let start = tokio::time::Instant::now();

        let outcome = lookup_with_retry(&mock, &query(), &RetryPolicy::default(), pending()).await.unwrap();

        assert!(matches!(outcome, CheckOutcome::Found(4)));
        assert_eq!(mock.call_count(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_success() {
        let mock = MockRankLookup::new();
        let outcome = lookup_with_retry(&mock, &query(), &RetryPolicy::default(), pending()).await.unwrap();

        assert!(matches!(outcome, CheckOutcome::NotFound));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_on_third_attempt() {
        let mock = MockRankLookup::new().script(
            "seo tools",
            vec![MockResponse::ServerError, MockResponse::RateLimited, MockResponse::Found(11)],
        );
        let start = tokio::time::Instant::now();

        let outcome = lookup_with_retry(&mock, &query(), &RetryPolicy::default(), pending()).await.unwrap();

        assert!(matches!(outcome, CheckOutcome::Found(11)));
        assert_eq!(mock.call_count(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_three_attempts() {
        let mock = MockRankLookup::with_default(MockResponse::ServerError);
        let start = tokio::time::Instant::now();

        let outcome = lookup_with_retry(&mock, &query(), &RetryPolicy::default(), pending()).await.unwrap();

        match outcome {
            CheckOutcome::Failed { attempts, error } => {
                assert_eq!(attempts, 3);
                assert!(matches!(error, LookupError::Api { status: 500, .. }));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        // never a 4th attempt, and no pause after the last one
        assert_eq!(mock.call_count(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_not_retried() {
        let mock = MockRankLookup::with_default(MockResponse::Unauthorized);

        let outcome = lookup_with_retry(&mock, &query(), &RetryPolicy::default(), pending()).await.unwrap();

        assert!(matches!(outcome, CheckOutcome::Failed { attempts: 1, .. }));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_means_one() {
        let mock = MockRankLookup::with_default(MockResponse::RateLimited);
        let policy = RetryPolicy {
            max_attempts: 0,
            delay: Duration::from_millis(10),
        };

        let outcome = lookup_with_retry(&mock, &query(), &policy, pending()).await.unwrap();

        assert!(matches!(outcome, CheckOutcome::Failed { attempts: 1, ref error } if error.is_rate_limit()));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_interrupts_backoff() {
        let mock = MockRankLookup::with_default(MockResponse::ServerError);
        let start = tokio::time::Instant::now();
        let stop = tokio::time::sleep(Duration::from_secs(2));

        let outcome = lookup_with_retry(&mock, &query(), &RetryPolicy::default(), stop).await;

        assert!(outcome.is_none());
        assert_eq!(mock.call_count(), 1);
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_never_interrupts_a_request() {
        // already fired, but a first attempt that succeeds has no pause to interrupt
        let mock = MockRankLookup::with_default(MockResponse::Found(3));

        let stop = std::future::ready(());

        let outcome = lookup_with_retry(&mock, &query(), &RetryPolicy::default(), stop).await;

        assert!(matches!(outcome, Some(CheckOutcome::Found(3))));
        assert_eq!(mock.call_count(), 1);
    }
}
