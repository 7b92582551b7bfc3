//! Tests for the ranking check job
//!
//! These run the job against an in-memory keyword store and a scripted rank lookup,
//! with tokio's clock paused so retry delays, request spacing and cooldowns are exact.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use core_srt::serp::mock::{MockRankLookup, MockResponse};
use data_model_srt::StoreError;
use data_model_srt::memory_store::{MemoryKeywordStore, keyword_fixture};
use data_model_srt::models::Keyword;
use tokio::time::Instant;
use worker_srt::{CheckConfig, CheckSummary, Error, ProgressReporter, RankingCheckJob};

fn create_job(store: &Arc<MemoryKeywordStore>, lookup: &Arc<MockRankLookup>) -> RankingCheckJob {
    RankingCheckJob::new(
        store.clone(),
        lookup.clone(),
        ProgressReporter::new(),
        CheckConfig::default(),
    )
}

fn keywords(names: &[&str]) -> Vec<Keyword> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| keyword_fixture(i as i32 + 1, name, "example.com", None))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_checks_least_recently_checked_first() {
    let now = Utc::now();
    let store = Arc::new(MemoryKeywordStore::new(vec![
        keyword_fixture(1, "yesterday", "example.com", Some(now - chrono::Duration::days(1))),
        keyword_fixture(2, "never", "example.com", None),
        keyword_fixture(3, "last week", "example.com", Some(now - chrono::Duration::days(7))),
    ]));
    let lookup = Arc::new(MockRankLookup::with_default(MockResponse::Found(5)));
    let job = create_job(&store, &lookup);
    let start = Instant::now();

    let summary = job.run().await.unwrap();

    assert_eq!(
        summary,
        CheckSummary {
            total: 3,
            checked: 3,
            errors: 0,
            cancelled: false,
        }
    );
    let order: Vec<String> = lookup.calls().into_iter().map(|q| q.keyword).collect();
    assert_eq!(order, vec!["never", "last week", "yesterday"]);

    // one request delay between each pair of keywords, none after the last
    assert_eq!(start.elapsed(), Duration::from_secs(2));

    for keyword in store.keywords() {
        assert_eq!(keyword.current_rank, Some(5));
        assert!(keyword.last_checked.is_some());
    }
    assert_eq!(store.history().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_not_found_is_persisted_as_success() {
    let mut tracked = keyword_fixture(1, "seo tools", "example.com", None);
    tracked.current_rank = Some(7);
    let store = Arc::new(MemoryKeywordStore::new(vec![tracked]));
    let lookup = Arc::new(MockRankLookup::new());
    let job = create_job(&store, &lookup);

    let summary = job.run().await.unwrap();

    assert_eq!(summary.checked, 1);
    assert_eq!(summary.errors, 0);
    let updated = store.keyword(1).unwrap();
    assert_eq!(updated.current_rank, None);
    assert_eq!(updated.previous_rank, Some(7));
    assert_eq!(updated.rank_change(), 0);
    assert!(store.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_keyword_is_counted_and_skipped() {
    let store = Arc::new(MemoryKeywordStore::new(keywords(&["alpha", "broken", "gamma"])));
    let lookup = Arc::new(MockRankLookup::with_default(MockResponse::Found(2)).script(
        "broken",
        vec![MockResponse::ServerError, MockResponse::ServerError, MockResponse::ServerError],
    ));
    let job = create_job(&store, &lookup);
    let start = Instant::now();

    let summary = job.run().await.unwrap();

    assert_eq!(summary.checked, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(lookup.calls_for("broken"), 3);
    // two retry delays plus two request delays
    assert_eq!(start.elapsed(), Duration::from_secs(12));

    // the failed keyword is left untouched
    let broken = store.keyword(2).unwrap();
    assert_eq!(broken.last_checked, None);
    assert_eq!(store.keyword(3).unwrap().current_rank, Some(2));

    let progress = job.progress().snapshot();
    assert!(!progress.is_running);
    assert_eq!(progress.checked_keywords, 2);
    assert_eq!(progress.errors, 1);
    assert_eq!(progress.current_keyword, None);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_triggers_cooldown() {
    let store = Arc::new(MemoryKeywordStore::new(keywords(&["limited", "next"])));
    let lookup = Arc::new(
        MockRankLookup::with_default(MockResponse::Found(1)).script("limited", vec![MockResponse::RateLimited; 3]),
    );
    let job = create_job(&store, &lookup);
    let start = Instant::now();

    let summary = job.run().await.unwrap();

    assert_eq!(summary.errors, 1);
    assert_eq!(summary.checked, 1);
    // 2 x 5s retries, 1s request delay, 60s cooldown
    assert_eq!(start.elapsed(), Duration::from_secs(71));
}

#[tokio::test(start_paused = true)]
async fn test_no_cooldown_after_last_keyword() {
    let store = Arc::new(MemoryKeywordStore::new(keywords(&["limited"])));
    let lookup = Arc::new(MockRankLookup::with_default(MockResponse::RateLimited));
    let job = create_job(&store, &lookup);
    let start = Instant::now();

    let summary = job.run().await.unwrap();

    assert_eq!(summary.errors, 1);
    assert_eq!(start.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_empty_keyword_list_completes_immediately() {
    let store = Arc::new(MemoryKeywordStore::new(Vec::new()));
    let lookup = Arc::new(MockRankLookup::new());
    let job = create_job(&store, &lookup);

    let summary = job.run().await.unwrap();

    assert_eq!(summary, CheckSummary::default());
    assert_eq!(lookup.call_count(), 0);
    let progress = job.progress().snapshot();
    assert!(!progress.is_running);
    assert_eq!(progress.total_keywords, 0);
    assert!(progress.last_update.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_store_is_fatal() {
    let store = Arc::new(MemoryKeywordStore::unavailable());
    let lookup = Arc::new(MockRankLookup::new());
    let job = create_job(&store, &lookup);

    let result = job.run().await;

    assert!(matches!(result, Err(Error::StoreError(StoreError::Pool(_)))));
    assert_eq!(lookup.call_count(), 0);
    let progress = job.progress().snapshot();
    assert!(!progress.is_running);
    assert_eq!(progress.errors, 1);
    assert!(!job.is_running());
}

#[tokio::test(start_paused = true)]
async fn test_store_failure_mid_run_aborts() {
    let store = Arc::new(MemoryKeywordStore::new(keywords(&["alpha", "beta", "gamma"])).failing_record_for(2));
    let lookup = Arc::new(MockRankLookup::with_default(MockResponse::Found(3)));
    let job = create_job(&store, &lookup);

    let result = job.run().await;

    assert!(matches!(result, Err(Error::StoreError(_))));
    // gamma is never looked up
    assert_eq!(lookup.call_count(), 2);
    let progress = job.progress().snapshot();
    assert!(!progress.is_running);
    assert_eq!(progress.checked_keywords, 1);
    assert_eq!(progress.errors, 1);
    assert_eq!(progress.current_keyword, None);
}

#[tokio::test(start_paused = true)]
async fn test_second_run_is_rejected_while_locked() {
    let store = Arc::new(MemoryKeywordStore::new(keywords(&["alpha"])));
    let lookup = Arc::new(MockRankLookup::new());
    let job = create_job(&store, &lookup);

    let guard = job.try_lock().unwrap();
    assert!(job.is_running());
    assert!(matches!(job.run().await, Err(Error::AlreadyRunning)));
    assert!(matches!(job.try_lock(), Err(Error::AlreadyRunning)));
    assert_eq!(lookup.call_count(), 0);

    let summary = job.run_locked(guard).await.unwrap();
    assert_eq!(summary.checked, 1);
    assert!(!job.is_running());

    // the slot is free again
    assert!(job.run().await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_before_next_keyword() {
    let store = Arc::new(MemoryKeywordStore::new(keywords(&["alpha", "beta", "gamma"])));
    let lookup = Arc::new(MockRankLookup::with_default(MockResponse::Found(8)));
    let job = Arc::new(create_job(&store, &lookup));

    let handle = tokio::spawn({
        let job = job.clone();
        async move { job.run().await }
    });

    while lookup.call_count() == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // the job is now waiting out the request delay after "alpha"
    let progress = job.progress().snapshot();
    assert!(progress.is_running);
    assert_eq!(progress.checked_keywords, 1);
    assert_eq!(progress.current_keyword.as_deref(), Some("alpha (example.com)"));

    job.cancel();
    let summary = handle.await.unwrap().unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.checked, 1);
    assert_eq!(lookup.call_count(), 1);
    assert!(!job.is_running());

    let progress = job.progress().snapshot();
    assert!(!progress.is_running);
    assert_eq!(progress.current_keyword, None);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_retry_backoff() {
    let store = Arc::new(MemoryKeywordStore::new(keywords(&["alpha", "beta"])));
    let lookup = Arc::new(
        MockRankLookup::with_default(MockResponse::Found(4)).script("alpha", vec![MockResponse::ServerError]),
    );
    let job = Arc::new(create_job(&store, &lookup));
    let start = Instant::now();

    let handle = tokio::spawn({
        let job = job.clone();
        async move { job.run().await }
    });

    while lookup.call_count() == 0 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // first attempt failed, the job is inside the 5s backoff
    job.cancel();
    let summary = handle.await.unwrap().unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.checked, 0);
    assert_eq!(summary.errors, 0);
    assert_eq!(lookup.call_count(), 1);
    assert_eq!(lookup.calls_for("beta"), 0);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(!job.is_running());
    assert!(!job.progress().snapshot().is_running);
    assert_eq!(store.keyword(1).unwrap().last_checked, None);
    assert!(store.history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_rate_limit_cooldown() {
    let store = Arc::new(MemoryKeywordStore::new(keywords(&["alpha", "beta"])));
    let lookup = Arc::new(
        MockRankLookup::with_default(MockResponse::Found(4)).script("alpha", vec![MockResponse::RateLimited; 3]),
    );
    let job = Arc::new(create_job(&store, &lookup));
    let start = Instant::now();

    let handle = tokio::spawn({
        let job = job.clone();
        async move { job.run().await }
    });

    while lookup.call_count() < 3 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_secs(5)).await;

    // retries are exhausted, the job is inside the 61s pause before "beta"
    assert!(job.progress().snapshot().is_running);
    job.cancel();
    let summary = handle.await.unwrap().unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.checked, 0);
    assert_eq!(lookup.call_count(), 3);
    assert_eq!(lookup.calls_for("beta"), 0);
    assert!(start.elapsed() < Duration::from_secs(20));
    assert!(!job.is_running());

    let progress = job.progress().snapshot();
    assert!(!progress.is_running);
    assert_eq!(progress.errors, 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_while_idle_does_not_affect_next_run() {
    let store = Arc::new(MemoryKeywordStore::new(keywords(&["alpha", "beta"])));
    let lookup = Arc::new(MockRankLookup::with_default(MockResponse::Found(8)));
    let job = create_job(&store, &lookup);

    job.cancel();
    let summary = job.run().await.unwrap();

    assert!(!summary.cancelled);
    assert_eq!(summary.checked, 2);
}
