//! Periodic trigger for the ranking check.
//!
//! The cron service owns no keyword state: it asks the API server to start a check and lets the
//! server's run-lock decide whether one actually starts.

use serde::Deserialize;

pub mod errors;

pub use errors::Error;

/// Default time between triggers: once a day
pub const DEFAULT_POLL_INTERVAL_S: u64 = 24 * 60 * 60;

/// What the API server did with a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Started,
    /// A check was already in progress; nothing new was started
    AlreadyRunning,
}

#[derive(Deserialize)]
struct ErrorBody {
    details: Option<String>,
}

/// Sends POST /api/worker/run to start a ranking check
pub async fn trigger_check(client: &reqwest::Client, api_base_url: &str) -> Result<TriggerOutcome, Error> {
    let endpoint = url::Url::parse(api_base_url)?.join("/api/worker/run")?;

    let response = client.post(endpoint).send().await?;
    let status = response.status();

    match status {
        reqwest::StatusCode::ACCEPTED => {
            tracing::info!("Ranking check started");
            Ok(TriggerOutcome::Started)
        }
        reqwest::StatusCode::CONFLICT => {
            tracing::info!("Ranking check already in progress, skipping this cycle");
            Ok(TriggerOutcome::AlreadyRunning)
        }
        reqwest::StatusCode::SERVICE_UNAVAILABLE => {
            let details = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|b| b.details)
                .unwrap_or_else(|| "service unavailable".to_string());
            Err(Error::Unavailable(details))
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(Error::UnexpectedStatus {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::{Router, http::StatusCode, routing::post};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_trigger_started() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let router = Router::new().route(
            "/api/worker/run",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::ACCEPTED, r#"{"accepted":true,"message":"Ranking check started"}"#)
                }
            }),
        );
        let base = serve(router).await;

        let outcome = trigger_check(&reqwest::Client::new(), &base).await.unwrap();
        assert_eq!(outcome, TriggerOutcome::Started);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_trigger_already_running() {
        let router = Router::new().route("/api/worker/run", post(|| async { StatusCode::CONFLICT }));
        let base = serve(router).await;

        let outcome = trigger_check(&reqwest::Client::new(), &base).await.unwrap();
        assert_eq!(outcome, TriggerOutcome::AlreadyRunning);
    }

    #[tokio::test]
    async fn test_trigger_unavailable() {
        let router = Router::new().route(
            "/api/worker/run",
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    r#"{"error":"unavailable","details":"no key"}"#,
                )
            }),
        );
        let base = serve(router).await;

        let result = trigger_check(&reqwest::Client::new(), &base).await;
        match result {
            Err(Error::Unavailable(details)) => assert_eq!(details, "no key"),
            other => panic!("expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_trigger_unexpected_status() {
        let router = Router::new().route(
            "/api/worker/run",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(router).await;

        let result = trigger_check(&reqwest::Client::new(), &base).await;
        assert!(matches!(result, Err(Error::UnexpectedStatus { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_trigger_invalid_base_url() {
        let result = trigger_check(&reqwest::Client::new(), "not a url").await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
