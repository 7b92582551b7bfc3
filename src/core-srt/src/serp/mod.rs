//! Rank lookup: where does a domain place in the search results for a keyword?
//!
//! [`RankLookup`] is the seam the ranking check job depends on. [`ValueSerp`] is the production
//! implementation; [`mock::MockRankLookup`] replaces it in tests.

pub mod locale;
pub mod matching;
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;
pub mod valueserp;

use async_trait::async_trait;
use data_model_srt::models::Keyword;

pub use locale::SearchLocale;
pub use matching::{MAX_RESULTS, domains_match, find_rank, normalize_domain, result_host};
pub use valueserp::ValueSerp;

/// One rank question: the keyword searched, the domain looked for, and the country searched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankQuery {
    pub keyword: String,
    pub domain: String,
    pub country: String,
}

impl RankQuery {
    pub fn new(keyword: impl Into<String>, domain: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            domain: domain.into(),
            country: country.into(),
        }
    }
}

impl From<&Keyword> for RankQuery {
    fn from(keyword: &Keyword) -> Self {
        Self::new(&keyword.keyword, &keyword.domain, &keyword.country)
    }
}

/// A successful lookup. Not ranking in the top 100 is a successful answer, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankResult {
    Found(i32),
    NotFound,
}

impl RankResult {
    pub fn rank(&self) -> Option<i32> {
        match self {
            RankResult::Found(rank) => Some(*rank),
            RankResult::NotFound => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("VALUESERP_API_KEY is not set")]
    MissingApiKey,
    #[error("Rate limited by SERP API (429): {0}")]
    RateLimited(String),
    #[error("SERP API rejected the API key ({status}): {message}")]
    Unauthorized { status: u16, message: String },
    #[error("SERP API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Invalid SERP API response: {0}")]
    InvalidResponse(String),
    #[error("SERP API request failed: {0}")]
    Http(reqwest::Error),
    #[error("Invalid SERP API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl LookupError {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            429 => LookupError::RateLimited(message),
            401 | 403 => LookupError::Unauthorized { status, message },
            _ => LookupError::Api { status, message },
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LookupError::RateLimited(_))
    }

    /// False for failures that the same request can never get past.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            LookupError::MissingApiKey | LookupError::Unauthorized { .. } | LookupError::InvalidUrl(_)
        )
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(error: reqwest::Error) -> Self {
        // the request URL carries the API key
        LookupError::Http(error.without_url())
    }
}

/// Finds the rank of a domain for a keyword in one country.
#[async_trait]
pub trait RankLookup: Send + Sync {
    async fn lookup(&self, query: &RankQuery) -> Result<RankResult, LookupError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(LookupError::from_status(429, "slow down".into()).is_rate_limit());
        assert!(matches!(
            LookupError::from_status(401, "bad key".into()),
            LookupError::Unauthorized { status: 401, .. }
        ));
        assert!(matches!(
            LookupError::from_status(403, "bad key".into()),
            LookupError::Unauthorized { status: 403, .. }
        ));
        assert!(matches!(
            LookupError::from_status(500, "boom".into()),
            LookupError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_retryable() {
        assert!(LookupError::RateLimited("x".into()).is_retryable());
        assert!(LookupError::InvalidResponse("x".into()).is_retryable());
        assert!(LookupError::from_status(502, "x".into()).is_retryable());
        assert!(!LookupError::MissingApiKey.is_retryable());
        assert!(!LookupError::from_status(401, "x".into()).is_retryable());
    }

    #[test]
    fn test_api_error_message() {
        let error = LookupError::from_status(500, "Internal failure".into());
        assert_eq!(error.to_string(), "SERP API error: 500 - Internal failure");
    }

    #[test]
    fn test_rank_result() {
        assert_eq!(RankResult::Found(7).rank(), Some(7));
        assert_eq!(RankResult::NotFound.rank(), None);
    }
}
