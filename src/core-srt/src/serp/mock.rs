//! Scripted rank lookup for testing
//!
//! [`MockRankLookup`] answers from per-keyword scripts instead of calling a SERP API,
//! and records every query it receives.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LookupError, RankLookup, RankQuery, RankResult};

/// One canned answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockResponse {
    Found(i32),
    NotFound,
    RateLimited,
    Unauthorized,
    ServerError,
}

impl MockResponse {
    fn into_result(self) -> Result<RankResult, LookupError> {
        match self {
            MockResponse::Found(rank) => Ok(RankResult::Found(rank)),
            MockResponse::NotFound => Ok(RankResult::NotFound),
            MockResponse::RateLimited => Err(LookupError::from_status(429, "Mock rate limit".to_string())),
            MockResponse::Unauthorized => Err(LookupError::from_status(401, "Mock invalid API key".to_string())),
            MockResponse::ServerError => Err(LookupError::from_status(500, "Mock server error".to_string())),
        }
    }
}

/// Mock rank lookup for testing
///
/// A keyword with a script gets the scripted responses in order; once the script runs out
/// (or for keywords without one) the default response is returned.
pub struct MockRankLookup {
    scripts: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    default_response: MockResponse,
    calls: Mutex<Vec<RankQuery>>,
}

impl MockRankLookup {
    /// Every keyword is not found
    pub fn new() -> Self {
        Self::with_default(MockResponse::NotFound)
    }

    pub fn with_default(response: MockResponse) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default_response: response,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue responses for one keyword
    pub fn script(self, keyword: &str, responses: Vec<MockResponse>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(keyword.to_string())
            .or_default()
            .extend(responses);
        self
    }

    /// Every query received so far, in order
    pub fn calls(&self) -> Vec<RankQuery> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of lookups made for one keyword
    pub fn calls_for(&self, keyword: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|q| q.keyword == keyword).count()
    }
}

impl Default for MockRankLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RankLookup for MockRankLookup {
    async fn lookup(&self, query: &RankQuery) -> Result<RankResult, LookupError> {
        self.calls.lock().unwrap().push(query.clone());

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&query.keyword)
            .and_then(|script| script.pop_front());

        scripted.unwrap_or(self.default_response).into_result()
    }
}
