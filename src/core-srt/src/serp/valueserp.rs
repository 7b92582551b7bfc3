use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use super::{LookupError, RankLookup, RankQuery, RankResult, SearchLocale, find_rank};

pub const VALUESERP_API_URL: &str = "https://api.valueserp.com/search";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`RankLookup`] backed by the ValueSERP search API. One HTTP request per lookup.
#[derive(Clone)]
pub struct ValueSerp {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl std::fmt::Debug for ValueSerp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueSerp").field("api_url", &self.api_url).finish_non_exhaustive()
    }
}

impl ValueSerp {
    pub fn new(api_key: impl Into<String>) -> Result<Self, LookupError> {
        Self::with_api_url(api_key, VALUESERP_API_URL)
    }

    /// Targets a different endpoint, e.g. a local stand-in during tests.
    pub fn with_api_url(api_key: impl Into<String>, api_url: impl Into<String>) -> Result<Self, LookupError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LookupError::MissingApiKey);
        }

        let api_url = api_url.into();
        Url::parse(&api_url)?;

        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key,
            api_url,
        })
    }

    /// Uses VALUESERP_API_KEY (required) and VALUESERP_API_URL (optional override).
    pub fn from_env() -> Result<Self, LookupError> {
        let api_key = std::env::var("VALUESERP_API_KEY").map_err(|_| LookupError::MissingApiKey)?;
        match std::env::var("VALUESERP_API_URL") {
            Ok(api_url) if !api_url.trim().is_empty() => Self::with_api_url(api_key, api_url.trim()),
            _ => Self::new(api_key),
        }
    }

    fn request_url(&self, query: &RankQuery) -> Result<Url, LookupError> {
        let locale = SearchLocale::for_country(&query.country);
        let url = Url::parse_with_params(
            &self.api_url,
            &[
                ("api_key", self.api_key.as_str()),
                ("q", query.keyword.as_str()),
                ("location", query.country.as_str()),
                ("google_domain", locale.google_domain),
                ("gl", locale.gl),
                ("num", "100"),
            ],
        )?;
        Ok(url)
    }
}

#[async_trait]
impl RankLookup for ValueSerp {
    async fn lookup(&self, query: &RankQuery) -> Result<RankResult, LookupError> {
        let url = self.request_url(query)?;
        tracing::debug!("[{} ({})] Querying SERP API for {}", query.keyword, query.domain, query.country);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LookupError::from_status(status.as_u16(), api_error_message(&body)));
        }

        let results = parse_organic_results(&body)?;
        let links = results.iter().map(|r| r.link.as_deref().unwrap_or(""));

        Ok(match find_rank(links, &query.domain) {
            Some(rank) => RankResult::Found(rank),
            None => RankResult::NotFound,
        })
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    organic_results: Option<Vec<OrganicResult>>,
}

#[derive(Deserialize)]
struct OrganicResult {
    #[serde(default)]
    link: Option<String>,
}

fn parse_organic_results(body: &str) -> Result<Vec<OrganicResult>, LookupError> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| LookupError::InvalidResponse(e.to_string()))?;
    response
        .organic_results
        .ok_or_else(|| LookupError::InvalidResponse("no organic_results in response".to_string()))
}

/// The `error` field of an error body, when there is one.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| "Unknown error".to_string())
}
