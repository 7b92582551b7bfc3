//! Domain visibility index history, from the Sistrix API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::serp::SearchLocale;

pub const SISTRIX_API_URL: &str = "https://api.sistrix.com/domain.visibilityindex";

/// One weekly visibility value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibilityPoint {
    pub date: DateTime<FixedOffset>,
    pub value: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum VisibilityError {
    #[error("SISTRIX_API_KEY is not set")]
    MissingApiKey,
    #[error("Visibility API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Invalid visibility API response: {0}")]
    InvalidResponse(String),
    #[error("Visibility API request failed: {0}")]
    Http(reqwest::Error),
    #[error("Invalid visibility API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl From<reqwest::Error> for VisibilityError {
    fn from(error: reqwest::Error) -> Self {
        VisibilityError::Http(error.without_url())
    }
}

#[async_trait]
pub trait VisibilityProvider: Send + Sync {
    /// Visibility history of a domain in one country, oldest first.
    async fn visibility_index(&self, domain: &str, country: &str) -> Result<Vec<VisibilityPoint>, VisibilityError>;
}

#[derive(Clone)]
pub struct Sistrix {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
}

impl Sistrix {
    pub fn new(api_key: impl Into<String>) -> Result<Self, VisibilityError> {
        Self::with_api_url(api_key, SISTRIX_API_URL)
    }

    pub fn with_api_url(api_key: impl Into<String>, api_url: impl Into<String>) -> Result<Self, VisibilityError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(VisibilityError::MissingApiKey);
        }
        let api_url = api_url.into();
        Url::parse(&api_url)?;

        let client = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            api_key,
            api_url,
        })
    }

    /// `None` when SISTRIX_API_KEY is unset: the visibility feature is optional.
    pub fn from_env() -> Result<Option<Self>, VisibilityError> {
        match std::env::var("SISTRIX_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Self::new(key).map(Some),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl VisibilityProvider for Sistrix {
    async fn visibility_index(&self, domain: &str, country: &str) -> Result<Vec<VisibilityPoint>, VisibilityError> {
        let locale = SearchLocale::for_country(country);
        let url = Url::parse_with_params(
            &self.api_url,
            &[
                ("api_key", self.api_key.as_str()),
                ("domain", domain),
                ("country", locale.gl),
                ("history", "true"),
                ("format", "json"),
            ],
        )?;
        tracing::debug!("Fetching visibility index for {} ({})", domain, locale.gl);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(VisibilityError::Api {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        parse_visibility(&body)
    }
}

#[derive(Deserialize)]
struct SistrixResponse {
    #[serde(default)]
    answer: Vec<SistrixAnswer>,
    #[serde(default)]
    error: Vec<SistrixError>,
}

#[derive(Deserialize)]
struct SistrixAnswer {
    #[serde(default, rename = "sichtbarkeitsindex")]
    visibility_index: Vec<SistrixValue>,
}

#[derive(Deserialize)]
struct SistrixValue {
    date: DateTime<FixedOffset>,
    value: NumberOrString,
}

#[derive(Deserialize)]
struct SistrixError {
    #[serde(default)]
    error_message: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

fn parse_visibility(body: &str) -> Result<Vec<VisibilityPoint>, VisibilityError> {
    let response: SistrixResponse =
        serde_json::from_str(body).map_err(|e| VisibilityError::InvalidResponse(e.to_string()))?;

    // Sistrix reports some failures in the body of a 200 response
    if let Some(error) = response.error.first() {
        return Err(VisibilityError::Api {
            status: 200,
            message: error.error_message.clone(),
        });
    }

    let mut points = response
        .answer
        .into_iter()
        .flat_map(|answer| answer.visibility_index)
        .map(|v| {
            let value = match v.value {
                NumberOrString::Number(n) => n,
                NumberOrString::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| VisibilityError::InvalidResponse(format!("bad value '{}': {}", s, e)))?,
            };
            Ok(VisibilityPoint { date: v.date, value })
        })
        .collect::<Result<Vec<_>, VisibilityError>>()?;

    points.sort_by_key(|p| p.date);
    Ok(points)
}
