use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::db::PoolError;
use crate::store::StoreError;

// keywords table model (database representation)
/// A tracked search term for one (domain, country) pair.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::keywords)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Keyword {
    pub id: i32,
    pub keyword: String,
    pub domain: String,
    pub country: String,
    pub target_url: String,
    pub search_volume: Option<i32>,
    /// Position in [1, 100], or None when not found in the top 100 or never checked.
    pub current_rank: Option<i32>,
    /// The value `current_rank` held before the most recent check.
    pub previous_rank: Option<i32>,
    pub last_checked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Keyword {
    /// `current_rank - previous_rank` when both are known, otherwise 0.
    /// Negative means the keyword moved up.
    pub fn rank_change(&self) -> i32 {
        match (self.current_rank, self.previous_rank) {
            (Some(current), Some(previous)) => current - previous,
            _ => 0,
        }
    }

    pub fn trend(&self) -> RankTrend {
        RankTrend::from_change(self.rank_change())
    }

    /// Human readable name used in logs and worker progress.
    pub fn label(&self) -> String {
        format!("{} ({})", self.keyword, self.domain)
    }
}

/// Row to insert into the keywords table
#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = crate::schema::keywords)]
pub struct NewKeyword {
    pub keyword: String,
    pub domain: String,
    pub country: String,
    pub target_url: String,
    pub search_volume: Option<i32>,
}

/// One validated entry of a bulk add, before it's bound to a domain and country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub keyword: String,
    pub target_url: String,
    pub search_volume: i32,
}

impl KeywordEntry {
    pub fn into_new_keyword(self, domain: &str, country: &str) -> NewKeyword {
        NewKeyword {
            keyword: self.keyword,
            domain: domain.to_string(),
            country: country.to_string(),
            target_url: self.target_url,
            search_volume: Some(self.search_volume),
        }
    }
}

// ranking_history table model (database representation)
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Associations, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::ranking_history)]
#[diesel(belongs_to(Keyword))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RankingHistory {
    pub id: i32,
    pub keyword_id: i32,
    pub rank: i32,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = crate::schema::ranking_history)]
pub struct NewRankingHistory {
    pub keyword_id: i32,
    pub rank: i32,
    pub checked_at: DateTime<Utc>,
}

/// History entry as the dashboard charts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub rank: i32,
    pub checked_at: DateTime<Utc>,
}

impl From<RankingHistory> for HistoryPoint {
    fn from(entry: RankingHistory) -> Self {
        HistoryPoint {
            rank: entry.rank,
            checked_at: entry.checked_at,
        }
    }
}

/// Direction of a keyword's most recent rank movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankTrend {
    /// Moved up (rank number went down)
    Improved,
    /// Moved down
    Declined,
    Unchanged,
}

impl RankTrend {
    pub fn from_change(rank_change: i32) -> Self {
        match rank_change {
            c if c < 0 => RankTrend::Improved,
            c if c > 0 => RankTrend::Declined,
            _ => RankTrend::Unchanged,
        }
    }
}

// API Payload Types

/// Keyword as listed by GET /api/keywords, with its derived rank movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordView {
    #[serde(flatten)]
    pub keyword: Keyword,
    pub rank_change: i32,
    pub trend: RankTrend,
}

impl From<Keyword> for KeywordView {
    fn from(keyword: Keyword) -> Self {
        KeywordView {
            rank_change: keyword.rank_change(),
            trend: keyword.trend(),
            keyword,
        }
    }
}

/// Raw entry of POST /api/keywords/bulk. Fields are optional so missing values are
/// reported as validation errors rather than body rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkKeywordEntry {
    pub keyword: Option<String>,
    pub target_url: Option<String>,
    pub search_volume: Option<i64>,
}

/// Input payload for POST /api/keywords/bulk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkAddRequest {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub keywords: Vec<BulkKeywordEntry>,
}

/// Column widths of the keywords table, in characters
pub const MAX_KEYWORD_LEN: usize = 255;
pub const MAX_DOMAIN_LEN: usize = 255;
pub const MAX_COUNTRY_LEN: usize = 100;

/// Upper bound on keywords per bulk request. The rows go into one INSERT, which must stay under
/// Postgres's 65535 bind parameters (5 per row).
pub const MAX_BULK_KEYWORDS: usize = 5000;

fn check_len(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    let len = value.chars().count();
    if len > max {
        return Err(ApiError::InvalidInput(format!(
            "{} must be at most {} characters, got {}",
            field, max, len
        )));
    }
    Ok(())
}

impl BulkAddRequest {
    /// Checks the whole request. A single bad entry rejects everything.
    pub fn validate(self) -> Result<(String, String, Vec<KeywordEntry>), ApiError> {
        let domain = self.domain.trim().to_string();
        let country = self.country.trim().to_string();
        if domain.is_empty() || country.is_empty() {
            return Err(ApiError::InvalidInput("domain and country are required".to_string()));
        }
        check_len("domain", &domain, MAX_DOMAIN_LEN)?;
        check_len("country", &country, MAX_COUNTRY_LEN)?;
        if self.keywords.is_empty() {
            return Err(ApiError::InvalidInput("at least one keyword is required".to_string()));
        }
        if self.keywords.len() > MAX_BULK_KEYWORDS {
            return Err(ApiError::InvalidInput(format!(
                "at most {} keywords per request, got {}",
                MAX_BULK_KEYWORDS,
                self.keywords.len()
            )));
        }

        let entries = self
            .keywords
            .into_iter()
            .enumerate()
            .map(|(index, entry)| validate_entry(index, entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((domain, country, entries))
    }
}

fn validate_entry(index: usize, entry: BulkKeywordEntry) -> Result<KeywordEntry, ApiError> {
    let keyword = non_blank(entry.keyword);
    let target_url = non_blank(entry.target_url);
    match (keyword, target_url, entry.search_volume) {
        (Some(keyword), Some(target_url), Some(volume)) => {
            check_len(&format!("keyword #{}", index + 1), &keyword, MAX_KEYWORD_LEN)?;
            let search_volume = i32::try_from(volume)
                .ok()
                .filter(|v| *v >= 0)
                .ok_or_else(|| {
                    ApiError::InvalidInput(format!(
                        "keyword #{}: search_volume must be a non-negative integer, got {}",
                        index + 1,
                        volume
                    ))
                })?;
            Ok(KeywordEntry {
                keyword,
                target_url,
                search_volume,
            })
        }
        _ => Err(ApiError::InvalidInput(format!(
            "keyword #{}: each keyword must have keyword, target_url, and search_volume",
            index + 1
        ))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Response payload for POST /api/keywords/bulk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAddResponse {
    /// Rows actually created; duplicates of existing (keyword, domain, country) are skipped.
    pub inserted: usize,
    pub submitted: usize,
}

/// Input payload for POST /api/history/bulk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkHistoryRequest {
    pub ids: Vec<i32>,
    pub days: Option<u32>,
}

// API Error Types

/// Error for all dashboard endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "error", content = "details")]
pub enum ApiError {
    /// Request failed validation; nothing was written
    #[serde(rename = "invalid_input")]
    InvalidInput(String),
    /// The referenced keyword does not exist
    #[serde(rename = "not_found")]
    NotFound,
    /// A ranking check is already running
    #[serde(rename = "already_running")]
    AlreadyRunning,
    /// An external collaborator (SERP or visibility API) isn't configured or failed
    #[serde(rename = "unavailable")]
    Unavailable(String),
    /// Unknown error occurred
    #[serde(rename = "unknown")]
    Unknown(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::AlreadyRunning => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

macro_rules! from_error {
    ($lib_err:path, $err_type:tt) => {
        /// Converts a `$lib_err` into an `$err_type::Unknown`.
        impl From<$lib_err> for $err_type {
            fn from(e: $lib_err) -> Self {
                $err_type::Unknown(format!("{:?}", e))
            }
        }
    };
}

from_error!(PoolError, ApiError);

impl From<diesel::result::Error> for ApiError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => ApiError::NotFound,
            _ => ApiError::Unknown(e.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => ApiError::NotFound,
            _ => ApiError::Unknown(e.to_string()),
        }
    }
}
