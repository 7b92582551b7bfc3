//! Dashboard aggregates computed from keyword rows and rank history.
//!
//! Everything here is pure: callers load the rows, these functions fold them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use data_model_srt::models::{Keyword, RankingHistory};
use serde::{Deserialize, Deserializer, Serialize};

/// Headline KPIs over a set of keywords.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_keywords: usize,
    /// Mean of the present current ranks. Absent when no keyword has a rank.
    pub average_rank: Option<f64>,
    pub top3_count: usize,
    pub top10_count: usize,
    pub last_checked: Option<DateTime<Utc>>,
}

pub fn summarize<'a, I>(keywords: I) -> Summary
where
    I: IntoIterator<Item = &'a Keyword>,
{
    let mut total_keywords = 0;
    let mut rank_sum: i64 = 0;
    let mut ranked = 0;
    let mut top3_count = 0;
    let mut top10_count = 0;
    let mut last_checked: Option<DateTime<Utc>> = None;

    for keyword in keywords {
        total_keywords += 1;
        if let Some(rank) = keyword.current_rank {
            rank_sum += rank as i64;
            ranked += 1;
            if rank <= 3 {
                top3_count += 1;
            }
            if rank <= 10 {
                top10_count += 1;
            }
        }
        last_checked = last_checked.max(keyword.last_checked);
    }

    Summary {
        total_keywords,
        average_rank: (ranked > 0).then(|| rank_sum as f64 / ranked as f64),
        top3_count,
        top10_count,
        last_checked,
    }
}

/// Position band a current rank falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankBucket {
    #[serde(rename = "1-3")]
    Top3,
    #[serde(rename = "4-10")]
    Top10,
    #[serde(rename = "11-20")]
    Top20,
    #[serde(rename = "21-50")]
    Top50,
    #[serde(rename = "51-100")]
    Top100,
    #[serde(rename = "unranked")]
    Unranked,
}

impl RankBucket {
    pub const ALL: [RankBucket; 6] = [
        RankBucket::Top3,
        RankBucket::Top10,
        RankBucket::Top20,
        RankBucket::Top50,
        RankBucket::Top100,
        RankBucket::Unranked,
    ];

    /// Absent ranks and ranks past 100 are unranked.
    pub fn of(rank: Option<i32>) -> Self {
        match rank {
            Some(1..=3) => RankBucket::Top3,
            Some(4..=10) => RankBucket::Top10,
            Some(11..=20) => RankBucket::Top20,
            Some(21..=50) => RankBucket::Top50,
            Some(51..=100) => RankBucket::Top100,
            _ => RankBucket::Unranked,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RankBucket::Top3 => "1-3",
            RankBucket::Top10 => "4-10",
            RankBucket::Top20 => "11-20",
            RankBucket::Top50 => "21-50",
            RankBucket::Top100 => "51-100",
            RankBucket::Unranked => "unranked",
        }
    }
}

impl fmt::Display for RankBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RankBucket::ALL
            .into_iter()
            .find(|bucket| bucket.as_str() == s)
            .ok_or_else(|| format!("unknown rank bucket '{}'", s))
    }
}

/// Keyword counts per [`RankBucket`]. The counts always add up to the number of keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RankDistribution {
    #[serde(rename = "1-3")]
    pub top3: usize,
    #[serde(rename = "4-10")]
    pub top10: usize,
    #[serde(rename = "11-20")]
    pub top20: usize,
    #[serde(rename = "21-50")]
    pub top50: usize,
    #[serde(rename = "51-100")]
    pub top100: usize,
    pub unranked: usize,
}

impl RankDistribution {
    pub fn total(&self) -> usize {
        self.top3 + self.top10 + self.top20 + self.top50 + self.top100 + self.unranked
    }

    fn count_mut(&mut self, bucket: RankBucket) -> &mut usize {
        match bucket {
            RankBucket::Top3 => &mut self.top3,
            RankBucket::Top10 => &mut self.top10,
            RankBucket::Top20 => &mut self.top20,
            RankBucket::Top50 => &mut self.top50,
            RankBucket::Top100 => &mut self.top100,
            RankBucket::Unranked => &mut self.unranked,
        }
    }
}

pub fn distribution<'a, I>(keywords: I) -> RankDistribution
where
    I: IntoIterator<Item = &'a Keyword>,
{
    keywords.into_iter().fold(RankDistribution::default(), |mut dist, keyword| {
        *dist.count_mut(RankBucket::of(keyword.current_rank)) += 1;
        dist
    })
}

/// Average rank of one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub average_rank: Option<f64>,
}

/// Daily average rank over the history entries checked within `[now - days, now]`.
/// One point per date that has entries, ascending. Days without entries are left out.
pub fn trend_series(entries: &[RankingHistory], now: DateTime<Utc>, days: u32) -> Vec<TrendPoint> {
    let cutoff = now - chrono::Duration::days(days as i64);
    let mut by_date: BTreeMap<NaiveDate, (i64, usize)> = BTreeMap::new();

    for entry in entries.iter().filter(|e| e.checked_at >= cutoff && e.checked_at <= now) {
        let (sum, count) = by_date.entry(entry.checked_at.date_naive()).or_insert((0, 0));
        *sum += entry.rank as i64;
        *count += 1;
    }

    by_date
        .into_iter()
        .map(|(date, (sum, count))| TrendPoint {
            date,
            average_rank: (count > 0).then(|| sum as f64 / count as f64),
        })
        .collect()
}

/// Dashboard filter. Unset (or blank) criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct KeywordFilter {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub domain: Option<String>,
    /// Case-insensitive substring of the keyword text.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub rank: Option<RankBucket>,
}

impl KeywordFilter {
    pub fn is_empty(&self) -> bool {
        self == &KeywordFilter::default()
    }

    pub fn matches(&self, keyword: &Keyword) -> bool {
        if let Some(country) = &self.country
            && &keyword.country != country
        {
            return false;
        }
        if let Some(domain) = &self.domain
            && &keyword.domain != domain
        {
            return false;
        }
        if let Some(search) = &self.search
            && !keyword.keyword.to_lowercase().contains(&search.to_lowercase())
        {
            return false;
        }
        match self.rank {
            Some(bucket) => RankBucket::of(keyword.current_rank) == bucket,
            None => true,
        }
    }

    pub fn apply<'a>(&self, keywords: &'a [Keyword]) -> Vec<&'a Keyword> {
        keywords.iter().filter(|k| self.matches(k)).collect()
    }
}

/// Query strings from the dashboard send `rank=` for "all".
fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => T::from_str(s).map(Some).map_err(serde::de::Error::custom),
    }
}
