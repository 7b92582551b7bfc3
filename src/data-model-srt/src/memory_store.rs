//! In-memory [`KeywordStore`] for tests that exercise the check job without Postgres.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{Keyword, KeywordEntry, RankingHistory};
use crate::store::{KeywordStore, StoreError};

#[derive(Default)]
pub struct MemoryKeywordStore {
    keywords: Mutex<Vec<Keyword>>,
    history: Mutex<Vec<RankingHistory>>,
    /// `list_all` fails when set
    fail_listing: bool,
    /// `record_check` fails for this keyword id
    fail_record_for: Option<i32>,
}

impl MemoryKeywordStore {
    pub fn new(keywords: Vec<Keyword>) -> Self {
        Self {
            keywords: Mutex::new(keywords),
            ..Default::default()
        }
    }

    /// A store whose every `list_all` fails
    pub fn unavailable() -> Self {
        Self {
            fail_listing: true,
            ..Default::default()
        }
    }

    pub fn failing_record_for(mut self, keyword_id: i32) -> Self {
        self.fail_record_for = Some(keyword_id);
        self
    }

    pub fn keywords(&self) -> Vec<Keyword> {
        self.keywords.lock().unwrap().clone()
    }

    pub fn keyword(&self, keyword_id: i32) -> Option<Keyword> {
        self.keywords.lock().unwrap().iter().find(|k| k.id == keyword_id).cloned()
    }

    pub fn history(&self) -> Vec<RankingHistory> {
        self.history.lock().unwrap().clone()
    }
}

/// A never-checked keyword with the given id
pub fn keyword_fixture(id: i32, keyword: &str, domain: &str, last_checked: Option<DateTime<Utc>>) -> Keyword {
    Keyword {
        id,
        keyword: keyword.to_string(),
        domain: domain.to_string(),
        country: "United States".to_string(),
        target_url: format!("https://{}/", domain),
        search_volume: Some(100),
        current_rank: None,
        previous_rank: None,
        last_checked,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl KeywordStore for MemoryKeywordStore {
    async fn list_all(&self) -> Result<Vec<Keyword>, StoreError> {
        if self.fail_listing {
            return Err(StoreError::Pool("connection refused".to_string()));
        }
        let mut keywords = self.keywords();
        // Option orders None first, matching NULLS FIRST
        keywords.sort_by_key(|k| (k.last_checked, k.id));
        Ok(keywords)
    }

    async fn record_check(&self, keyword_id: i32, new_rank: Option<i32>) -> Result<(), StoreError> {
        if self.fail_record_for == Some(keyword_id) {
            return Err(StoreError::Pool("connection reset".to_string()));
        }

        let checked_at = Utc::now();
        let mut keywords = self.keywords.lock().unwrap();
        let keyword = keywords
            .iter_mut()
            .find(|k| k.id == keyword_id)
            .ok_or(StoreError::NotFound(keyword_id))?;
        keyword.previous_rank = keyword.current_rank;
        keyword.current_rank = new_rank;
        keyword.last_checked = Some(checked_at);

        if let Some(rank) = new_rank {
            let mut history = self.history.lock().unwrap();
            let id = history.len() as i32 + 1;
            history.push(RankingHistory {
                id,
                keyword_id,
                rank,
                checked_at,
            });
        }
        Ok(())
    }

    async fn delete(&self, keyword_id: i32) -> Result<(), StoreError> {
        let mut keywords = self.keywords.lock().unwrap();
        let before = keywords.len();
        keywords.retain(|k| k.id != keyword_id);
        if keywords.len() == before {
            return Err(StoreError::NotFound(keyword_id));
        }
        self.history.lock().unwrap().retain(|h| h.keyword_id != keyword_id);
        Ok(())
    }

    async fn bulk_insert(&self, domain: &str, country: &str, entries: Vec<KeywordEntry>) -> Result<usize, StoreError> {
        let mut keywords = self.keywords.lock().unwrap();
        let mut inserted = 0;
        for entry in entries {
            let exists = keywords
                .iter()
                .any(|k| k.keyword == entry.keyword && k.domain == domain && k.country == country);
            if exists {
                continue;
            }
            let id = keywords.iter().map(|k| k.id).max().unwrap_or(0) + 1;
            let new = entry.into_new_keyword(domain, country);
            keywords.push(Keyword {
                id,
                keyword: new.keyword,
                domain: new.domain,
                country: new.country,
                target_url: new.target_url,
                search_volume: new.search_volume,
                current_rank: None,
                previous_rank: None,
                last_checked: None,
                created_at: Utc::now(),
            });
            inserted += 1;
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_matches_pg_semantics() {
        let store = MemoryKeywordStore::new(vec![
            keyword_fixture(1, "checked", "example.com", Some(Utc::now())),
            keyword_fixture(2, "never", "example.com", None),
        ]);

        let order: Vec<i32> = store.list_all().await.unwrap().iter().map(|k| k.id).collect();
        assert_eq!(order, vec![2, 1]);

        store.record_check(2, Some(4)).await.unwrap();
        store.record_check(2, None).await.unwrap();
        let kw = store.keyword(2).unwrap();
        assert_eq!((kw.current_rank, kw.previous_rank), (None, Some(4)));
        assert_eq!(store.history().len(), 1);

        assert!(matches!(store.record_check(9, Some(1)).await, Err(StoreError::NotFound(9))));
        store.delete(2).await.unwrap();
        assert!(store.history().is_empty());
    }
}
