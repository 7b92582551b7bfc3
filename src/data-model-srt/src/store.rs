//! Keyword persistence.
//!
//! [`KeywordStore`] is the interface the ranking check job (and the keyword endpoints) write through.
//! [`PgKeywordStore`] implements it on Postgres. The free functions at the bottom are read-only
//! dashboard queries that take a connection directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::db::{DbPool, PoolError};
use crate::models::{Keyword, KeywordEntry, NewKeyword, NewRankingHistory, RankingHistory};
use crate::schema::{keywords, ranking_history};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Keyword {0} not found")]
    NotFound(i32),
    #[error("Database error: {0}")]
    Db(#[from] diesel::result::Error),
    #[error("Database pool error: {0}")]
    Pool(String),
}

impl From<PoolError> for StoreError {
    fn from(error: PoolError) -> Self {
        Self::Pool(format!("{:?}", error))
    }
}

/// Persistence operations needed to track keywords and their rank history.
#[async_trait]
pub trait KeywordStore: Send + Sync {
    /// All keywords, least recently checked first. Never-checked keywords come before everything else.
    async fn list_all(&self) -> Result<Vec<Keyword>, StoreError>;

    /// Stores the outcome of one check as a unit: the old `current_rank` moves to `previous_rank`,
    /// `new_rank` becomes current, `last_checked` is set to now, and a history entry is appended
    /// only if a rank was found.
    async fn record_check(&self, keyword_id: i32, new_rank: Option<i32>) -> Result<(), StoreError>;

    /// Removes the keyword and all of its history.
    async fn delete(&self, keyword_id: i32) -> Result<(), StoreError>;

    /// Inserts new keywords for a domain and country, skipping any (keyword, domain, country) that
    /// already exists. Returns the number of rows created.
    async fn bulk_insert(&self, domain: &str, country: &str, entries: Vec<KeywordEntry>) -> Result<usize, StoreError>;
}

#[derive(Clone)]
pub struct PgKeywordStore {
    pool: DbPool,
}

impl PgKeywordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeywordStore for PgKeywordStore {
    async fn list_all(&self) -> Result<Vec<Keyword>, StoreError> {
        let mut conn = self.pool.get().await?;

        let keywords = keywords::table
            // ties broken by id so a run's order is deterministic
            .order((keywords::last_checked.asc().nulls_first(), keywords::id.asc()))
            .select(Keyword::as_select())
            .load::<Keyword>(&mut conn)
            .await?;

        Ok(keywords)
    }

    async fn record_check(&self, keyword_id: i32, new_rank: Option<i32>) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                // Lock the row so dashboard readers never see a half-applied check
                let old_rank: Option<i32> = keywords::table
                    .find(keyword_id)
                    .select(keywords::current_rank)
                    .for_update()
                    .first::<Option<i32>>(conn)
                    .await
                    .optional()?
                    .ok_or(StoreError::NotFound(keyword_id))?;

                let checked_at = Utc::now();

                diesel::update(keywords::table.find(keyword_id))
                    .set((
                        keywords::current_rank.eq(new_rank),
                        keywords::previous_rank.eq(old_rank),
                        keywords::last_checked.eq(checked_at),
                    ))
                    .execute(conn)
                    .await?;

                if let Some(rank) = new_rank {
                    diesel::insert_into(ranking_history::table)
                        .values(&NewRankingHistory {
                            keyword_id,
                            rank,
                            checked_at,
                        })
                        .execute(conn)
                        .await?;
                }

                Ok(())
            }
            .scope_boxed()
        })
        .await?;

        tracing::debug!("[keyword: {}] Recorded check (rank: {:?})", keyword_id, new_rank);
        Ok(())
    }

    async fn delete(&self, keyword_id: i32) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, StoreError, _>(|conn| {
            async move {
                // children first, even though the foreign key cascades
                let history = ranking_history::table.filter(ranking_history::keyword_id.eq(keyword_id));
                let history_rows = diesel::delete(history).execute(conn).await?;

                let deleted = diesel::delete(keywords::table.find(keyword_id)).execute(conn).await?;
                if deleted == 0 {
                    return Err(StoreError::NotFound(keyword_id));
                }

                tracing::debug!("[keyword: {}] Deleted with {} history entries", keyword_id, history_rows);
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    async fn bulk_insert(&self, domain: &str, country: &str, entries: Vec<KeywordEntry>) -> Result<usize, StoreError> {
        let rows: Vec<NewKeyword> = entries
            .into_iter()
            .map(|entry| entry.into_new_keyword(domain, country))
            .collect();
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.pool.get().await?;

        let inserted = diesel::insert_into(keywords::table)
            .values(&rows)
            .on_conflict((keywords::keyword, keywords::domain, keywords::country))
            .do_nothing()
            .execute(&mut conn)
            .await?;

        tracing::debug!(
            "Inserted {} of {} keywords for {} ({})",
            inserted,
            rows.len(),
            domain,
            country
        );
        Ok(inserted)
    }
}

//
// Dashboard queries
//

/// Keywords in dashboard order: best rank first, unranked last, then alphabetical.
pub async fn keywords_for_display(conn: &mut AsyncPgConnection) -> Result<Vec<Keyword>, diesel::result::Error> {
    keywords::table
        .order((keywords::current_rank.asc().nulls_last(), keywords::keyword.asc()))
        .select(Keyword::as_select())
        .load(conn)
        .await
}

/// Full history of one keyword, oldest first. Unknown ids yield an empty list.
pub async fn history_for_keyword(
    conn: &mut AsyncPgConnection,
    keyword_id: i32,
) -> Result<Vec<RankingHistory>, diesel::result::Error> {
    ranking_history::table
        .filter(ranking_history::keyword_id.eq(keyword_id))
        .order((ranking_history::checked_at.asc(), ranking_history::id.asc()))
        .select(RankingHistory::as_select())
        .load(conn)
        .await
}

/// History of several keywords checked at or after `since`, oldest first.
pub async fn history_since(
    conn: &mut AsyncPgConnection,
    keyword_ids: &[i32],
    since: DateTime<Utc>,
) -> Result<Vec<RankingHistory>, diesel::result::Error> {
    if keyword_ids.is_empty() {
        return Ok(Vec::new());
    }

    ranking_history::table
        .filter(ranking_history::keyword_id.eq_any(keyword_ids.to_vec()))
        .filter(ranking_history::checked_at.ge(since))
        .order((ranking_history::checked_at.asc(), ranking_history::id.asc()))
        .select(RankingHistory::as_select())
        .load(conn)
        .await
}
