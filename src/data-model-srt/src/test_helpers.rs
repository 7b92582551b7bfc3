//! Test utilities for database operations
//!
//! Helpers for connecting to the test database, seeding keywords and history,
//! and cleaning up between tests.
//!
//! Database-backed tests run only when TEST_DATABASE_URL points at a Postgres database
//! with the migrations in `migrations/` applied (see `scripts/setup_test_db.sh`).
//! Without it, [`test_db_pool`] returns `None` and tests print a `[SKIP]` line.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::deadpool::Pool;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::db::{DbPool, establish_connection_pool};
use crate::models::{Keyword, NewKeyword, NewRankingHistory, RankingHistory};
use crate::schema;

/// Serializes tests that share the test database, across modules of one test binary.
pub static TEST_DB_MUTEX: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

/// Get a connection pool for the test database, if one is configured via TEST_DATABASE_URL.
pub async fn test_db_pool() -> Option<DbPool> {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            println!("[SKIP] TEST_DATABASE_URL is not set");
            return None;
        }
    };

    Some(
        establish_connection_pool(&database_url, Some(4))
            .await
            .expect("Failed to create test database pool - is the test database running?"),
    )
}

/// A pool that never connects until a connection is requested.
/// For route tests that must build state but never touch the database.
pub fn unconnected_pool() -> DbPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new("postgres://nobody@127.0.0.1:1/unused");
    Pool::builder(manager).max_size(1).build().expect("Failed to build unconnected pool")
}

/// Clean all data from the test database
///
/// Deletes history first, then keywords.
pub async fn clean_test_db(pool: &DbPool) {
    let mut conn = pool.get().await.expect("Failed to get database connection");

    diesel::delete(schema::ranking_history::table)
        .execute(&mut conn)
        .await
        .expect("Failed to clean ranking_history table");

    diesel::delete(schema::keywords::table)
        .execute(&mut conn)
        .await
        .expect("Failed to clean keywords table");
}

/// Create a never-checked keyword in the database
pub async fn create_test_keyword(pool: &DbPool, keyword: &str, domain: &str, country: &str) -> Keyword {
    let mut conn = pool.get().await.expect("Failed to get database connection");

    diesel::insert_into(schema::keywords::table)
        .values(&NewKeyword {
            keyword: keyword.to_string(),
            domain: domain.to_string(),
            country: country.to_string(),
            target_url: format!("https://{}/", domain),
            search_volume: Some(100),
        })
        .returning(Keyword::as_returning())
        .get_result(&mut conn)
        .await
        .expect("Failed to insert test keyword")
}

/// Overwrite a keyword's rank state directly, bypassing the check logic
pub async fn set_keyword_ranks(
    pool: &DbPool,
    keyword_id: i32,
    current_rank: Option<i32>,
    previous_rank: Option<i32>,
    last_checked: Option<DateTime<Utc>>,
) {
    let mut conn = pool.get().await.expect("Failed to get database connection");

    diesel::update(schema::keywords::table.find(keyword_id))
        .set((
            schema::keywords::current_rank.eq(current_rank),
            schema::keywords::previous_rank.eq(previous_rank),
            schema::keywords::last_checked.eq(last_checked),
        ))
        .execute(&mut conn)
        .await
        .expect("Failed to update keyword ranks");
}

/// Append a history entry with an explicit timestamp
pub async fn insert_history(pool: &DbPool, keyword_id: i32, rank: i32, checked_at: DateTime<Utc>) {
    let mut conn = pool.get().await.expect("Failed to get database connection");

    diesel::insert_into(schema::ranking_history::table)
        .values(&NewRankingHistory {
            keyword_id,
            rank,
            checked_at,
        })
        .execute(&mut conn)
        .await
        .expect("Failed to insert history entry");
}

/// Get a keyword by ID from the database
pub async fn get_keyword_by_id(pool: &DbPool, keyword_id: i32) -> Option<Keyword> {
    let mut conn = pool.get().await.expect("Failed to get database connection");

    schema::keywords::table
        .find(keyword_id)
        .select(Keyword::as_select())
        .first::<Keyword>(&mut conn)
        .await
        .ok()
}

/// All history rows of one keyword, oldest first
pub async fn get_history(pool: &DbPool, keyword_id: i32) -> Vec<RankingHistory> {
    let mut conn = pool.get().await.expect("Failed to get database connection");

    crate::store::history_for_keyword(&mut conn, keyword_id)
        .await
        .expect("Failed to load history")
}

/// Count all keywords
pub async fn count_keywords(pool: &DbPool) -> i64 {
    let mut conn = pool.get().await.expect("Failed to get database connection");

    schema::keywords::table
        .count()
        .get_result(&mut conn)
        .await
        .expect("Failed to count keywords")
}

/// Seed the test database with sample data
///
/// - "seo tools" (example.com, US): rank 5, previously 12, two history points
/// - "rank tracker" (example.com, US): not found on last check, previously 40
/// - "chaussures" (example.fr, France): never checked
pub async fn seed_test_data(pool: &DbPool) -> Vec<Keyword> {
    let now = Utc::now();

    let seo = create_test_keyword(pool, "seo tools", "example.com", "United States").await;
    set_keyword_ranks(pool, seo.id, Some(5), Some(12), Some(now)).await;
    insert_history(pool, seo.id, 12, now - chrono::Duration::days(2)).await;
    insert_history(pool, seo.id, 5, now).await;

    let tracker = create_test_keyword(pool, "rank tracker", "example.com", "United States").await;
    set_keyword_ranks(pool, tracker.id, None, Some(40), Some(now - chrono::Duration::hours(1))).await;
    insert_history(pool, tracker.id, 40, now - chrono::Duration::days(1)).await;

    let shoes = create_test_keyword(pool, "chaussures", "example.fr", "France").await;

    let mut seeded = Vec::new();
    for id in [seo.id, tracker.id, shoes.id] {
        seeded.push(get_keyword_by_id(pool, id).await.expect("seeded keyword missing"));
    }
    seeded
}
