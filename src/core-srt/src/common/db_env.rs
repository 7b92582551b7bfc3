use std::env::VarError;

use data_model_srt::db::{ConnectionPoolError, DbPool, establish_connection_pool};

use crate::common::env_config::parse_number;

/// Connects to the keyword database named by DATABASE_URL.
/// DATABASE_MAX_CONNECTIONS optionally caps the pool size.
/// WARNING: Panics if DATABASE_URL is not set or if the connection fails!
pub async fn get_db_pool() -> DbPool {
    let database_url = get_database_url().expect("DATABASE_URL must be set in .env file or present as an env var");
    match try_db_pool(&database_url).await {
        Ok(pool) => pool,
        Err(e) => panic!("Couldn't connect to the database: {}", e),
    }
}

/// Same as [`get_db_pool`], for callers that want to handle the failure themselves.
pub async fn try_db_pool(database_url: &str) -> Result<DbPool, ConnectionPoolError> {
    let max_connections = match parse_number::<usize>("DATABASE_MAX_CONNECTIONS") {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!("Ignoring DATABASE_MAX_CONNECTIONS: {}", e);
            None
        }
    };
    establish_connection_pool(database_url, max_connections).await
}

/// Retrieves the value for the env var DATABASE_URL.
pub fn get_database_url() -> Result<String, VarError> {
    std::env::var("DATABASE_URL")
}
