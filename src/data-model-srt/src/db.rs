use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::deadpool::Pool;

pub type PoolError = deadpool::managed::PoolError<diesel_async::pooled_connection::PoolError>;

pub type DbPool = Pool<AsyncPgConnection>;

/// Dashboard reads and the single ranking check job never need many connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionPoolError {
    #[error("Failed to build connection pool: {0}")]
    BuildError(#[from] deadpool::managed::BuildError),
    #[error("Failed to reach the keyword database: {0}")]
    ConnectionError(#[from] PoolError),
}

/// Builds the pool and checks out one connection so an unreachable database is reported at startup,
/// not on the first keyword check.
pub async fn establish_connection_pool(
    database_url: &str,
    max_connections: Option<usize>,
) -> Result<DbPool, ConnectionPoolError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder(manager)
        .max_size(max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS))
        .build()?;

    let _conn = pool.get().await?;
    tracing::debug!("Connection pool ready (max {} connections)", pool.status().max_size);

    Ok(pool)
}
