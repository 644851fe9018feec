pub mod models;
pub mod repo;
pub mod schema;

use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// In-memory database on a single connection; every pooled connection to
/// `sqlite::memory:` would otherwise get its own empty database.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    connect("sqlite::memory:", 1).await.unwrap()
}
