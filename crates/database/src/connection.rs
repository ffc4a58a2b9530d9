use crate::error::DbError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Opens the season database, creating the file and its folder on first use.
///
/// The pool holds a single connection: the application is a single-user batch
/// tool and SQLite serialises writers anyway.
pub async fn connect(database_url: &str) -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| DbError::ConnectionConfigError(format!("{database_url}: {e}")))?
        .create_if_missing(true)
        .foreign_keys(true);

    if let Some(folder) = options.get_filename().parent() {
        if !folder.as_os_str().is_empty() {
            std::fs::create_dir_all(folder).map_err(|e| {
                DbError::ConnectionConfigError(format!("cannot create {}: {e}", folder.display()))
            })?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    tracing::info!(url = database_url, "Connected to the season database.");
    Ok(pool)
}

/// A private in-memory database. The single connection is never recycled, so
/// the data lives as long as the pool.
pub async fn connect_in_memory() -> Result<SqlitePool, DbError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Applies the embedded migrations, bringing the schema up to date.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), DbError> {
    // Use a relative path from the crate root
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
