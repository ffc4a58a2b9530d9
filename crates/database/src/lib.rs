//! # Gridstats Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! SQLite season database. It is the system's "permanent archive" of the
//! roster, the calendar, every session result and every championship table.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** This crate encapsulates all database-specific logic. It
//!   provides a clean, abstract API to the rest of the application, hiding the
//!   underlying SQL and database implementation details.
//! - **Append-Only Results:** Results and rankings are inserted, never updated.
//!   Primary-key violations surface as `DuplicateResult`/`DuplicateRanking`.
//! - **Versioned Schema:** The schema lives in `migrations/` and is applied by
//!   `run_migrations` at startup.
//!
//! ## Public API
//!
//! - `connect`: Opens (and creates, on first run) the database file.
//! - `run_migrations`: Applies database migrations, ensuring the schema is up-to-date.
//! - `DbRepository`: Holds the connection pool and provides all data access methods.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, connect_in_memory, run_migrations};
pub use error::DbError;
pub use repository::{DbRepository, EventCounts};

/// An empty, migrated in-memory repository.
pub async fn in_memory_repository() -> Result<DbRepository, DbError> {
    let pool = connect_in_memory().await?;
    run_migrations(&pool).await?;
    Ok(DbRepository::new(pool))
}
