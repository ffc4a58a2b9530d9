use core_types::{Championship, RoundNumber, SessionType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database configuration: {0}")]
    ConnectionConfigError(String),

    #[error("Database error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("The requested data was not found in the database.")]
    NotFound,

    #[error("Trigramme {trigramme} is already taken; car {car_number} was not saved")]
    DuplicateTrigramme {
        trigramme: String,
        car_number: u32,
    },

    #[error("Result name '{0}' is already used by another constructor")]
    DuplicateResultName(String),

    #[error("A {session} result for car {car_number} in round {round} is already stored")]
    DuplicateResult {
        round: RoundNumber,
        car_number: u32,
        session: SessionType,
    },

    #[error("The {championship} ranking for round {round} is already stored")]
    DuplicateRanking {
        championship: Championship,
        round: RoundNumber,
    },

    #[error("Round {0} is already marked as completed")]
    RoundAlreadyCompleted(RoundNumber),

    #[error("Stored row could not be read back: {0}")]
    CorruptRow(String),
}

/// True when `error` is a primary-key or unique-constraint violation.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}
