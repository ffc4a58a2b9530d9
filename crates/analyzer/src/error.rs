use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Database error: {0}")]
    Database(#[from] database::DbError),

    #[error("No driver with trigramme '{0}' is on the roster")]
    UnknownDriver(String),
}
