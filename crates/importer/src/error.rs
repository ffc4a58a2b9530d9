use core_types::{CarNumber, RoundNumber, SessionType};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}, line {line}: {reason}")]
    InvalidRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("Invalid driver: {0}")]
    InvalidDriver(String),

    #[error("Car number {car_number} or trigramme {trigramme} is already on the roster")]
    DriverAlreadyExists {
        car_number: CarNumber,
        trigramme: String,
    },

    #[error("Car number {0} is not on the driver roster")]
    UnknownEntrant(CarNumber),

    #[error("No constructor is listed under the result name '{0}'")]
    UnknownConstructorName(String),

    #[error("Round {0} is not on the calendar")]
    UnknownRound(RoundNumber),

    #[error("Round {0} is completed; its results can no longer change")]
    RoundCompleted(RoundNumber),

    #[error("Round {round} is not a sprint weekend and has no {session} session")]
    SessionNotInRound {
        round: RoundNumber,
        session: SessionType,
    },

    #[error("Result sheet {0} has no rows")]
    EmptySheet(PathBuf),

    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
}
