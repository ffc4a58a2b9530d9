use core_types::{RoundNumber, SessionType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Round {0} is not on the calendar")]
    UnknownRound(RoundNumber),

    #[error("Round {0} is already completed")]
    RoundAlreadyCompleted(RoundNumber),

    #[error("Round {0} has not been completed yet")]
    RoundNotCompleted(RoundNumber),

    #[error("Round {round} cannot complete: no {session} results are stored")]
    RoundNotReady {
        round: RoundNumber,
        session: SessionType,
    },

    #[error("Round {round} cannot complete before round {previous}")]
    PreviousRoundNotCompleted {
        round: RoundNumber,
        previous: RoundNumber,
    },

    #[error("Standings error: {0}")]
    Standings(#[from] standings::StandingsError),

    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
}
