use core_types::{Championship, EntrantKey, RoundNumber};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StandingsError {
    #[error(
        "No {championship} ranking stored for entrant {entrant} after round {round}; \
         round {round} must be ranked before the next one"
    )]
    MissingPriorRanking {
        championship: Championship,
        round: RoundNumber,
        entrant: EntrantKey,
    },

    #[error("Round numbers start at 1")]
    InvalidRound,
}
