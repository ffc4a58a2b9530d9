use crate::enums::{RoundType, SessionType};
use crate::time::ResultTime;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A driver's car number.
pub type CarNumber = u32;
/// A constructor's paddock number.
pub type PaddockNumber = u32;
/// Either of the above, when the code does not care which championship it serves.
pub type EntrantKey = u32;
/// 1-based round sequence number.
pub type RoundNumber = u32;
pub type Points = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub name: String,
    /// Three upper-case letters, e.g. "VER".
    pub trigramme: String,
    pub car_number: CarNumber,
    pub nationality: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constructor {
    pub full_name: String,
    /// The name printed in the `Car` column of a session sheet.
    pub result_name: String,
    pub short_name: String,
    pub paddock_number: PaddockNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub round_number: RoundNumber,
    pub round_name: String,
    pub country: String,
    pub circuit: String,
    pub round_date: NaiveDate,
    pub round_type: RoundType,
    pub completed: bool,
}

/// Where an entrant finished a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FinishingPosition {
    Classified(u32),
    /// NC, DQ, DNF, ... kept verbatim.
    Unclassified(String),
}

impl FinishingPosition {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u32>() {
            Ok(position) if position > 0 => FinishingPosition::Classified(position),
            _ => FinishingPosition::Unclassified(trimmed.to_string()),
        }
    }

    pub fn classified(&self) -> Option<u32> {
        match self {
            FinishingPosition::Classified(position) => Some(*position),
            FinishingPosition::Unclassified(_) => None,
        }
    }
}

impl fmt::Display for FinishingPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinishingPosition::Classified(position) => write!(f, "{position}"),
            FinishingPosition::Unclassified(marker) => f.write_str(marker),
        }
    }
}

/// One entrant's outcome in one session of one round.
///
/// Unique per `(round_number, car_number, session_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    pub round_number: RoundNumber,
    pub session_type: SessionType,
    pub car_number: CarNumber,
    pub paddock_number: PaddockNumber,
    pub position: FinishingPosition,
    pub time: ResultTime,
    pub points: Points,
}

impl SessionResult {
    /// The key two results must share to be compared against each other.
    pub fn slot(&self) -> (RoundNumber, SessionType) {
        (self.round_number, self.session_type)
    }
}

/// A row of a championship table after a given round.
///
/// Written once when the round completes and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub round_number: RoundNumber,
    pub entrant_key: EntrantKey,
    pub position: u32,
    pub points: Points,
    pub title_contention: bool,
}
