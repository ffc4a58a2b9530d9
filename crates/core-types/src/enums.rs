use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A timed or scored activity within a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SessionType {
    Q1,
    Q2,
    Q3,
    SQ1,
    SQ2,
    SQ3,
    Sprint,
    Race,
}

impl SessionType {
    pub const ALL: [SessionType; 8] = [
        SessionType::Q1,
        SessionType::Q2,
        SessionType::Q3,
        SessionType::SQ1,
        SessionType::SQ2,
        SessionType::SQ3,
        SessionType::Sprint,
        SessionType::Race,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Q1 => "Q1",
            SessionType::Q2 => "Q2",
            SessionType::Q3 => "Q3",
            SessionType::SQ1 => "SQ1",
            SessionType::SQ2 => "SQ2",
            SessionType::SQ3 => "SQ3",
            SessionType::Sprint => "Sprint",
            SessionType::Race => "Race",
        }
    }

    /// Only Race and Sprint sessions award championship points.
    pub fn is_scoring(&self) -> bool {
        matches!(self, SessionType::Race | SessionType::Sprint)
    }

    /// Race and Sprint sheets report every finisher after the winner as a gap
    /// to the winner rather than as an absolute elapsed time.
    pub fn is_leader_relative(&self) -> bool {
        self.is_scoring()
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SessionType::ALL
            .into_iter()
            .find(|session| session.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::InvalidInput("session type".to_string(), s.to_string()))
    }
}

/// The kind of race weekend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundType {
    /// Qualifying and a Grand Prix.
    Standard,
    /// Sprint qualifying and a Sprint on top of the standard format.
    Sprint,
}

impl RoundType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundType::Standard => "Standard",
            RoundType::Sprint => "Sprint",
        }
    }

    /// The scoring sessions that must be ingested before the round can complete.
    pub fn scoring_sessions(&self) -> &'static [SessionType] {
        match self {
            RoundType::Standard => &[SessionType::Race],
            RoundType::Sprint => &[SessionType::Sprint, SessionType::Race],
        }
    }

    /// Whether a weekend of this type runs the given session.
    pub fn hosts(&self, session: SessionType) -> bool {
        match session {
            SessionType::Sprint | SessionType::SQ1 | SessionType::SQ2 | SessionType::SQ3 => {
                *self == RoundType::Sprint
            }
            _ => true,
        }
    }
}

impl fmt::Display for RoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sprint" => Ok(RoundType::Sprint),
            "standard" | "race" | "conventional" => Ok(RoundType::Standard),
            _ => Err(CoreError::InvalidInput("round type".to_string(), s.to_string())),
        }
    }
}

/// Which of the two championships a ranking table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Championship {
    Drivers,
    Constructors,
}

impl fmt::Display for Championship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Championship::Drivers => f.write_str("drivers"),
            Championship::Constructors => f.write_str("constructors"),
        }
    }
}

/// Lifecycle of a round. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoundState {
    Scheduled,
    ResultsBeingIngested,
    Completed,
}

impl RoundState {
    /// Derives the state from what the store knows about the round.
    pub fn derive(completed: bool, stored_results: u64) -> Self {
        if completed {
            RoundState::Completed
        } else if stored_results > 0 {
            RoundState::ResultsBeingIngested
        } else {
            RoundState::Scheduled
        }
    }
}

/// The qualifying format whose segments a head-to-head compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualifyingFormat {
    GrandPrix,
    SprintShootout,
}

impl QualifyingFormat {
    pub fn segments(&self) -> [SessionType; 3] {
        match self {
            QualifyingFormat::GrandPrix => [SessionType::Q1, SessionType::Q2, SessionType::Q3],
            QualifyingFormat::SprintShootout => {
                [SessionType::SQ1, SessionType::SQ2, SessionType::SQ3]
            }
        }
    }
}
