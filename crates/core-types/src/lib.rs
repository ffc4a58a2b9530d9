//! # Gridstats Core Types
//!
//! The shared vocabulary of the championship tracker: entrant keys, session and
//! round types, result records, ranking records and session times.
//!
//! ## Architectural Principles
//!
//! - **Layer 0:** This crate has no knowledge of storage, configuration or I/O.
//!   Every other crate in the workspace depends on it.
//! - **Statically Typed Records:** A `SessionResult` always carries its round
//!   number and session type, so comparisons between results never need to probe
//!   for optional attributes.

pub mod enums;
pub mod error;
pub mod structs;
pub mod time;

// Re-export the core types to provide a clean public API.
pub use enums::{Championship, QualifyingFormat, RoundState, RoundType, SessionType};
pub use error::CoreError;
pub use structs::{
    CarNumber, Constructor, Driver, EntrantKey, FinishingPosition, PaddockNumber, Points,
    RankingEntry, Round, RoundNumber, SessionResult,
};
pub use time::ResultTime;
