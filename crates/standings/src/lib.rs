//! # Gridstats Standings Engine
//!
//! Turns per-round session points into championship tables.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It never reads the database;
//!   the caller hands it the roster, a points lookup and the previous round's
//!   table, and persists what it returns.
//! - **Append-Only History:** Each round's table is derived from the previous
//!   round's stored table. A missing previous table is an error, never zero.
//!
//! ## Public API
//!
//! - `PointsTable`: finishing position to points, per session type.
//! - `StandingsEngine`: cumulative points, ordering and title contention.
//! - `StandingsError`: the specific error types that can be returned from this crate.

pub mod engine;
pub mod error;
pub mod points;

pub use engine::{RemainingEvents, Standing, StandingsEngine, assign_positions, title_contention};
pub use error::StandingsError;
pub use points::PointsTable;
