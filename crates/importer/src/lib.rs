//! # Gridstats Importer
//!
//! Moves season data from CSV files into the database: the driver and
//! constructor rosters, the round calendar, and the per-session result sheets.
//!
//! ## Architectural Principles
//!
//! - **Thin I/O Layer:** Files are read with `csv` into typed rows and handed to
//!   the `DbRepository`. No championship logic lives here apart from turning
//!   a sheet's gaps into absolute times and awarding points.
//! - **Atomic Sheets:** A session sheet is stored in one transaction. Any row
//!   that cannot be resolved rejects the whole sheet.
//! - **Idempotent Rosters:** Re-importing a roster or calendar file skips the
//!   rows that are already stored.
//!
//! ## Public API
//!
//! - `import_drivers`, `import_constructors`, `import_rounds`: roster and calendar import.
//! - `add_driver`: adds one validated driver to the database and the roster file.
//! - `ingest_session`: stores one session sheet for one round.
//! - `ImportError`: the specific error types that can be returned from this crate.

pub mod error;
mod files;
pub mod roster;
pub mod sheet;

pub use error::ImportError;
pub use roster::{
    ImportSummary, add_driver, import_constructors, import_drivers, import_rounds,
    validate_driver,
};
pub use sheet::{SheetRow, ingest_session, resolve_times, row_points};
