//! `rollcall-roster`: roster reconciliation engine.
//!
//! Takes an old and a new roster snapshot, keeps the rows of the new one whose
//! key the old one has never seen, cleans their names and derives an email
//! address for each. Table I/O lives in [`table`]; every other stage is a pure
//! function over in-memory tables.

pub mod config;
pub mod diff;
pub mod email;
pub mod error;
pub mod names;
pub mod pipeline;
pub mod table;

pub use config::RosterConfig;
pub use diff::diff;
pub use email::{synthesize_email, OverrideKey, OverrideTable};
pub use error::{RosterError, TableSide};
pub use names::{normalize_names, FixedNames};
pub use pipeline::{reconcile, run, run_files, Reconciliation, RunOutcome, RunReport, RunSummary};
pub use table::{Row, Table};
