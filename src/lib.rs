//! Fuzzy duplicate detection and operator-directed cleanup for spreadsheets.
//!
//! Values from the selected columns of one or more sources are normalized,
//! compared pairwise, and presented as match pairs. The operator marks which
//! side of each pair to drop; the crate then writes a deduplicated match
//! report and a cleaned, combined table.

pub mod config;
pub mod core;
pub mod error;
pub mod services;
pub mod session;

pub use config::Config;
pub use error::{DupsyError, InputError, Result};
pub use session::{ComparisonSummary, ExportOutcome, Session};
