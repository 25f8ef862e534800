pub mod cleanup;
pub mod extract;
pub mod matcher;
pub mod normalize;
pub mod report;
pub mod selection;
pub mod similarity;
pub mod table;

pub use cleanup::{SourceRemoval, clean, plan_removal};
pub use extract::{Record, extract_records};
pub use matcher::{MatchPair, Matcher, ThresholdPreset};
pub use normalize::{normalize, normalize_cell};
pub use report::{ReportRow, build_report};
pub use selection::{MatchSet, PairSide, RemovalSet, Side};
pub use similarity::Metric;
pub use table::{Cell, Source, Table};
