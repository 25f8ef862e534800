pub mod csv;
pub mod scanner;
pub mod tabular;
pub mod xlsx;

pub use self::csv::CsvFormat;
pub use scanner::{collect_sources, scan_directory};
pub use tabular::{SourceHandle, TabularFormat, load_sources, write_table};
pub use xlsx::ExcelFormat;
