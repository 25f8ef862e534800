use crate::config::Config;
use crate::core::cleanup::{SourceRemoval, clean, plan_removal};
use crate::core::extract::extract_records;
use crate::core::matcher::{Matcher, pair_count};
use crate::core::report::{REPORT_SHEET, ReportRow, build_report, report_table};
use crate::core::selection::{MatchSet, RemovalSet, Side};
use crate::error::{InputError, Result};
use crate::services::tabular::{SourceHandle, load_sources, write_table};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Sheet name used for the cleaned export.
pub const CLEANED_SHEET: &str = "Cleaned";

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, rows: usize },
    /// There were no pairs, so no file was written. Not an error.
    NothingToExport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonSummary {
    pub sources: usize,
    pub records: usize,
    pub comparisons: usize,
    pub pairs: usize,
}

/// Everything one operator works with: the chosen files, columns and
/// settings, and the result of the latest comparison run.
///
/// Actions are applied one at a time. Re-running the comparison replaces the
/// pairs and resets every intent to the configured default.
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: Config,
    sources: Vec<SourceHandle>,
    columns: Vec<String>,
    matches: Option<MatchSet>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_threshold(&mut self, threshold: u8) {
        self.config.threshold = threshold;
    }

    pub fn set_default_remove_intent(&mut self, value: bool) {
        self.config.default_remove_intent = value;
    }

    pub fn sources(&self) -> &[SourceHandle] {
        &self.sources
    }

    pub fn set_sources(&mut self, sources: Vec<SourceHandle>) {
        self.sources = sources;
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn set_columns(&mut self, columns: Vec<String>) {
        self.columns = columns;
    }

    /// Column names of the first source, offered to the operator for selection.
    pub fn available_columns(&self) -> Result<Vec<String>> {
        let first = self.sources.first().ok_or(InputError::NoSources)?;
        first.columns()
    }

    /// Load every source, extract and match. On failure the previous run's
    /// pairs and intents are left as they were.
    pub fn run_comparison(&mut self) -> Result<ComparisonSummary> {
        self.check_inputs()?;

        let loaded = load_sources(&self.sources)?;
        let mut records = extract_records(&loaded, &self.columns)?;
        if self.config.skip_empty_keys {
            records.retain(|record| !record.key.is_empty());
        }

        let matcher = Matcher::new(self.config.threshold, self.config.metric);
        let pairs = matcher.find_matches(&records);

        let summary = ComparisonSummary {
            sources: loaded.len(),
            records: records.len(),
            comparisons: pair_count(records.len()),
            pairs: pairs.len(),
        };
        self.matches = Some(MatchSet::new(pairs, self.config.default_remove_intent));
        Ok(summary)
    }

    pub fn matches(&self) -> Option<&MatchSet> {
        self.matches.as_ref()
    }

    pub fn matches_mut(&mut self) -> Result<&mut MatchSet> {
        Ok(self.matches.as_mut().ok_or(InputError::NoComparison)?)
    }

    pub fn set_intent(&mut self, index: usize, side: Side, value: bool) -> Result<()> {
        self.matches_mut()?.set_intent(index, side, value)
    }

    fn has_pairs(&self) -> bool {
        self.matches.as_ref().is_some_and(|m| !m.is_empty())
    }

    pub fn removal_set(&self) -> RemovalSet {
        self.matches
            .as_ref()
            .map(MatchSet::removal_set)
            .unwrap_or_default()
    }

    pub fn report(&self) -> Vec<ReportRow> {
        self.matches
            .as_ref()
            .map(|m| build_report(m.all_pairs()))
            .unwrap_or_default()
    }

    /// Rows the cleaned export would drop, without writing anything.
    pub fn preview_cleanup(&self) -> Result<Vec<SourceRemoval>> {
        self.check_inputs()?;
        let loaded = load_sources(&self.sources)?;
        Ok(plan_removal(&loaded, &self.columns, &self.removal_set()))
    }

    pub fn export_report(&self, path: &Path) -> Result<ExportOutcome> {
        let rows = self.report();
        if rows.is_empty() {
            log::info!("No match data to export");
            return Ok(ExportOutcome::NothingToExport);
        }
        write_table(&report_table(&rows), REPORT_SHEET, path)?;
        Ok(ExportOutcome::Written {
            path: path.to_path_buf(),
            rows: rows.len(),
        })
    }

    /// Re-read every source and write the rows that survive the current
    /// removal intents as a single table.
    pub fn export_cleaned(&self, path: &Path) -> Result<ExportOutcome> {
        self.check_inputs()?;
        if !self.has_pairs() {
            log::info!("No match data; cleaned export skipped");
            return Ok(ExportOutcome::NothingToExport);
        }

        let loaded = load_sources(&self.sources)?;
        let cleaned = clean(loaded, &self.columns, &self.removal_set());
        write_table(&cleaned, CLEANED_SHEET, path)?;
        Ok(ExportOutcome::Written {
            path: path.to_path_buf(),
            rows: cleaned.len(),
        })
    }

    fn check_inputs(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(InputError::NoSources.into());
        }
        if self.columns.is_empty() {
            return Err(InputError::NoColumns.into());
        }
        Ok(())
    }
}
