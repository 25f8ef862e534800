use crate::core::extract::Record;
use crate::core::similarity::Metric;
use serde::{Deserialize, Serialize};

/// Two records whose keys scored at or above the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub key_a: String,
    pub source_a: String,
    pub key_b: String,
    pub source_b: String,
    pub score: u8,
}

/// Threshold presets offered to the operator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdPreset {
    /// 100%
    Complete,
    /// 95%
    Strict,
    /// 87%
    #[default]
    Balanced,
    /// 75%
    Loose,
    /// 65%
    VeryLoose,
}

impl ThresholdPreset {
    pub const ALL: [ThresholdPreset; 5] = [
        ThresholdPreset::Complete,
        ThresholdPreset::Strict,
        ThresholdPreset::Balanced,
        ThresholdPreset::Loose,
        ThresholdPreset::VeryLoose,
    ];

    pub fn value(self) -> u8 {
        match self {
            ThresholdPreset::Complete => 100,
            ThresholdPreset::Strict => 95,
            ThresholdPreset::Balanced => 87,
            ThresholdPreset::Loose => 75,
            ThresholdPreset::VeryLoose => 65,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThresholdPreset::Complete => "Complete Match",
            ThresholdPreset::Strict => "Strict",
            ThresholdPreset::Balanced => "Balanced",
            ThresholdPreset::Loose => "Loose",
            ThresholdPreset::VeryLoose => "Very Loose",
        }
    }
}

/// Exhaustive pairwise matcher.
pub struct Matcher {
    pub threshold: u8,
    pub metric: Metric,
}

impl Matcher {
    pub fn new(threshold: u8, metric: Metric) -> Self {
        Self { threshold, metric }
    }

    /// Score record pairs against each other once each, i < j, and keep those
    /// scoring at least `threshold`. Output is ordered by (i, j).
    ///
    /// Quadratic in `records.len()`. Empty keys are not filtered: two empty
    /// keys always match at 100.
    pub fn find_matches(&self, records: &[Record]) -> Vec<MatchPair> {
        let pairs = self.scan_rows(records);
        log::info!(
            "Compared {} records ({} pairs), {} at or above {}",
            records.len(),
            pair_count(records.len()),
            pairs.len(),
            self.threshold
        );
        pairs
    }

    #[cfg(not(feature = "parallel"))]
    fn scan_rows(&self, records: &[Record]) -> Vec<MatchPair> {
        (0..records.len())
            .flat_map(|i| self.scan_row(records, i))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn scan_rows(&self, records: &[Record]) -> Vec<MatchPair> {
        use rayon::prelude::*;

        (0..records.len())
            .into_par_iter()
            .flat_map_iter(|i| self.scan_row(records, i))
            .collect()
    }

    fn scan_row<'a>(
        &'a self,
        records: &'a [Record],
        i: usize,
    ) -> impl Iterator<Item = MatchPair> + 'a {
        let a = &records[i];
        records[i + 1..].iter().filter_map(move |b| self.compare(a, b))
    }

    /// Score one pair, `None` when it falls below the threshold.
    pub fn compare(&self, a: &Record, b: &Record) -> Option<MatchPair> {
        let similarity = self.metric.similarity(&a.key, &b.key);
        if similarity < f64::from(self.threshold) {
            return None;
        }
        Some(MatchPair {
            key_a: a.key.clone(),
            source_a: a.source.clone(),
            key_b: b.key.clone(),
            source_b: b.source.clone(),
            score: similarity.round().clamp(0.0, 100.0) as u8,
        })
    }
}

/// Number of unordered pairs among `n` records.
pub fn pair_count(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}
