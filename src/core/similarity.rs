use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};

/// String similarity used to score a pair of keys, on a 0-100 scale.
///
/// Every metric is symmetric and scores identical strings (including two
/// empty strings) at 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Metric {
    /// Indel ratio: 2 * LCS / (len(a) + len(b))
    #[default]
    Ratio,
    /// 1 - levenshtein / max(len(a), len(b))
    Levenshtein,
    JaroWinkler,
}

impl Metric {
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        // Greedy Jaro matching depends on argument order
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        match self {
            Metric::Ratio => indel_ratio(a, b),
            Metric::Levenshtein => normalized_levenshtein(a, b) * 100.0,
            Metric::JaroWinkler => jaro_winkler(a, b) * 100.0,
        }
    }
}

/// Indel similarity in percent, counted over Unicode scalar values.
pub fn indel_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * longest_common_subsequence(&a, &b) as f64 / total as f64
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; short.len() + 1];
    let mut curr = vec![0usize; short.len() + 1];
    for &x in long {
        for (j, &y) in short.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[short.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const METRICS: [Metric; 3] = [Metric::Ratio, Metric::Levenshtein, Metric::JaroWinkler];

    #[test]
    fn test_identical_strings_score_100() {
        for metric in METRICS {
            assert_eq!(metric.similarity("abc", "abc"), 100.0);
            assert_eq!(metric.similarity("", ""), 100.0);
        }
    }

    #[test]
    fn test_indel_ratio_values() {
        // lcs("acme inc", "acme incorporated") = 8, lengths 8 + 17
        assert_eq!(indel_ratio("acme inc", "acme incorporated"), 64.0);
        assert_eq!(indel_ratio("abc", ""), 0.0);
        assert_eq!(indel_ratio("abcd", "abce"), 75.0);
    }

    #[test]
    fn test_indel_ratio_counts_characters_not_bytes() {
        assert_eq!(indel_ratio("café", "cafe"), 75.0);
    }

    #[test]
    fn test_jaro_winkler_rewards_shared_prefix() {
        let score = Metric::JaroWinkler.similarity("acme inc", "acme incorporated");
        assert!((89.0..90.0).contains(&score), "score was {}", score);
    }

    proptest! {
        #[test]
        fn prop_metrics_are_symmetric(a in "[a-e ]{0,12}", b in "[a-e ]{0,12}") {
            for metric in METRICS {
                prop_assert_eq!(metric.similarity(&a, &b), metric.similarity(&b, &a));
            }
        }

        #[test]
        fn prop_metrics_are_reflexive(a in "\\PC{0,16}") {
            for metric in METRICS {
                prop_assert_eq!(metric.similarity(&a, &a), 100.0);
            }
        }

        #[test]
        fn prop_scores_stay_in_range(a in "\\PC{0,12}", b in "\\PC{0,12}") {
            for metric in METRICS {
                let score = metric.similarity(&a, &b);
                prop_assert!((0.0..=100.0).contains(&score));
            }
        }
    }
}
