use crate::core::matcher::MatchPair;
use crate::error::{InputError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Keys to delete, per source name.
pub type RemovalSet = BTreeMap<String, BTreeSet<String>>;

/// Which record of a pair an intent refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    fn slot(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

/// A single side of a single pair, written `<index>a` or `<index>b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairSide {
    pub index: usize,
    pub side: Side,
}

impl FromStr for PairSide {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (digits, side) = match s.char_indices().last() {
            Some((at, 'a' | 'A')) => (&s[..at], Side::A),
            Some((at, 'b' | 'B')) => (&s[..at], Side::B),
            _ => return Err(format!("'{}' must end in 'a' or 'b', e.g. 3a", s)),
        };
        let index = digits
            .parse::<usize>()
            .map_err(|_| format!("'{}' must start with a pair number, e.g. 3a", s))?;
        Ok(PairSide { index, side })
    }
}

impl fmt::Display for PairSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            Side::A => 'a',
            Side::B => 'b',
        };
        write!(f, "{}{}", self.index, side)
    }
}

/// The pairs of one comparison run plus the operator's removal intent for
/// each side of each pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchSet {
    pairs: Vec<MatchPair>,
    intents: Vec<[bool; 2]>,
}

impl MatchSet {
    pub fn new(pairs: Vec<MatchPair>, default_remove_intent: bool) -> Self {
        let intents = vec![[default_remove_intent; 2]; pairs.len()];
        Self { pairs, intents }
    }

    pub fn all_pairs(&self) -> &[MatchPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn intent(&self, index: usize, side: Side) -> Result<bool> {
        self.check_index(index)?;
        Ok(self.intents[index][side.slot()])
    }

    pub fn set_intent(&mut self, index: usize, side: Side, value: bool) -> Result<()> {
        self.check_index(index)?;
        self.intents[index][side.slot()] = value;
        Ok(())
    }

    pub fn set_all(&mut self, value: bool) {
        for intent in &mut self.intents {
            *intent = [value; 2];
        }
    }

    /// Number of sides currently marked for removal.
    pub fn marked_count(&self) -> usize {
        self.intents.iter().flatten().filter(|&&v| v).count()
    }

    /// Union of every marked `(source, key)`; a key marked on any pair is
    /// removed even if another pair leaves the same key unmarked.
    pub fn removal_set(&self) -> RemovalSet {
        let mut removal = RemovalSet::new();
        for (pair, [remove_a, remove_b]) in self.pairs.iter().zip(&self.intents) {
            if *remove_a {
                removal
                    .entry(pair.source_a.clone())
                    .or_default()
                    .insert(pair.key_a.clone());
            }
            if *remove_b {
                removal
                    .entry(pair.source_b.clone())
                    .or_default()
                    .insert(pair.key_b.clone());
            }
        }
        removal
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.pairs.len() {
            return Err(InputError::PairOutOfRange {
                index,
                len: self.pairs.len(),
            }
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DupsyError;

    fn pair(a: &str, fa: &str, b: &str, fb: &str) -> MatchPair {
        MatchPair {
            key_a: a.to_string(),
            source_a: fa.to_string(),
            key_b: b.to_string(),
            source_b: fb.to_string(),
            score: 90,
        }
    }

    #[test]
    fn test_default_intent_applies_to_both_sides() {
        let set = MatchSet::new(vec![pair("a", "F1", "b", "F2")], true);
        assert!(set.intent(0, Side::A).unwrap());
        assert!(set.intent(0, Side::B).unwrap());

        let set = MatchSet::new(vec![pair("a", "F1", "b", "F2")], false);
        assert!(set.removal_set().is_empty());
    }

    #[test]
    fn test_removal_set_groups_by_source() {
        let mut set = MatchSet::new(
            vec![pair("acme", "F1", "acme co", "F2"), pair("x", "F1", "y", "F1")],
            true,
        );
        set.set_intent(1, Side::B, false).unwrap();

        let removal = set.removal_set();
        assert_eq!(
            removal["F1"],
            BTreeSet::from(["acme".to_string(), "x".to_string()])
        );
        assert_eq!(removal["F2"], BTreeSet::from(["acme co".to_string()]));
    }

    #[test]
    fn test_true_intent_wins_across_pairs() {
        let mut set = MatchSet::new(
            vec![pair("acme", "F1", "acme co", "F1"), pair("acme", "F1", "acme inc", "F1")],
            false,
        );
        set.set_intent(1, Side::A, true).unwrap();
        assert_eq!(set.removal_set()["F1"], BTreeSet::from(["acme".to_string()]));
        assert_eq!(set.marked_count(), 1);
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut set = MatchSet::new(vec![pair("a", "F1", "b", "F1")], true);
        assert!(matches!(
            set.set_intent(1, Side::A, false),
            Err(DupsyError::Input(InputError::PairOutOfRange { index: 1, len: 1 }))
        ));
    }

    #[test]
    fn test_pair_side_parsing() {
        assert_eq!(
            "12b".parse::<PairSide>().unwrap(),
            PairSide { index: 12, side: Side::B }
        );
        assert_eq!("0A".parse::<PairSide>().unwrap().to_string(), "0a");
        assert!("a".parse::<PairSide>().is_err());
        assert!("3c".parse::<PairSide>().is_err());
    }
}
