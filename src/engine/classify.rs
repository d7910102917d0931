//! Reconciliation classifier.
//!
//! Compares a source and a target snapshot name by name. The result is
//! always recomputed from the current snapshots and never cached.

use std::collections::BTreeMap;
use std::fmt;

use subtle::ConstantTimeEq;

use super::snapshot::Snapshot;

/// How one secret name compares across the two vaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonState {
    /// Present in both, values equal.
    Match,
    /// Present in both, values differ.
    Different,
    /// Present in source only.
    SourceOnly,
    /// Present in target only.
    TargetOnly,
}

impl ComparisonState {
    /// `true` for states a sync from source would change.
    pub fn needs_sync(self) -> bool {
        matches!(self, ComparisonState::SourceOnly | ComparisonState::Different)
    }

    pub fn label(self) -> &'static str {
        match self {
            ComparisonState::Match => "match",
            ComparisonState::Different => "different",
            ComparisonState::SourceOnly => "source-only",
            ComparisonState::TargetOnly => "target-only",
        }
    }
}

impl fmt::Display for ComparisonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compare two secret values without leaking timing on the contents.
pub fn values_equal(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// The four-way rule for a single name. `None` when the name is in neither side.
pub fn state_of(source: Option<&str>, target: Option<&str>) -> Option<ComparisonState> {
    match (source, target) {
        (Some(s), Some(t)) if values_equal(s, t) => Some(ComparisonState::Match),
        (Some(_), Some(_)) => Some(ComparisonState::Different),
        (Some(_), None) => Some(ComparisonState::SourceOnly),
        (None, Some(_)) => Some(ComparisonState::TargetOnly),
        (None, None) => None,
    }
}

/// Per-name comparison states in ascending name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    states: BTreeMap<String, ComparisonState>,
}

impl Classification {
    pub fn state(&self, name: &str) -> Option<ComparisonState> {
        self.states.get(name).copied()
    }

    /// `(name, state)` pairs in ascending name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ComparisonState)> {
        self.states.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Number of names in `state`.
    pub fn count(&self, state: ComparisonState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }

    /// Names a sync from source would change, ascending.
    pub fn eligible_for_sync(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, s)| s.needs_sync())
            .map(|(n, _)| n)
            .collect()
    }
}

/// Classify every name in the union of both snapshots.
///
/// Total and deterministic: either snapshot may be empty.
pub fn classify(source: &Snapshot, target: &Snapshot) -> Classification {
    let mut names = source.names();
    names.extend(target.names());

    let states = names
        .into_iter()
        .filter_map(|name| {
            state_of(source.value(name), target.value(name)).map(|s| (name.to_string(), s))
        })
        .collect();

    Classification { states }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(pairs: &[(&str, &str)]) -> Snapshot {
        Snapshot::from_pairs("v", pairs.iter().copied())
    }

    #[test]
    fn both_empty_is_empty() {
        let c = classify(&Snapshot::empty(), &Snapshot::empty());
        assert!(c.is_empty());
    }

    #[test]
    fn four_way_rule() {
        let source = snap(&[("same", "1"), ("changed", "a"), ("new", "x")]);
        let target = snap(&[("same", "1"), ("changed", "b"), ("extra", "y")]);

        let c = classify(&source, &target);
        assert_eq!(c.state("same"), Some(ComparisonState::Match));
        assert_eq!(c.state("changed"), Some(ComparisonState::Different));
        assert_eq!(c.state("new"), Some(ComparisonState::SourceOnly));
        assert_eq!(c.state("extra"), Some(ComparisonState::TargetOnly));
        assert_eq!(c.state("absent"), None);
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn names_are_in_byte_order() {
        let source = snap(&[("b", "1"), ("B", "1")]);
        let target = snap(&[("a", "1"), ("_x", "1")]);

        let c = classify(&source, &target);
        let names: Vec<&str> = c.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["B", "_x", "a", "b"]);
    }

    #[test]
    fn classification_is_deterministic() {
        let source = snap(&[("k1", "v"), ("k2", "w")]);
        let target = snap(&[("k2", "x"), ("k3", "y")]);
        assert_eq!(classify(&source, &target), classify(&source, &target));
    }

    #[test]
    fn empty_string_values_still_count_as_present() {
        let source = snap(&[("blank", "")]);
        let target = snap(&[("blank", "")]);
        let c = classify(&source, &target);
        assert_eq!(c.state("blank"), Some(ComparisonState::Match));
    }

    #[test]
    fn values_of_different_length_are_unequal() {
        assert!(!values_equal("abc", "abcd"));
        assert!(values_equal("abc", "abc"));
        assert!(values_equal("", ""));
    }

    #[test]
    fn eligible_for_sync_covers_source_only_and_different() {
        let source = snap(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let target = snap(&[("b", "2"), ("c", "9"), ("d", "4")]);
        let c = classify(&source, &target);
        assert_eq!(c.eligible_for_sync(), vec!["a", "c"]);
        assert_eq!(c.count(ComparisonState::Match), 1);
        assert_eq!(c.count(ComparisonState::TargetOnly), 1);
    }
}
