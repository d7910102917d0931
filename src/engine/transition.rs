//! Local transitions applied after a successful remote write.
//!
//! Every write follows the same two steps: call the store, then, only if the
//! store reported success, apply a `Transition` to the target snapshot. A
//! failed call applies nothing, so the snapshot is never half-updated.

use super::snapshot::Snapshot;

/// A deterministic change to a snapshot mirroring a remote write.
#[derive(Clone, PartialEq, Eq)]
pub enum Transition {
    /// `name` now holds `value` in the target vault.
    SetValue { name: String, value: String },
}

impl Transition {
    pub fn set_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Transition::SetValue {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Transition::SetValue { name, .. } => name,
        }
    }

    pub fn apply(&self, snapshot: &mut Snapshot) {
        match self {
            Transition::SetValue { name, value } => snapshot.set_value(name, value),
        }
    }
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::SetValue { name, .. } => f
                .debug_struct("SetValue")
                .field("name", name)
                .field("value", &"***")
                .finish(),
        }
    }
}

impl Drop for Transition {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        match self {
            Transition::SetValue { value, .. } => value.zeroize(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{classify, ComparisonState};

    #[test]
    fn apply_makes_target_match_source() {
        let source = Snapshot::from_pairs("s", [("a", "1")]);
        let mut target = Snapshot::from_pairs("t", [("a", "2")]);
        assert_eq!(
            classify(&source, &target).state("a"),
            Some(ComparisonState::Different)
        );

        Transition::set_value("a", "1").apply(&mut target);
        assert_eq!(classify(&source, &target).state("a"), Some(ComparisonState::Match));
    }

    #[test]
    fn apply_adds_missing_name() {
        let mut target = Snapshot::empty();
        Transition::set_value("new", "v").apply(&mut target);
        assert_eq!(target.value("new"), Some("v"));
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let mut target = Snapshot::from_pairs("t", [("a", "1")]);
        let t = Transition::set_value("a", "9");
        t.apply(&mut target);
        t.apply(&mut target);
        assert_eq!(target.value("a"), Some("9"));
        assert_eq!(target.len(), 1);
    }

    #[test]
    fn debug_hides_value() {
        let t = Transition::set_value("k", "topsecret");
        assert!(!format!("{t:?}").contains("topsecret"));
    }
}
