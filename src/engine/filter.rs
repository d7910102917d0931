//! View filter: narrow a classification to the names worth showing.

use std::fmt;
use std::str::FromStr;

use super::classify::{Classification, ComparisonState};
use crate::errors::VaultSyncError;

/// Display predicate over comparison states.
///
/// There is no target-only filter: target-only names show up under `All` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewFilter {
    #[default]
    All,
    /// Source-only names.
    Missing,
    Different,
    Identical,
}

impl ViewFilter {
    pub fn matches(self, state: ComparisonState) -> bool {
        match self {
            ViewFilter::All => true,
            ViewFilter::Missing => state == ComparisonState::SourceOnly,
            ViewFilter::Different => state == ComparisonState::Different,
            ViewFilter::Identical => state == ComparisonState::Match,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewFilter::All => "all",
            ViewFilter::Missing => "missing",
            ViewFilter::Different => "different",
            ViewFilter::Identical => "identical",
        }
    }
}

impl fmt::Display for ViewFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewFilter {
    type Err = VaultSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(ViewFilter::All),
            "missing" => Ok(ViewFilter::Missing),
            "different" => Ok(ViewFilter::Different),
            "identical" => Ok(ViewFilter::Identical),
            other => Err(VaultSyncError::CommandFailed(format!(
                "unknown filter '{other}' — use all, missing, different or identical"
            ))),
        }
    }
}

/// Names whose state passes `predicate`, in classification (ascending) order.
pub fn filter(classified: &Classification, predicate: ViewFilter) -> Vec<&str> {
    classified
        .iter()
        .filter(|(_, state)| predicate.matches(*state))
        .map(|(name, _)| name)
        .collect()
}
