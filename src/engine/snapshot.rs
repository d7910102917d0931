//! Secret snapshots: the in-memory copy of one vault as of its last load.
//!
//! A `Snapshot` is replaced wholesale whenever its vault is reloaded and is
//! otherwise only touched by a committed [`Transition`](super::Transition).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::store::VaultContents;

/// Which side of the comparison a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Source,
    Target,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Source => f.write_str("source"),
            Role::Target => f.write_str("target"),
        }
    }
}

/// Per-secret metadata reported by the store. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretMetadata {
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,

    #[serde(default)]
    pub modified: Option<DateTime<Utc>>,

    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl SecretMetadata {
    /// One-line summary, e.g. `Created: 2024-01-02 | Modified: N/A`.
    ///
    /// `Expires` is only shown when the secret actually has an expiry.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Created: {} | Modified: {}",
            display_date(self.created),
            display_date(self.modified)
        );
        if let Some(expires) = self.expires {
            out.push_str(&format!(" | Expires: {}", expires.format("%Y-%m-%d")));
        }
        out
    }

    pub fn version_label(&self) -> &str {
        self.version.as_deref().unwrap_or("Unknown")
    }

    pub fn enabled_label(&self) -> &str {
        match self.enabled {
            Some(true) => "yes",
            Some(false) => "no",
            None => "Unknown",
        }
    }
}

/// Render an optional timestamp as a date, or `N/A`.
pub fn display_date(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(|| "N/A".to_string(), |t| t.format("%Y-%m-%d").to_string())
}

/// A single secret: name, opaque value, metadata.
///
/// The value is wiped from memory when the record is dropped.
#[derive(Clone, PartialEq)]
pub struct SecretRecord {
    pub name: String,
    pub value: String,
    pub metadata: SecretMetadata,
}

impl SecretRecord {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            metadata: SecretMetadata::default(),
        }
    }
}

// Never print the value.
impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRecord")
            .field("name", &self.name)
            .field("value", &"***")
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl Drop for SecretRecord {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

/// One vault's secrets, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    vault: Option<String>,
    records: BTreeMap<String, SecretRecord>,
}

impl Snapshot {
    /// An empty snapshot: nothing loaded yet.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from what the store returned for `vault`.
    ///
    /// Secrets without a metadata entry get empty metadata; metadata entries
    /// without a secret are ignored.
    pub fn from_contents(vault: impl Into<String>, mut contents: VaultContents) -> Self {
        let secrets = std::mem::take(&mut contents.secrets);
        let records = secrets
            .into_iter()
            .map(|(name, value)| {
                let metadata = contents.metadata.remove(&name).unwrap_or_default();
                let record = SecretRecord {
                    name: name.clone(),
                    value,
                    metadata,
                };
                (name, record)
            })
            .collect();

        Self {
            vault: Some(vault.into()),
            records,
        }
    }

    /// Build a snapshot from plain name/value pairs (no metadata).
    pub fn from_pairs<I, K, V>(vault: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let records = pairs
            .into_iter()
            .map(|(k, v)| {
                let record = SecretRecord::new(k, v);
                (record.name.clone(), record)
            })
            .collect();
        Self {
            vault: Some(vault.into()),
            records,
        }
    }

    /// The vault this snapshot was loaded from, if any.
    pub fn vault(&self) -> Option<&str> {
        self.vault.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&SecretRecord> {
        self.records.get(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.records.get(name).map(|r| r.value.as_str())
    }

    /// All secret names, ascending.
    pub fn names(&self) -> BTreeSet<&str> {
        self.records.keys().map(String::as_str).collect()
    }

    pub fn records(&self) -> impl Iterator<Item = &SecretRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Set `name` to `value`, keeping existing metadata.
    ///
    /// Crate-private: the only writer is a committed transition.
    pub(crate) fn set_value(&mut self, name: &str, value: &str) {
        match self.records.get_mut(name) {
            Some(record) => {
                record.value.zeroize();
                record.value = value.to_string();
            }
            None => {
                self.records
                    .insert(name.to_string(), SecretRecord::new(name, value));
            }
        }
    }
}
