//! Secret store backends.
//!
//! The engine only talks to a store through the [`SecretStore`] trait:
//! discover subscriptions and vaults, load one vault, and the three write
//! calls (single sync, direct update, bulk sync). Implementations:
//! - [`FileStore`]: vaults as JSON documents under a directory tree (`file`)
//! - [`MemoryStore`]: in-process vaults with failure injection (`memory`)

pub mod file;
pub mod memory;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::classify::state_of;
use crate::engine::SecretMetadata;
use crate::errors::Result;

pub use file::FileStore;
pub use memory::MemoryStore;

/// A grouping of vaults (an account, project or environment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub name: String,
}

/// Everything a store returns for one vault.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultContents {
    pub secrets: BTreeMap<String, String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, SecretMetadata>,
}

/// Copy `name` from `source_vault` into `target_vault`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub target_vault: String,
    pub name: String,
    pub source_vault: String,
    pub dry_run: bool,
}

/// Write `value` into `target_vault` under `name`.
#[derive(Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub target_vault: String,
    pub name: String,
    pub value: String,
}

impl std::fmt::Debug for UpdateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateRequest")
            .field("target_vault", &self.target_vault)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Sync every eligible name from `source_vault` into `target_vault`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkSyncRequest {
    pub target_vault: String,
    pub source_vault: String,
    pub dry_run: bool,
}

/// Outcome of a single-name write as reported by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WriteResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Per-name outcome of a bulk sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSyncResponse {
    pub results: BTreeMap<String, bool>,
}

/// A remote secret store, already authorized.
///
/// `Err` means the call itself failed (I/O, network, parse). A call that
/// reached the store but was refused comes back as `Ok` with
/// `success: false`.
///
/// Implementations must never log secret values, and must not mutate
/// anything when a request has `dry_run` set.
pub trait SecretStore: Send + Sync {
    fn list_subscriptions(&self) -> Result<Vec<Subscription>>;

    /// Vault names in `subscription`, sorted. With `None`, every vault in
    /// every subscription, each prefixed `"<subscription>: "`.
    fn list_vaults(&self, subscription: Option<&str>) -> Result<Vec<String>>;

    /// Load secrets and metadata. Accepts a `"<subscription>: "` prefix.
    fn load_secrets(&self, vault: &str) -> Result<VaultContents>;

    /// Resolve a vault reference, prefixed or not, to the store's single
    /// spelling for it: `"<subscription>: <vault>"`. Two references name the
    /// same vault exactly when their canonical ids are equal.
    fn canonical_vault(&self, vault: &str) -> Result<String>;

    fn sync_secret(&self, request: &SyncRequest) -> Result<WriteResponse>;

    fn update_secret(&self, request: &UpdateRequest) -> Result<WriteResponse>;

    fn bulk_sync(&self, request: &BulkSyncRequest) -> Result<BulkSyncResponse>;
}

/// Strip a `"<subscription>: "` display prefix from a vault name.
pub fn strip_subscription_prefix(vault: &str) -> &str {
    vault.split_once(": ").map_or(vault, |(_, name)| name)
}

/// Split `"<subscription>: <vault>"` into its parts.
pub fn split_vault_ref(vault: &str) -> (Option<&str>, &str) {
    match vault.split_once(": ") {
        Some((sub, name)) => (Some(sub), name),
        None => (None, vault),
    }
}

/// Names a bulk sync would write: present in source and missing or
/// different in target. Ascending.
pub fn bulk_eligible<'a>(
    source: &'a BTreeMap<String, String>,
    target: &BTreeMap<String, String>,
) -> Vec<&'a str> {
    source
        .iter()
        .filter(|(name, value)| {
            state_of(Some(value.as_str()), target.get(*name).map(String::as_str))
                .is_some_and(|s| s.needs_sync())
        })
        .map(|(name, _)| name.as_str())
        .collect()
}
