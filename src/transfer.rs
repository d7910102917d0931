//! Export and import documents.
//!
//! Export format (pretty JSON):
//! `{ vault_name, secrets, metadata, export_date, exported_by }`
//!
//! Import reads the same shape. Only the shape is validated; writing an
//! import into a vault is not implemented and always reports so.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::{Role, SecretMetadata, Snapshot};
use crate::errors::{Result, VaultSyncError};
use crate::store::strip_subscription_prefix;

/// Value of `exported_by` in every export.
pub const EXPORTED_BY: &str = "vaultsync";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub vault_name: String,
    pub secrets: BTreeMap<String, String>,
    pub metadata: BTreeMap<String, SecretMetadata>,
    /// RFC 3339 timestamp.
    pub export_date: String,
    pub exported_by: String,
}

/// Build an export of `snapshot` stamped with `now`.
///
/// Fails with `MissingSelection` if nothing has been loaded.
pub fn export_snapshot(snapshot: &Snapshot, now: DateTime<Utc>) -> Result<ExportDocument> {
    let vault_name = snapshot
        .vault()
        .ok_or(VaultSyncError::MissingSelection(Role::Target))?
        .to_string();

    let mut secrets = BTreeMap::new();
    let mut metadata = BTreeMap::new();
    for record in snapshot.records() {
        secrets.insert(record.name.clone(), record.value.clone());
        metadata.insert(record.name.clone(), record.metadata.clone());
    }

    Ok(ExportDocument {
        vault_name,
        secrets,
        metadata,
        export_date: now.to_rfc3339(),
        exported_by: EXPORTED_BY.to_string(),
    })
}

/// `<vault>_export_<YYYY-MM-DD>.json`
pub fn default_export_file_name(vault: &str, now: DateTime<Utc>) -> String {
    let vault: String = strip_subscription_prefix(vault)
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{vault}_export_{}.json", now.format("%Y-%m-%d"))
}

/// Write `doc` as pretty JSON, readable by the owner only.
pub fn write_export(doc: &ExportDocument, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(doc)
        .map_err(|e| VaultSyncError::SerializationError(format!("JSON export: {e}")))?;

    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(json.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        fs::write(path, json)?;
    }

    Ok(())
}

/// A validated import file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDocument {
    pub vault_name: Option<String>,
    pub secrets: BTreeMap<String, String>,
}

/// Parse and validate an import document.
///
/// Requires a JSON object with a `secrets` object whose values are all strings.
pub fn parse_import(text: &str) -> Result<ImportDocument> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| VaultSyncError::InvalidImport(format!("not valid JSON: {e}")))?;

    let object = value
        .as_object()
        .ok_or_else(|| VaultSyncError::InvalidImport("top level must be an object".into()))?;

    let secrets = object
        .get("secrets")
        .ok_or_else(|| VaultSyncError::InvalidImport("missing 'secrets'".into()))?
        .as_object()
        .ok_or_else(|| {
            VaultSyncError::InvalidImport("'secrets' must map names to values".into())
        })?;

    let mut parsed = BTreeMap::new();
    for (name, value) in secrets {
        let value = value.as_str().ok_or_else(|| {
            VaultSyncError::InvalidImport(format!("value of '{name}' is not a string"))
        })?;
        parsed.insert(name.clone(), value.to_string());
    }

    let vault_name = object
        .get("vault_name")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Ok(ImportDocument {
        vault_name,
        secrets: parsed,
    })
}

/// Read and validate an import file from disk.
pub fn read_import(path: &Path) -> Result<ImportDocument> {
    let text = fs::read_to_string(path).map_err(|e| {
        VaultSyncError::InvalidImport(format!("failed to read {}: {e}", path.display()))
    })?;
    parse_import(&text)
}

/// Apply `doc` to `target_vault`. Not implemented: always fails, never writes.
pub fn apply_import(doc: &ImportDocument, target_vault: &str) -> Result<()> {
    if target_vault.trim().is_empty() {
        return Err(VaultSyncError::MissingSelection(Role::Target));
    }
    Err(VaultSyncError::ImportNotImplemented {
        count: doc.secrets.len(),
        vault: target_vault.to_string(),
    })
}
