//! Directory-backed secret store.
//!
//! Layout: `<root>/<subscription>/<vault>.json`. Each vault file has the same
//! shape as an export document (`vault_name`, `secrets`, `metadata`), so an
//! export can be dropped into the tree and loaded as a vault. Unknown fields
//! such as `export_date` are ignored.
//!
//! Writes are atomic (temp file + rename) and serialized within the process.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{
    bulk_eligible, split_vault_ref, BulkSyncRequest, BulkSyncResponse, SecretStore, Subscription,
    SyncRequest, UpdateRequest, VaultContents, WriteResponse,
};
use crate::engine::SecretMetadata;
use crate::errors::{Result, VaultSyncError};

/// On-disk representation of one vault.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultFile {
    #[serde(default)]
    pub vault_name: String,
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, SecretMetadata>,
}

/// A store rooted at a directory of subscription folders.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Resolve a (possibly subscription-prefixed) vault name to its file.
    fn resolve(&self, vault: &str) -> Result<PathBuf> {
        let (subscription, name) = split_vault_ref(vault);
        if check_component(name).is_err() {
            return Err(VaultSyncError::VaultNotFound(vault.to_string()));
        }

        if let Some(sub) = subscription {
            if check_component(sub).is_err() {
                return Err(VaultSyncError::VaultNotFound(vault.to_string()));
            }
            let path = self.root.join(sub).join(format!("{name}.json"));
            if !path.is_file() {
                return Err(VaultSyncError::VaultNotFound(vault.to_string()));
            }
            return Ok(path);
        }

        let mut found: Vec<PathBuf> = self
            .subscription_dirs()?
            .into_iter()
            .map(|dir| dir.join(format!("{name}.json")))
            .filter(|p| p.is_file())
            .collect();

        match found.len() {
            0 => Err(VaultSyncError::VaultNotFound(vault.to_string())),
            1 => Ok(found.remove(0)),
            _ => Err(VaultSyncError::AmbiguousVault(vault.to_string())),
        }
    }

    fn subscription_dirs(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            VaultSyncError::transport(format!("reading store {}", self.root.display()), e)
        })?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry?;
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !hidden && entry.file_type()?.is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    fn vaults_in(&self, dir: &Path) -> Result<Vec<String>> {
        let entries = fs::read_dir(dir)
            .map_err(|e| VaultSyncError::transport(format!("reading {}", dir.display()), e))?;

        let mut vaults = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    vaults.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        vaults.sort();
        Ok(vaults)
    }

    fn lock_writes(&self) -> std::sync::MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl SecretStore for FileStore {
    fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        Ok(self
            .subscription_dirs()?
            .into_iter()
            .filter_map(|dir| {
                dir.file_name().map(|n| {
                    let name = n.to_string_lossy().into_owned();
                    Subscription {
                        id: name.clone(),
                        name,
                    }
                })
            })
            .collect())
    }

    fn list_vaults(&self, subscription: Option<&str>) -> Result<Vec<String>> {
        match subscription {
            Some(sub) => {
                check_component(sub)?;
                self.vaults_in(&self.root.join(sub))
            }
            None => {
                let mut all = Vec::new();
                for sub in self.list_subscriptions()? {
                    for vault in self.vaults_in(&self.root.join(&sub.id))? {
                        all.push(format!("{}: {vault}", sub.name));
                    }
                }
                Ok(all)
            }
        }
    }

    fn load_secrets(&self, vault: &str) -> Result<VaultContents> {
        let path = self.resolve(vault)?;
        let file = read_vault_file(&path)?;
        debug!(vault, secrets = file.secrets.len(), "loaded vault file");
        Ok(VaultContents {
            secrets: file.secrets,
            metadata: file.metadata,
        })
    }

    fn canonical_vault(&self, vault: &str) -> Result<String> {
        let path = self.resolve(vault)?;
        let subscription = path.parent().and_then(Path::file_name);
        match (subscription, path.file_stem()) {
            (Some(sub), Some(name)) => Ok(format!(
                "{}: {}",
                sub.to_string_lossy(),
                name.to_string_lossy()
            )),
            _ => Err(VaultSyncError::VaultNotFound(vault.to_string())),
        }
    }

    fn sync_secret(&self, request: &SyncRequest) -> Result<WriteResponse> {
        let source = read_vault_file(&self.resolve(&request.source_vault)?)?;
        let Some(value) = source.secrets.get(&request.name) else {
            return Ok(WriteResponse::failed(format!(
                "Secret {} not found in source vault",
                request.name
            )));
        };

        let _writes = self.lock_writes();
        let target_path = self.resolve(&request.target_vault)?;
        if request.dry_run {
            debug!(name = %request.name, target = %request.target_vault, "dry run: sync skipped");
            return Ok(WriteResponse::ok());
        }

        let mut target = read_vault_file(&target_path)?;
        put_secret(&mut target, &request.name, value);
        write_vault_file(&target_path, &target)?;
        info!(name = %request.name, target = %request.target_vault, "secret synced");
        Ok(WriteResponse::ok())
    }

    fn update_secret(&self, request: &UpdateRequest) -> Result<WriteResponse> {
        if request.value.is_empty() {
            return Ok(WriteResponse::failed("No value provided"));
        }

        let _writes = self.lock_writes();
        let path = self.resolve(&request.target_vault)?;
        let mut target = read_vault_file(&path)?;
        put_secret(&mut target, &request.name, &request.value);
        write_vault_file(&path, &target)?;
        info!(name = %request.name, target = %request.target_vault, "secret updated");
        Ok(WriteResponse::ok())
    }

    fn bulk_sync(&self, request: &BulkSyncRequest) -> Result<BulkSyncResponse> {
        let source = read_vault_file(&self.resolve(&request.source_vault)?)?;

        let _writes = self.lock_writes();
        let target_path = self.resolve(&request.target_vault)?;
        let mut target = read_vault_file(&target_path)?;

        let eligible: Vec<String> = bulk_eligible(&source.secrets, &target.secrets)
            .into_iter()
            .map(str::to_string)
            .collect();

        if !request.dry_run && !eligible.is_empty() {
            for name in &eligible {
                if let Some(value) = source.secrets.get(name) {
                    put_secret(&mut target, name, value);
                }
            }
            write_vault_file(&target_path, &target)?;
            info!(
                count = eligible.len(),
                target = %request.target_vault,
                "bulk sync written"
            );
        }

        Ok(BulkSyncResponse {
            results: eligible.into_iter().map(|n| (n, true)).collect(),
        })
    }
}

/// Set `name` in `file`, stamping its metadata like a new secret version.
fn put_secret(file: &mut VaultFile, name: &str, value: &str) {
    let now = Utc::now();
    let previous = file.metadata.remove(name).unwrap_or_default();
    let version = previous
        .version
        .as_deref()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(1, |v| v + 1);

    file.secrets.insert(name.to_string(), value.to_string());
    file.metadata.insert(
        name.to_string(),
        SecretMetadata {
            created: previous.created.or(Some(now)),
            modified: Some(now),
            version: Some(version.to_string()),
            enabled: previous.enabled.or(Some(true)),
            ..previous
        },
    );
}

/// Reject names that would escape the store directory.
fn check_component(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.starts_with('.')
    {
        return Err(VaultSyncError::CommandFailed(format!(
            "'{name}' is not a valid vault or subscription name"
        )));
    }
    Ok(())
}

fn read_vault_file(path: &Path) -> Result<VaultFile> {
    let data = fs::read_to_string(path)
        .map_err(|e| VaultSyncError::transport(format!("reading {}", path.display()), e))?;
    serde_json::from_str(&data)
        .map_err(|e| VaultSyncError::transport(format!("parsing {}", path.display()), e))
}

fn write_vault_file(path: &Path, file: &VaultFile) -> Result<()> {
    let json = serde_json::to_string_pretty(file)
        .map_err(|e| VaultSyncError::SerializationError(format!("vault file: {e}")))?;

    // Atomic write: temp file in the same directory, then rename.
    let parent = path.parent().unwrap_or(Path::new("."));
    let tmp_path = parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    fs::write(&tmp_path, json)
        .map_err(|e| VaultSyncError::transport(format!("writing {}", tmp_path.display()), e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600));
    }

    fs::rename(&tmp_path, path)
        .map_err(|e| VaultSyncError::transport(format!("replacing {}", path.display()), e))?;
    Ok(())
}
