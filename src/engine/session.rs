//! A comparison session: one store, a source and a target snapshot, and the
//! operations that read and converge them.
//!
//! All operations take `&self`; a session can be shared across threads. Every
//! write goes through the same two steps: claim `(vault, name)` with the
//! coordinator, call the store, and only on reported success commit a
//! [`Transition`] to the target snapshot.
//!
//! Vaults are identified by the store's canonical id (see
//! [`SecretStore::canonical_vault`]) so that `"kv"` and `"ops: kv"` share one
//! claim and one snapshot, while `"a: kv"` and `"b: kv"` never do.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use super::classify::{classify, Classification, ComparisonState};
use super::coordinator::Coordinator;
use super::filter::{filter, ViewFilter};
use super::snapshot::{Role, Snapshot};
use super::transition::Transition;
use crate::errors::{Operation, Result, VaultSyncError};
use crate::store::{BulkSyncRequest, SecretStore, SyncRequest, UpdateRequest, WriteResponse};

/// What a single-name sync or edit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub name: String,
    pub dry_run: bool,
    /// `true` if the local target snapshot was updated.
    pub applied: bool,
    pub before: Option<ComparisonState>,
    pub after: Option<ComparisonState>,
}

/// Per-name results of a bulk sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSyncReport {
    pub dry_run: bool,
    pub results: BTreeMap<String, bool>,
    /// Names the store reported as synced that could not be mirrored locally
    /// (not in the loaded source snapshot). Reload the target to see them.
    pub unapplied: Vec<String>,
}

impl BulkSyncReport {
    pub fn succeeded(&self) -> usize {
        self.results.values().filter(|ok| **ok).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(n, _)| n.as_str())
            .collect()
    }

    /// `"<succeeded>/<total>"`.
    pub fn summary(&self) -> String {
        format!("{}/{}", self.succeeded(), self.total())
    }
}

#[derive(Debug, Default)]
struct Snapshots {
    source: Snapshot,
    target: Snapshot,
    // Canonical ids of the vaults the snapshots were loaded from.
    source_id: Option<String>,
    target_id: Option<String>,
}

impl Snapshots {
    fn set(&mut self, role: Role, snapshot: Snapshot, id: Option<String>) {
        match role {
            Role::Source => {
                self.source = snapshot;
                self.source_id = id;
            }
            Role::Target => {
                self.target = snapshot;
                self.target_id = id;
            }
        }
    }

    fn id(&self, role: Role) -> Option<&str> {
        match role {
            Role::Source => self.source_id.as_deref(),
            Role::Target => self.target_id.as_deref(),
        }
    }

    fn get(&self, role: Role) -> &Snapshot {
        match role {
            Role::Source => &self.source,
            Role::Target => &self.target,
        }
    }

    fn state(&self, name: &str) -> Option<ComparisonState> {
        classify(&self.source, &self.target).state(name)
    }
}

pub struct Session<S: SecretStore> {
    store: S,
    snapshots: RwLock<Snapshots>,
    coordinator: Coordinator,
}

impl<S: SecretStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            snapshots: RwLock::new(Snapshots::default()),
            coordinator: Coordinator::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshots> {
        self.snapshots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshots> {
        self.snapshots.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Load `vault` from the store and make it the `role` snapshot.
    ///
    /// The previous snapshot is replaced entirely on success and kept on
    /// failure. Returns the number of secrets loaded.
    pub fn load(&self, role: Role, vault: &str) -> Result<usize> {
        if vault.trim().is_empty() {
            return Err(VaultSyncError::MissingSelection(role));
        }
        let _loading = self.coordinator.begin_load(role)?;

        let contents = self.store.load_secrets(vault).map_err(|e| match e {
            VaultSyncError::TransportFailure { .. } | VaultSyncError::VaultNotFound(_) => e,
            other => VaultSyncError::remote(Operation::Load, vault, Some(other.to_string())),
        })?;

        let snapshot = Snapshot::from_contents(vault, contents);
        let count = snapshot.len();
        let id = self.vault_id(vault);
        self.write().set(role, snapshot, Some(id));

        info!(%role, vault, secrets = count, "snapshot loaded");
        Ok(count)
    }

    /// Replace the `role` snapshot without going through the store.
    pub fn replace_snapshot(&self, role: Role, snapshot: Snapshot) -> Result<()> {
        let _loading = self.coordinator.begin_load(role)?;
        let id = snapshot.vault().map(|v| self.vault_id(v));
        self.write().set(role, snapshot, id);
        Ok(())
    }

    /// The canonical id of `vault`, or `vault` itself if the store cannot
    /// resolve it. An unresolvable vault then fails at the store call.
    fn vault_id(&self, vault: &str) -> String {
        self.store.canonical_vault(vault).unwrap_or_else(|e| {
            debug!(vault, error = %e, "vault not resolved; using name as given");
            vault.to_string()
        })
    }

    /// A copy of the current `role` snapshot.
    pub fn snapshot(&self, role: Role) -> Snapshot {
        self.read().get(role).clone()
    }

    /// The vault the `role` snapshot was loaded from.
    pub fn vault(&self, role: Role) -> Option<String> {
        self.read().get(role).vault().map(str::to_string)
    }

    // ------------------------------------------------------------------
    // Reading
    // ------------------------------------------------------------------

    /// Classify every known name against the current snapshots.
    pub fn classify(&self) -> Classification {
        let snaps = self.read();
        classify(&snaps.source, &snaps.target)
    }

    /// Names passing `predicate`, ascending.
    pub fn view(&self, predicate: ViewFilter) -> Vec<String> {
        let classified = self.classify();
        filter(&classified, predicate)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn state(&self, name: &str) -> Option<ComparisonState> {
        self.read().state(name)
    }

    // ------------------------------------------------------------------
    // Writing
    // ------------------------------------------------------------------

    /// Copy the source value of `name` into the target vault.
    ///
    /// With `dry_run` the store is asked to validate only and the local
    /// target snapshot is left alone.
    pub fn sync_from_source(
        &self,
        name: &str,
        target_vault: &str,
        source_vault: &str,
        dry_run: bool,
    ) -> Result<SyncOutcome> {
        require_selection(Role::Target, target_vault)?;
        require_selection(Role::Source, source_vault)?;
        check_name(name)?;

        let target_id = self.vault_id(target_vault);
        let source_id = self.vault_id(source_vault);
        let _claim = self.coordinator.begin_write(&target_id, name)?;

        // Capture the source value now: a source reload during the call must
        // not change what gets mirrored locally.
        let (before, pending) = {
            let snaps = self.read();
            let pending = if snaps.id(Role::Source) == Some(source_id.as_str()) {
                snaps
                    .source
                    .value(name)
                    .map(|v| Transition::set_value(name, v))
            } else {
                None
            };
            (snaps.state(name), pending)
        };

        let request = SyncRequest {
            target_vault: target_vault.to_string(),
            name: name.to_string(),
            source_vault: source_vault.to_string(),
            dry_run,
        };
        debug!(name, target = target_vault, source = source_vault, dry_run, "sync requested");
        let response = self.store.sync_secret(&request);
        check_response(Operation::Sync, name, response)?;

        if dry_run {
            info!(name, target = target_vault, "dry run sync ok");
            return Ok(SyncOutcome {
                name: name.to_string(),
                dry_run,
                applied: false,
                before,
                after: before,
            });
        }

        let applied = match pending {
            Some(transition) => self.commit(&transition, &target_id),
            None => {
                warn!(
                    name,
                    source = source_vault,
                    "synced remotely but not in the loaded source snapshot; reload to refresh"
                );
                false
            }
        };
        let after = self.state(name);
        info!(name, target = target_vault, applied, "secret synced");

        Ok(SyncOutcome {
            name: name.to_string(),
            dry_run,
            applied,
            before,
            after,
        })
    }

    /// Write `new_value` into the target vault under `name`.
    ///
    /// Blank values are rejected before the store is contacted.
    pub fn update_direct(
        &self,
        name: &str,
        target_vault: &str,
        new_value: &str,
    ) -> Result<SyncOutcome> {
        require_selection(Role::Target, target_vault)?;
        check_name(name)?;
        require_value(name, new_value)?;

        let target_id = self.vault_id(target_vault);
        let _claim = self.coordinator.begin_write(&target_id, name)?;
        let before = self.state(name);

        let request = UpdateRequest {
            target_vault: target_vault.to_string(),
            name: name.to_string(),
            value: new_value.to_string(),
        };
        let response = self.store.update_secret(&request);
        check_response(Operation::Update, name, response)?;

        let applied = self.commit(&Transition::set_value(name, new_value), &target_id);
        let after = self.state(name);
        info!(name, target = target_vault, applied, "secret updated");

        Ok(SyncOutcome {
            name: name.to_string(),
            dry_run: false,
            applied,
            before,
            after,
        })
    }

    /// Validate an edit and predict its effect without contacting the store.
    pub fn preview_update(
        &self,
        name: &str,
        target_vault: &str,
        new_value: &str,
    ) -> Result<SyncOutcome> {
        require_selection(Role::Target, target_vault)?;
        check_name(name)?;
        require_value(name, new_value)?;

        let snaps = self.read();
        let before = snaps.state(name);
        let mut target = snaps.target.clone();
        Transition::set_value(name, new_value).apply(&mut target);
        let after = classify(&snaps.source, &target).state(name);

        Ok(SyncOutcome {
            name: name.to_string(),
            dry_run: true,
            applied: false,
            before,
            after,
        })
    }

    /// Sync every eligible name from the loaded source vault in one store call.
    ///
    /// The store decides eligibility; its per-name results are mirrored into
    /// the target snapshot. Failed names are not retried.
    pub fn sync_all(&self, target_vault: &str, dry_run: bool) -> Result<BulkSyncReport> {
        require_selection(Role::Target, target_vault)?;
        let source = self.snapshot(Role::Source);
        let source_vault = source
            .vault()
            .map(str::to_string)
            .ok_or(VaultSyncError::MissingSelection(Role::Source))?;

        let target_id = self.vault_id(target_vault);
        let _claim = self.coordinator.begin_bulk(&target_id)?;

        let request = BulkSyncRequest {
            target_vault: target_vault.to_string(),
            source_vault: source_vault.clone(),
            dry_run,
        };
        let response = self.store.bulk_sync(&request).map_err(|e| match e {
            VaultSyncError::TransportFailure { .. } => e,
            other => VaultSyncError::remote(Operation::BulkSync, "*", Some(other.to_string())),
        })?;

        let mut report = BulkSyncReport {
            dry_run,
            results: response.results,
            unapplied: Vec::new(),
        };

        if !dry_run {
            for (name, ok) in &report.results {
                if !ok {
                    continue;
                }
                let applied = match source.value(name) {
                    Some(value) => self.commit(&Transition::set_value(name, value), &target_id),
                    None => false,
                };
                if !applied {
                    report.unapplied.push(name.clone());
                }
            }
        }

        if report.succeeded() < report.total() {
            warn!(
                target = target_vault,
                failed = ?report.failed(),
                "bulk sync partially failed"
            );
        }
        info!(
            target = target_vault,
            source = %source_vault,
            dry_run,
            result = %report.summary(),
            "bulk sync finished"
        );
        Ok(report)
    }

    /// Apply `transition` to the target snapshot if it mirrors `target_id`.
    fn commit(&self, transition: &Transition, target_id: &str) -> bool {
        let mut snaps = self.write();
        if snaps.id(Role::Target) != Some(target_id) {
            debug!(
                name = transition.name(),
                target = target_id,
                "target snapshot is for another vault; not mirrored"
            );
            return false;
        }
        transition.apply(&mut snaps.target);
        true
    }
}

fn require_selection(role: Role, vault: &str) -> Result<()> {
    if vault.trim().is_empty() {
        return Err(VaultSyncError::MissingSelection(role));
    }
    Ok(())
}

fn require_value(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(VaultSyncError::EmptyValue(name.to_string()));
    }
    Ok(())
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(VaultSyncError::InvalidName("name cannot be empty".into()));
    }
    Ok(())
}

/// Turn a store reply into `Ok(())` or the matching error.
fn check_response(operation: Operation, name: &str, response: Result<WriteResponse>) -> Result<()> {
    match response {
        Ok(WriteResponse { success: true, .. }) => Ok(()),
        Ok(WriteResponse { error, .. }) => {
            let err = VaultSyncError::remote(operation, name, error);
            warn!(name, %operation, error = %err, "store refused write");
            Err(err)
        }
        Err(e @ VaultSyncError::TransportFailure { .. }) => {
            warn!(name, %operation, error = %e, "store unreachable");
            Err(e)
        }
        Err(other) => Err(VaultSyncError::remote(
            operation,
            name,
            Some(other.to_string()),
        )),
    }
}
