//! Bookkeeping for in-flight loads and writes.
//!
//! Rules enforced here:
//! - at most one write per `(vault, name)` at a time;
//! - a bulk sync owns its whole target vault while it runs;
//! - no writes while the target snapshot is being reloaded, and no target
//!   reload while writes are in flight;
//! - at most one load per role at a time.
//!
//! Conflicting requests are rejected, never queued. Each accepted request
//! returns a guard that releases its claim on drop.
//!
//! Vault keys are compared as given, so callers pass canonical vault ids.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::snapshot::Role;
use crate::errors::{Result, VaultSyncError};

#[derive(Debug, Default)]
struct VaultActivity {
    names: HashSet<String>,
    bulk: bool,
}

impl VaultActivity {
    fn is_idle(&self) -> bool {
        self.names.is_empty() && !self.bulk
    }
}

#[derive(Debug, Default)]
struct State {
    loading: HashSet<Role>,
    writes: HashMap<String, VaultActivity>,
}

impl State {
    fn has_writes(&self) -> bool {
        self.writes.values().any(|a| !a.is_idle())
    }
}

/// Shared registry of what is currently in flight for one session.
#[derive(Debug, Default)]
pub struct Coordinator {
    state: Mutex<State>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock cannot leave the sets inconsistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim a single-name write against `vault`.
    pub fn begin_write(&self, vault: &str, name: &str) -> Result<WriteGuard<'_>> {
        let mut state = self.lock();
        if state.loading.contains(&Role::Target) {
            return Err(VaultSyncError::LoadInProgress(Role::Target));
        }
        let activity = state.writes.entry(vault.to_string()).or_default();
        if activity.bulk || !activity.names.insert(name.to_string()) {
            return Err(VaultSyncError::MutationInFlight {
                vault: vault.to_string(),
                name: name.to_string(),
            });
        }
        Ok(WriteGuard {
            coordinator: self,
            vault: vault.to_string(),
            claim: Claim::Name(name.to_string()),
        })
    }

    /// Claim every name in `vault` for a bulk sync.
    pub fn begin_bulk(&self, vault: &str) -> Result<WriteGuard<'_>> {
        let mut state = self.lock();
        if state.loading.contains(&Role::Target) {
            return Err(VaultSyncError::LoadInProgress(Role::Target));
        }
        let activity = state.writes.entry(vault.to_string()).or_default();
        if !activity.is_idle() {
            return Err(VaultSyncError::MutationInFlight {
                vault: vault.to_string(),
                name: "*".to_string(),
            });
        }
        activity.bulk = true;
        Ok(WriteGuard {
            coordinator: self,
            vault: vault.to_string(),
            claim: Claim::Bulk,
        })
    }

    /// Claim the snapshot slot for `role` while it is reloaded.
    pub fn begin_load(&self, role: Role) -> Result<LoadGuard<'_>> {
        let mut state = self.lock();
        if state.loading.contains(&role) || (role == Role::Target && state.has_writes()) {
            return Err(VaultSyncError::LoadInProgress(role));
        }
        state.loading.insert(role);
        Ok(LoadGuard {
            coordinator: self,
            role,
        })
    }

    /// `true` if a write to `(vault, name)` is currently in flight.
    pub fn is_writing(&self, vault: &str, name: &str) -> bool {
        self.lock()
            .writes
            .get(vault)
            .is_some_and(|a| a.bulk || a.names.contains(name))
    }
}

#[derive(Debug)]
enum Claim {
    Name(String),
    Bulk,
}

/// Releases a write claim on drop.
#[derive(Debug)]
pub struct WriteGuard<'a> {
    coordinator: &'a Coordinator,
    vault: String,
    claim: Claim,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.coordinator.lock();
        let idle = match state.writes.get_mut(&self.vault) {
            Some(activity) => {
                match &self.claim {
                    Claim::Name(name) => {
                        activity.names.remove(name);
                    }
                    Claim::Bulk => activity.bulk = false,
                }
                activity.is_idle()
            }
            None => false,
        };
        if idle {
            state.writes.remove(&self.vault);
        }
    }
}

/// Releases a load claim on drop.
#[derive(Debug)]
pub struct LoadGuard<'a> {
    coordinator: &'a Coordinator,
    role: Role,
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.lock().loading.remove(&self.role);
    }
}
