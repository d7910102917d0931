//! In-process secret store.
//!
//! Holds vaults in memory and can be told to refuse writes for specific
//! names or to fail every call at the transport level, which makes it the
//! store of choice for exercising the engine's failure paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{
    bulk_eligible, split_vault_ref, BulkSyncRequest, BulkSyncResponse, SecretStore, Subscription,
    SyncRequest, UpdateRequest, VaultContents, WriteResponse,
};
use crate::errors::{Result, VaultSyncError};

const DEFAULT_SUBSCRIPTION: &str = "default";

#[derive(Debug, Default)]
struct Inner {
    // vault name -> (subscription, contents)
    vaults: BTreeMap<String, (String, VaultContents)>,
    // secret name -> refusal message (None = no message)
    refusals: HashMap<String, Option<String>>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    offline: AtomicBool,
    write_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a vault in the default subscription.
    pub fn with_vault<I, K, V>(self, vault: &str, secrets: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.insert_vault(DEFAULT_SUBSCRIPTION, vault, secrets);
        self
    }

    pub fn insert_vault<I, K, V>(&self, subscription: &str, vault: &str, secrets: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let contents = VaultContents {
            secrets: secrets
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            metadata: BTreeMap::new(),
        };
        self.lock()
            .vaults
            .insert(vault.to_string(), (subscription.to_string(), contents));
    }

    /// Make every write touching `name` report failure with `message`.
    pub fn refuse_writes(&self, name: &str, message: Option<&str>) {
        self.lock()
            .refusals
            .insert(name.to_string(), message.map(str::to_string));
    }

    pub fn allow_writes(&self, name: &str) {
        self.lock().refusals.remove(name);
    }

    /// While offline, every call fails as if the network were down.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of write calls (sync, update, bulk) received so far, dry runs included.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Current value of `name` in `vault`, read directly from the store.
    pub fn value(&self, vault: &str, name: &str) -> Option<String> {
        let (_, vault) = split_vault_ref(vault);
        self.lock()
            .vaults
            .get(vault)
            .and_then(|(_, c)| c.secrets.get(name).cloned())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_online(&self, context: &str) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(VaultSyncError::transport(context, "connection refused"));
        }
        Ok(())
    }

    fn begin_write(&self, context: &str) -> Result<()> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online(context)
    }
}

impl Inner {
    fn contents(&self, vault: &str) -> Result<&VaultContents> {
        let (_, name) = split_vault_ref(vault);
        self.vaults
            .get(name)
            .map(|(_, c)| c)
            .ok_or_else(|| VaultSyncError::VaultNotFound(vault.to_string()))
    }

    fn contents_mut(&mut self, vault: &str) -> Result<&mut VaultContents> {
        let (_, name) = split_vault_ref(vault);
        self.vaults
            .get_mut(name)
            .map(|(_, c)| c)
            .ok_or_else(|| VaultSyncError::VaultNotFound(vault.to_string()))
    }

    fn refusal(&self, name: &str) -> Option<WriteResponse> {
        self.refusals.get(name).map(|message| WriteResponse {
            success: false,
            error: message.clone(),
        })
    }
}

impl SecretStore for MemoryStore {
    fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        self.check_online("listing subscriptions")?;
        let mut subs: Vec<String> = self.lock().vaults.values().map(|(s, _)| s.clone()).collect();
        subs.sort();
        subs.dedup();
        Ok(subs
            .into_iter()
            .map(|s| Subscription {
                id: s.clone(),
                name: s,
            })
            .collect())
    }

    fn list_vaults(&self, subscription: Option<&str>) -> Result<Vec<String>> {
        self.check_online("listing vaults")?;
        let inner = self.lock();
        let vaults = inner.vaults.iter().filter_map(|(name, (sub, _))| match subscription {
            Some(wanted) if wanted == sub => Some(name.clone()),
            Some(_) => None,
            None => Some(format!("{sub}: {name}")),
        });
        let mut vaults: Vec<String> = vaults.collect();
        vaults.sort();
        Ok(vaults)
    }

    fn load_secrets(&self, vault: &str) -> Result<VaultContents> {
        self.check_online(&format!("loading {vault}"))?;
        self.lock().contents(vault).cloned()
    }

    fn canonical_vault(&self, vault: &str) -> Result<String> {
        let (_, name) = split_vault_ref(vault);
        self.lock()
            .vaults
            .get(name)
            .map(|(sub, _)| format!("{sub}: {name}"))
            .ok_or_else(|| VaultSyncError::VaultNotFound(vault.to_string()))
    }

    fn sync_secret(&self, request: &SyncRequest) -> Result<WriteResponse> {
        self.begin_write(&format!("syncing {}", request.name))?;
        let mut inner = self.lock();
        if let Some(refused) = inner.refusal(&request.name) {
            return Ok(refused);
        }

        let Some(value) = inner
            .contents(&request.source_vault)?
            .secrets
            .get(&request.name)
            .cloned()
        else {
            return Ok(WriteResponse::failed(format!(
                "Secret {} not found in source vault",
                request.name
            )));
        };

        let target = inner.contents_mut(&request.target_vault)?;
        if !request.dry_run {
            target.secrets.insert(request.name.clone(), value);
        }
        Ok(WriteResponse::ok())
    }

    fn update_secret(&self, request: &UpdateRequest) -> Result<WriteResponse> {
        self.begin_write(&format!("updating {}", request.name))?;
        let mut inner = self.lock();
        if let Some(refused) = inner.refusal(&request.name) {
            return Ok(refused);
        }
        inner
            .contents_mut(&request.target_vault)?
            .secrets
            .insert(request.name.clone(), request.value.clone());
        Ok(WriteResponse::ok())
    }

    fn bulk_sync(&self, request: &BulkSyncRequest) -> Result<BulkSyncResponse> {
        self.begin_write("bulk sync")?;
        let mut inner = self.lock();

        let source = inner.contents(&request.source_vault)?.secrets.clone();
        let refused: Vec<String> = inner.refusals.keys().cloned().collect();
        let target = inner.contents_mut(&request.target_vault)?;

        let mut results = BTreeMap::new();
        for name in bulk_eligible(&source, &target.secrets) {
            let ok = !refused.iter().any(|r| r == name);
            if ok && !request.dry_run {
                target.secrets.insert(name.to_string(), source[name].clone());
            }
            results.insert(name.to_string(), ok);
        }
        Ok(BulkSyncResponse { results })
    }
}
