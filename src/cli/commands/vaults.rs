//! `vaultsync vaults`: list vaults, across all subscriptions or in one.
//!
//! Usage:
//!   vaultsync vaults                       # "<subscription>: <vault>" for every vault
//!   vaultsync vaults --subscription ops    # bare vault names in "ops"

use console::style;

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;
use crate::store::SecretStore;

/// Execute the `vaults` command.
pub fn execute(ctx: &Context, subscription: Option<&str>) -> Result<()> {
    let store = ctx.store()?;
    let vaults = store.list_vaults(subscription)?;

    if vaults.is_empty() {
        output::info("No vaults found.");
        return Ok(());
    }

    let source = selected_id(&store, ctx.source.as_deref());
    let target = selected_id(&store, ctx.target.as_deref());
    for vault in &vaults {
        let id = match subscription {
            Some(sub) => format!("{sub}: {vault}"),
            None => vault.clone(),
        };
        println!(
            "  {}{}",
            vault,
            selection_marker(Some(&id) == source.as_ref(), Some(&id) == target.as_ref())
        );
    }

    Ok(())
}

fn selected_id(store: &impl SecretStore, selected: Option<&str>) -> Option<String> {
    selected.and_then(|v| store.canonical_vault(v).ok())
}

/// Tag the vaults currently selected as source or target.
fn selection_marker(is_source: bool, is_target: bool) -> String {
    match (is_source, is_target) {
        (true, true) => format!(" {}", style("(source, target)").dim()),
        (true, false) => format!(" {}", style("(source)").green()),
        (false, true) => format!(" {}", style("(target)").cyan()),
        (false, false) => String::new(),
    }
}
