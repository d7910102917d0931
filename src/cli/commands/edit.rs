//! `vaultsync edit`: set a secret's value directly in the target vault.
//!
//! Usage:
//!   vaultsync --target kv-prod edit API_KEY             # secure prompt
//!   echo -n "$VALUE" | vaultsync edit API_KEY            # piped
//!   vaultsync edit API_KEY new-value --dry-run

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::audit;
use crate::cli::output;
use crate::cli::Context;
use crate::engine::{Role, SyncOutcome};
use crate::errors::{Result, VaultSyncError};

/// Execute the `edit` command.
pub fn execute(ctx: &Context, name: &str, value: Option<&str>, dry_run: bool) -> Result<()> {
    let target = ctx.require_target()?;
    let session = ctx.session()?;
    session.load(Role::Target, target)?;
    // The source is optional here; with it loaded the outcome shows the new state.
    if let Some(source) = ctx.source.as_deref().filter(|s| !s.trim().is_empty()) {
        session.load(Role::Source, source)?;
    }

    let new_value = read_value(name, value)?;

    if dry_run {
        let outcome = session.preview_update(name, target, &new_value)?;
        audit::log_audit(ctx, "edit", target, Some(name), "dry-run", None);
        report(&outcome, target);
        return Ok(());
    }

    let result = session.update_direct(name, target, &new_value);
    audit::log_result(ctx, "edit", target, Some(name), &result, None);
    report(&result?, target);
    Ok(())
}

/// Take the new value from the argument, piped stdin, or a hidden prompt.
fn read_value(name: &str, value: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(v) = value {
        output::warning("Value provided on command line — it may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim_end().len();
        buf.truncate(trimmed);
        return Ok(buf);
    }

    let entered = dialoguer::Password::new()
        .with_prompt(format!("Enter new value for {name}"))
        .allow_empty_password(true)
        .interact()
        .map_err(|e| VaultSyncError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(entered))
}

fn report(outcome: &SyncOutcome, target: &str) {
    let name = &outcome.name;
    if outcome.dry_run {
        output::success(&format!("[DRY RUN] Would update '{name}' in {target}"));
    } else {
        output::success(&format!("Successfully updated '{name}' in {target}"));
    }
    if let (Some(before), Some(after)) = (outcome.before, outcome.after) {
        if before != after {
            output::info(&format!("State: {before} → {after}"));
        }
    }
}
