//! `vaultsync sync`: copy one secret from the source vault into the target.
//!
//! Usage:
//!   vaultsync --source kv-dev --target kv-prod sync DB_URL
//!   vaultsync sync DB_URL --dry-run

use crate::audit;
use crate::cli::output;
use crate::cli::Context;
use crate::engine::{ComparisonState, SyncOutcome};
use crate::errors::Result;

/// Execute the `sync` command.
pub fn execute(ctx: &Context, name: &str, dry_run: bool, apply: bool) -> Result<()> {
    let dry_run = ctx.resolve_dry_run(dry_run, apply);
    let session = ctx.loaded_session()?;
    let source = ctx.require_source()?;
    let target = ctx.require_target()?;

    let result = session.sync_from_source(name, target, source, dry_run);
    match &result {
        Ok(_) if dry_run => audit::log_audit(ctx, "sync", target, Some(name), "dry-run", None),
        _ => audit::log_result(ctx, "sync", target, Some(name), &result, Some(source)),
    }
    let outcome = result?;

    report(&outcome, target);
    Ok(())
}

fn report(outcome: &SyncOutcome, target: &str) {
    let name = &outcome.name;

    if outcome.dry_run {
        output::success(&format!("[DRY RUN] Would sync '{name}' into {target}"));
        if outcome.before == Some(ComparisonState::Match) {
            output::info("Values already match; the sync would change nothing.");
        }
        return;
    }

    output::success(&format!("Successfully synced '{name}' into {target}"));
    if !outcome.applied {
        output::warning("Not in the loaded source snapshot; reload to see the new value.");
    }
}
