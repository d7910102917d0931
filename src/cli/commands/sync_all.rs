//! `vaultsync sync-all`: sync every missing or different secret in one call.
//!
//! Usage:
//!   vaultsync sync-all --dry-run
//!   vaultsync sync-all --yes

use console::style;
use dialoguer::Confirm;

use crate::audit;
use crate::cli::output;
use crate::cli::Context;
use crate::engine::BulkSyncReport;
use crate::errors::{Result, VaultSyncError};

/// Execute the `sync-all` command.
pub fn execute(ctx: &Context, dry_run: bool, apply: bool, yes: bool) -> Result<()> {
    let dry_run = ctx.resolve_dry_run(dry_run, apply);
    let session = ctx.loaded_session()?;
    let target = ctx.require_target()?;

    let eligible = session.classify().eligible_for_sync().len();
    if eligible == 0 {
        output::success("Target already has every source secret. Nothing to sync.");
        return Ok(());
    }

    // Unless --yes is set, ask for confirmation before writing.
    if !dry_run && !yes {
        let confirmed = Confirm::new()
            .with_prompt(format!("Sync {eligible} secret(s) into '{target}'?"))
            .default(false)
            .interact()
            .map_err(|e| VaultSyncError::CommandFailed(format!("confirm prompt: {e}")))?;

        if !confirmed {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let result = session.sync_all(target, dry_run);
    match &result {
        Ok(report) => {
            let outcome = match (dry_run, report.failed().is_empty()) {
                (true, _) => "dry-run",
                (false, true) => "ok",
                (false, false) => "partial",
            };
            audit::log_audit(ctx, "sync-all", target, None, outcome, Some(&report.summary()));
        }
        Err(_) => audit::log_result(ctx, "sync-all", target, None, &result, None),
    }

    report(&result?, target);
    Ok(())
}

fn report(report: &BulkSyncReport, target: &str) {
    for (name, ok) in &report.results {
        if *ok {
            println!("  {} {}", style("+").green().bold(), name);
        } else {
            println!("  {} {}", style("x").red().bold(), style(name).red());
        }
    }
    println!();

    let prefix = if report.dry_run { "[DRY RUN] " } else { "" };
    let msg = format!(
        "{prefix}Bulk sync into {target}: {} secrets synced",
        report.summary()
    );
    if report.failed().is_empty() {
        output::success(&msg);
    } else {
        output::warning(&msg);
        output::tip("Failed names are not retried. Run `vaultsync sync <name>` to see why.");
    }

    if !report.unapplied.is_empty() {
        output::warning(&format!(
            "{} synced secret(s) not mirrored locally: {}",
            report.unapplied.len(),
            report.unapplied.join(", ")
        ));
    }
}
