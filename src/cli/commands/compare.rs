//! `vaultsync compare`: classify every secret name across source and target.
//!
//! Usage:
//!   vaultsync --source kv-dev --target kv-prod compare
//!   vaultsync compare --filter missing --show-metadata

use console::style;

use crate::cli::output::{self, ComparisonView};
use crate::cli::Context;
use crate::engine::{Role, ViewFilter};
use crate::errors::Result;

/// Execute the `compare` command.
pub fn execute(
    ctx: &Context,
    view_filter: ViewFilter,
    show_values: bool,
    show_metadata: bool,
) -> Result<()> {
    let session = ctx.loaded_session()?;
    let source = session.snapshot(Role::Source);
    let target = session.snapshot(Role::Target);
    let classified = session.classify();
    let names = session.view(view_filter);

    println!(
        "\n{} {} vs {}",
        style("Compare:").bold(),
        style(source.vault().unwrap_or_default()).cyan(),
        style(target.vault().unwrap_or_default()).cyan()
    );
    println!();

    if classified.is_empty() {
        output::info("Both vaults are empty.");
        return Ok(());
    }

    if names.is_empty() {
        output::info(&format!("No secrets match filter '{view_filter}'."));
    } else {
        let view = ComparisonView {
            show_values: show_values || ctx.settings.show_values,
            show_metadata: show_metadata || ctx.settings.show_metadata,
        };
        output::print_comparison(&names, &classified, &source, &target, view);
    }

    println!();
    output::print_comparison_summary(&classified);

    let pending = classified.eligible_for_sync().len();
    if pending > 0 {
        output::tip(&format!(
            "{pending} secret(s) need syncing. Run `vaultsync sync-all --dry-run` to check."
        ));
    }

    Ok(())
}
