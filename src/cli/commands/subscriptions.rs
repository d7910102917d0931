//! `vaultsync subscriptions`: list the subscriptions in the store.

use comfy_table::{ContentArrangement, Table};

use crate::cli::output;
use crate::cli::Context;
use crate::errors::Result;
use crate::store::SecretStore;

/// Execute the `subscriptions` command.
pub fn execute(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let subscriptions = store.list_subscriptions()?;

    if subscriptions.is_empty() {
        output::info("No subscriptions found.");
        output::tip(&format!(
            "Create one as a directory under {}",
            ctx.store_dir.display()
        ));
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Id", "Name"]);
    for sub in &subscriptions {
        table.add_row(vec![sub.id.clone(), sub.name.clone()]);
    }
    println!("{table}");

    Ok(())
}
