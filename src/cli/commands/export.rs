//! `vaultsync export`: write a vault to a JSON file.
//!
//! Usage:
//!   vaultsync --target kv-prod export                 # kv-prod_export_<date>.json
//!   vaultsync export --vault kv-dev --output dev.json

use std::path::Path;

use chrono::Utc;

use crate::audit;
use crate::cli::output;
use crate::cli::Context;
use crate::engine::Role;
use crate::errors::{Result, VaultSyncError};
use crate::transfer::{default_export_file_name, export_snapshot, write_export};

/// Execute the `export` command.
pub fn execute(ctx: &Context, vault: Option<&str>, output_path: Option<&str>) -> Result<()> {
    let vault = match vault {
        Some(v) => v,
        None => ctx.require_target()?,
    };

    let session = ctx.session()?;
    session.load(Role::Target, vault)?;

    let now = Utc::now();
    let doc = export_snapshot(&session.snapshot(Role::Target), now)?;

    let dest = match output_path {
        Some(p) => ctx.project_dir.join(p),
        None => ctx.project_dir.join(default_export_file_name(vault, now)),
    };

    // Refuse to clobber a vault file inside the store.
    if dest.starts_with(&ctx.store_dir) {
        return Err(VaultSyncError::CommandFailed(format!(
            "refusing to export into the store directory ({})",
            ctx.store_dir.display()
        )));
    }

    let result = write_export(&doc, &dest);
    let details = format!("{} secrets to {}", doc.secrets.len(), display_name(&dest));
    audit::log_result(ctx, "export", vault, None, &result, Some(&details));
    result?;

    output::success(&format!(
        "Exported {} secrets from {} to {}",
        doc.secrets.len(),
        vault,
        dest.display()
    ));
    output::warning("The export file contains plaintext secret values. Keep it safe.");

    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
