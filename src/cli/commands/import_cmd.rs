//! `vaultsync import`: validate an export file for import into the target.
//!
//! The file is parsed and checked; writing it into a vault is not
//! implemented, and the command always says so instead of pretending.

use std::path::Path;

use crate::audit;
use crate::cli::output;
use crate::cli::Context;
use crate::errors::{Result, VaultSyncError};
use crate::transfer::{apply_import, read_import};

/// Execute the `import` command.
pub fn execute(ctx: &Context, file_path: &str) -> Result<()> {
    let target = ctx.require_target()?;
    let source = ctx.project_dir.join(file_path);

    if !source.exists() {
        return Err(VaultSyncError::CommandFailed(format!(
            "import file not found: {}",
            Path::new(file_path).display()
        )));
    }

    let doc = read_import(&source)?;
    output::info(&format!(
        "{} secrets found in {}{}",
        doc.secrets.len(),
        file_path,
        doc.vault_name
            .as_deref()
            .map(|v| format!(" (exported from {v})"))
            .unwrap_or_default()
    ));

    let result = apply_import(&doc, target);
    audit::log_result(ctx, "import", target, None, &result, None);
    result
}
