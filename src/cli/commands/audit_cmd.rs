//! `vaultsync audit`: display the audit log.
//!
//! Usage:
//!   vaultsync audit               # show last 50 entries
//!   vaultsync audit --last 20     # show last 20
//!   vaultsync audit --since 7d    # entries from last 7 days

use chrono::Utc;

use crate::audit::{AuditEntry, AuditLog};
use crate::cli::output;
use crate::cli::Context;
use crate::errors::{Result, VaultSyncError};

/// Execute the `audit` command.
pub fn execute(ctx: &Context, last: usize, since: Option<&str>) -> Result<()> {
    if !AuditLog::db_path(&ctx.store_dir).exists() {
        output::info("No audit entries found.");
        if !ctx.settings.audit {
            output::tip("Auditing is disabled (audit = false in .vaultsync.toml).");
        }
        return Ok(());
    }

    let audit = AuditLog::open(&ctx.store_dir)
        .ok_or_else(|| VaultSyncError::AuditError("failed to open audit database".into()))?;

    let since_dt = match since {
        Some(s) => Some(parse_duration(s)?),
        None => None,
    };

    let entries = audit.query(last, since_dt)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);

    Ok(())
}

/// Parse a human-friendly duration string like "7d", "24h", "30m".
fn parse_duration(input: &str) -> Result<chrono::DateTime<Utc>> {
    let input = input.trim();

    let (num_str, unit) = if let Some(s) = input.strip_suffix('d') {
        (s, 'd')
    } else if let Some(s) = input.strip_suffix('h') {
        (s, 'h')
    } else if let Some(s) = input.strip_suffix('m') {
        (s, 'm')
    } else {
        return Err(VaultSyncError::CommandFailed(format!(
            "invalid duration '{input}' — use format like 7d, 24h, or 30m"
        )));
    };

    let num: i64 = num_str.parse().map_err(|_| {
        VaultSyncError::CommandFailed(format!(
            "invalid duration '{input}' — number part is not valid"
        ))
    })?;

    let duration = match unit {
        'd' => chrono::Duration::days(num),
        'h' => chrono::Duration::hours(num),
        _ => chrono::Duration::minutes(num),
    };

    Ok(Utc::now() - duration)
}

/// Print audit entries in a formatted table.
pub fn print_audit_table(entries: &[AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Operation", "Vault", "Secret", "Outcome", "Details"]);

    for entry in entries {
        let time = entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let op = colorize_operation(&entry.operation);
        let name = entry.secret_name.as_deref().unwrap_or("-");
        let details = entry.details.as_deref().unwrap_or("-");

        table.add_row(vec![
            time,
            op,
            entry.vault.clone(),
            name.to_string(),
            colorize_outcome(&entry.outcome),
            details.to_string(),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

/// Colorize operation names for display.
fn colorize_operation(op: &str) -> String {
    use console::style;

    match op {
        "sync" | "sync-all" => style(op).green().to_string(),
        "edit" => style(op).blue().to_string(),
        "export" | "import" => style(op).cyan().to_string(),
        _ => op.to_string(),
    }
}

/// Colorize outcomes: failures stand out, dry runs fade.
fn colorize_outcome(outcome: &str) -> String {
    use console::style;

    match outcome {
        "ok" => style(outcome).green().to_string(),
        "failed" | "partial" => style(outcome).red().bold().to_string(),
        "dry-run" => style(outcome).dim().to_string(),
        _ => outcome.to_string(),
    }
}
