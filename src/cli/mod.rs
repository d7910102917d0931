//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::config::Settings;
use crate::engine::{Role, Session, ViewFilter};
use crate::errors::{Result, VaultSyncError};
use crate::store::FileStore;

/// vaultsync CLI: compare two secret vaults and converge the target.
#[derive(Parser)]
#[command(
    name = "vaultsync",
    about = "Compare secret vaults and sync the target from the source",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Store directory (default: `store_dir` from .vaultsync.toml, else ./vaults)
    #[arg(long, global = true, env = "VAULTSYNC_STORE_DIR")]
    pub store_dir: Option<String>,

    /// Source vault, optionally prefixed "<subscription>: "
    #[arg(short, long, global = true)]
    pub source: Option<String>,

    /// Target vault, optionally prefixed "<subscription>: "
    #[arg(short, long, global = true)]
    pub target: Option<String>,

    /// Print debug diagnostics to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// List subscriptions in the store
    Subscriptions,

    /// List vaults (all subscriptions unless one is given)
    Vaults {
        /// Only list vaults in this subscription
        #[arg(long)]
        subscription: Option<String>,
    },

    /// Compare the source and target vaults
    Compare {
        /// Which rows to show: all, missing, different, identical
        #[arg(short, long, default_value = "all")]
        filter: ViewFilter,
        /// Show secret values
        #[arg(long)]
        show_values: bool,
        /// Show created/modified/expiry dates
        #[arg(long)]
        show_metadata: bool,
    },

    /// Copy one secret from the source vault into the target vault
    Sync {
        /// Secret name
        name: String,
        /// Validate only; change nothing
        #[arg(long, conflicts_with = "apply")]
        dry_run: bool,
        /// Write even if `dry_run = true` in .vaultsync.toml
        #[arg(long)]
        apply: bool,
    },

    /// Copy every missing or different secret into the target vault
    SyncAll {
        /// Validate only; change nothing
        #[arg(long, conflicts_with = "apply")]
        dry_run: bool,
        /// Write even if `dry_run = true` in .vaultsync.toml
        #[arg(long)]
        apply: bool,
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Set a secret's value in the target vault
    Edit {
        /// Secret name
        name: String,
        /// New value (omit to read from stdin or prompt)
        value: Option<String>,
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Export a vault to a JSON file
    Export {
        /// Vault to export (default: the target vault)
        #[arg(long)]
        vault: Option<String>,
        /// Output file path (default: <vault>_export_<date>.json)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate a JSON export for import into the target vault
    Import {
        /// Path to the file to import
        file: String,
    },

    /// View the audit log of sync operations
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Everything a command needs: settings merged with command-line flags.
#[derive(Debug, Clone)]
pub struct Context {
    pub project_dir: PathBuf,
    pub settings: Settings,
    pub store_dir: PathBuf,
    pub source: Option<String>,
    pub target: Option<String>,
}

impl Context {
    /// Load `.vaultsync.toml` from the working directory and apply flags on top.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_dir = std::env::current_dir()?;
        let settings = Settings::load(&project_dir)?;
        Ok(Self::new(project_dir, settings, cli))
    }

    /// Merge `settings` with the flags in `cli`. Flags win.
    pub fn new(project_dir: PathBuf, settings: Settings, cli: &Cli) -> Self {
        let store_dir = match &cli.store_dir {
            Some(dir) => project_dir.join(dir),
            None => settings.store_path(&project_dir),
        };
        let source = cli.source.clone().or_else(|| settings.source_vault.clone());
        let target = cli.target.clone().or_else(|| settings.target_vault.clone());

        Self {
            project_dir,
            settings,
            store_dir,
            source,
            target,
        }
    }

    /// Open the file store, failing if the directory does not exist.
    pub fn store(&self) -> Result<FileStore> {
        if !self.store_dir.is_dir() {
            return Err(VaultSyncError::ConfigError(format!(
                "store directory {} does not exist — pass --store-dir or set store_dir in .vaultsync.toml",
                self.store_dir.display()
            )));
        }
        Ok(FileStore::new(&self.store_dir))
    }

    /// A fresh session over the file store. Nothing is loaded yet.
    pub fn session(&self) -> Result<Session<FileStore>> {
        Ok(Session::new(self.store()?))
    }

    /// A session with both the source and target snapshots loaded.
    pub fn loaded_session(&self) -> Result<Session<FileStore>> {
        let source = self.require_source()?;
        let target = self.require_target()?;
        let session = self.session()?;
        session.load(Role::Source, source)?;
        session.load(Role::Target, target)?;
        Ok(session)
    }

    pub fn require_source(&self) -> Result<&str> {
        selected(self.source.as_deref(), Role::Source)
    }

    pub fn require_target(&self) -> Result<&str> {
        selected(self.target.as_deref(), Role::Target)
    }

    /// A write is a dry run if asked for, or if settings default to it and
    /// `--apply` was not passed.
    pub fn resolve_dry_run(&self, dry_run: bool, apply: bool) -> bool {
        dry_run || (self.settings.dry_run && !apply)
    }
}

fn selected(vault: Option<&str>, role: Role) -> Result<&str> {
    match vault {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(VaultSyncError::MissingSelection(role)),
    }
}
