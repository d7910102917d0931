use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultSyncError};

/// Project-level configuration, loaded from `.vaultsync.toml`.
///
/// Every field has a default so vaultsync works without any config file.
/// Command-line flags override these values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Root directory of the file store (relative to the project root).
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Vault to compare from when `--source` is not given.
    #[serde(default)]
    pub source_vault: Option<String>,

    /// Vault to converge when `--target` is not given.
    #[serde(default)]
    pub target_vault: Option<String>,

    /// Treat every sync as a dry run unless `--apply` is passed.
    #[serde(default)]
    pub dry_run: bool,

    /// Show secret values in `compare` output.
    #[serde(default)]
    pub show_values: bool,

    /// Show created/modified/expiry dates in `compare` output.
    #[serde(default)]
    pub show_metadata: bool,

    /// Record operations in `<store_dir>/audit.db`.
    #[serde(default = "default_audit")]
    pub audit: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_store_dir() -> String {
    "vaults".to_string()
}

fn default_audit() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            source_vault: None,
            target_vault: None,
            dry_run: false,
            show_values: false,
            show_metadata: false,
            audit: default_audit(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the project root.
    const FILE_NAME: &'static str = ".vaultsync.toml";

    /// Load settings from `<project_dir>/.vaultsync.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            VaultSyncError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        Ok(settings)
    }

    /// Full path to the store root.
    pub fn store_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.store_dir)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.store_dir, "vaults");
        assert!(s.source_vault.is_none());
        assert!(s.target_vault.is_none());
        assert!(!s.dry_run);
        assert!(!s.show_values);
        assert!(s.audit);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
store_dir = "secrets"
source_vault = "ops: kv-staging"
target_vault = "ops: kv-prod"
dry_run = true
show_values = true
show_metadata = true
audit = false
"#;
        fs::write(tmp.path().join(".vaultsync.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.store_dir, "secrets");
        assert_eq!(settings.source_vault.as_deref(), Some("ops: kv-staging"));
        assert_eq!(settings.target_vault.as_deref(), Some("ops: kv-prod"));
        assert!(settings.dry_run);
        assert!(settings.show_values);
        assert!(settings.show_metadata);
        assert!(!settings.audit);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".vaultsync.toml"), "dry_run = true\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert!(settings.dry_run);
        assert_eq!(settings.store_dir, "vaults");
        assert!(settings.audit);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".vaultsync.toml"), "not valid {{toml").unwrap();

        let result = Settings::load(tmp.path());
        assert!(matches!(result, Err(VaultSyncError::ConfigError(_))));
    }

    #[test]
    fn store_path_joins_project_dir() {
        let s = Settings {
            store_dir: "secrets".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            s.store_path(Path::new("/home/user/project")),
            PathBuf::from("/home/user/project/secrets")
        );
    }
}
