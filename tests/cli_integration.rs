//! Integration tests for the vaultsync CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`, against a
//! file store laid out in a temp directory:
//!
//! ```text
//! <tmp>/vaults/ops/kv-dev.json
//! <tmp>/vaults/ops/kv-prod.json
//! ```

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::{json, Value};

/// Helper: get a Command pointing at the vaultsync binary.
fn vaultsync() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("vaultsync").expect("binary should exist")
}

/// Helper: a command run inside `dir` with kv-dev → kv-prod selected.
fn in_project(dir: &TempDir) -> Command {
    let mut cmd = vaultsync();
    cmd.current_dir(dir.path())
        .env_remove("VAULTSYNC_STORE_DIR")
        .env_remove("RUST_LOG")
        .args(["--source", "kv-dev", "--target", "kv-prod"]);
    cmd
}

fn write_vault(dir: &TempDir, sub: &str, vault: &str, secrets: &[(&str, &str)]) {
    let sub_dir = dir.path().join("vaults").join(sub);
    fs::create_dir_all(&sub_dir).unwrap();
    let secrets: serde_json::Map<String, Value> = secrets
        .iter()
        .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
        .collect();
    let doc = json!({ "vault_name": vault, "secrets": secrets });
    fs::write(
        sub_dir.join(format!("{vault}.json")),
        serde_json::to_string_pretty(&doc).unwrap(),
    )
    .unwrap();
}

fn read_secrets(dir: &TempDir, sub: &str, vault: &str) -> serde_json::Map<String, Value> {
    let path = dir.path().join("vaults").join(sub).join(format!("{vault}.json"));
    let doc: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    doc["secrets"].as_object().unwrap().clone()
}

/// Source: DB_HOST=1, API_KEY=2, NEW_FLAG=3.
/// Target: DB_HOST=1, API_KEY=9, LEGACY_TOKEN=4.
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_vault(
        &dir,
        "ops",
        "kv-dev",
        &[("DB_HOST", "1"), ("API_KEY", "2"), ("NEW_FLAG", "3")],
    );
    write_vault(
        &dir,
        "ops",
        "kv-prod",
        &[("DB_HOST", "1"), ("API_KEY", "9"), ("LEGACY_TOKEN", "4")],
    );
    dir
}

// ---------------------------------------------------------------------------
// Help and argument parsing
// ---------------------------------------------------------------------------

#[test]
fn help_flag_shows_usage() {
    vaultsync()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Compare secret vaults"))
        .stdout(predicate::str::contains("compare"))
        .stdout(predicate::str::contains("sync-all"))
        .stdout(predicate::str::contains("edit"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("import"));
}

#[test]
fn version_flag_shows_version() {
    vaultsync()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vaultsync"));
}

#[test]
fn no_args_shows_help() {
    vaultsync()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unknown_filter_is_rejected() {
    vaultsync()
        .args(["compare", "--filter", "target-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown filter"));
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[test]
fn subscriptions_lists_store_folders() {
    let dir = project();
    write_vault(&dir, "payments", "kv-pay", &[]);

    in_project(&dir)
        .arg("subscriptions")
        .assert()
        .success()
        .stdout(predicate::str::contains("ops"))
        .stdout(predicate::str::contains("payments"));
}

#[test]
fn vaults_are_prefixed_with_subscription() {
    let dir = project();

    in_project(&dir)
        .arg("vaults")
        .assert()
        .success()
        .stdout(predicate::str::contains("ops: kv-dev"))
        .stdout(predicate::str::contains("ops: kv-prod"));
}

#[test]
fn vaults_marks_only_the_selected_subscription() {
    let dir = project();
    write_vault(&dir, "a", "kv", &[]);
    write_vault(&dir, "b", "kv", &[]);

    vaultsync()
        .current_dir(dir.path())
        .env_remove("VAULTSYNC_STORE_DIR")
        .args(["--source", "kv-dev", "--target", "a: kv", "vaults"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ops: kv-dev (source)"))
        .stdout(predicate::str::contains("a: kv (target)"))
        .stdout(predicate::str::contains("b: kv (target)").not());
}

#[test]
fn missing_store_dir_fails() {
    let dir = TempDir::new().unwrap();

    in_project(&dir)
        .arg("vaults")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

// ---------------------------------------------------------------------------
// Compare
// ---------------------------------------------------------------------------

#[test]
fn compare_without_selection_fails() {
    let dir = project();

    vaultsync()
        .current_dir(dir.path())
        .env_remove("VAULTSYNC_STORE_DIR")
        .arg("compare")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No source vault selected"));
}

#[test]
fn compare_classifies_every_name_and_hides_values() {
    let dir = project();

    in_project(&dir)
        .arg("compare")
        .assert()
        .success()
        .stdout(predicate::str::contains("match"))
        .stdout(predicate::str::contains("different"))
        .stdout(predicate::str::contains("source-only"))
        .stdout(predicate::str::contains("target-only"))
        .stdout(predicate::str::contains("***HIDDEN***"))
        .stdout(predicate::str::contains("1 match, 1 different, 1 source-only, 1 target-only"));
}

#[test]
fn compare_missing_filter_shows_source_only() {
    let dir = project();

    in_project(&dir)
        .args(["compare", "--filter", "missing", "--show-values"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NEW_FLAG"))
        .stdout(predicate::str::contains("LEGACY_TOKEN").not())
        .stdout(predicate::str::contains("API_KEY").not())
        .stdout(predicate::str::contains("***HIDDEN***").not());
}

#[test]
fn compare_reads_selection_from_config() {
    let dir = project();
    fs::write(
        dir.path().join(".vaultsync.toml"),
        "source_vault = \"ops: kv-dev\"\ntarget_vault = \"ops: kv-prod\"\n",
    )
    .unwrap();

    vaultsync()
        .current_dir(dir.path())
        .env_remove("VAULTSYNC_STORE_DIR")
        .arg("compare")
        .assert()
        .success()
        .stdout(predicate::str::contains("source-only"));
}

#[test]
fn compare_unknown_vault_fails() {
    let dir = project();

    vaultsync()
        .current_dir(dir.path())
        .args(["--source", "kv-missing", "--target", "kv-prod", "compare"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Vault 'kv-missing' not found"));
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

#[test]
fn sync_dry_run_leaves_target_untouched() {
    let dir = project();

    in_project(&dir)
        .args(["sync", "NEW_FLAG", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN]"));

    assert!(!read_secrets(&dir, "ops", "kv-prod").contains_key("NEW_FLAG"));
}

#[test]
fn sync_copies_source_value_into_target() {
    let dir = project();

    in_project(&dir)
        .args(["sync", "API_KEY"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully synced 'API_KEY'"));

    assert_eq!(read_secrets(&dir, "ops", "kv-prod")["API_KEY"], "2");
}

#[test]
fn sync_of_unknown_name_reports_store_error() {
    let dir = project();

    in_project(&dir)
        .args(["sync", "NOPE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Failed to sync secret 'NOPE': Secret NOPE not found in source vault",
        ));
}

#[test]
fn config_dry_run_needs_apply() {
    let dir = project();
    fs::write(dir.path().join(".vaultsync.toml"), "dry_run = true\n").unwrap();

    in_project(&dir)
        .args(["sync", "NEW_FLAG"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN]"));
    assert!(!read_secrets(&dir, "ops", "kv-prod").contains_key("NEW_FLAG"));

    in_project(&dir).args(["sync", "NEW_FLAG", "--apply"]).assert().success();
    assert_eq!(read_secrets(&dir, "ops", "kv-prod")["NEW_FLAG"], "3");
}

#[test]
fn sync_all_converges_target() {
    let dir = project();

    in_project(&dir)
        .args(["sync-all", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2/2"));

    let target = read_secrets(&dir, "ops", "kv-prod");
    assert_eq!(target["DB_HOST"], "1");
    assert_eq!(target["API_KEY"], "2");
    assert_eq!(target["NEW_FLAG"], "3");
    // Target-only names are never removed.
    assert_eq!(target["LEGACY_TOKEN"], "4");
}

#[test]
fn sync_all_dry_run_changes_nothing() {
    let dir = project();
    let before = read_secrets(&dir, "ops", "kv-prod");

    in_project(&dir)
        .args(["sync-all", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN]"));

    assert_eq!(read_secrets(&dir, "ops", "kv-prod"), before);
}

#[test]
fn sync_all_with_nothing_to_do() {
    let dir = TempDir::new().unwrap();
    write_vault(&dir, "ops", "kv-dev", &[("DB_HOST", "1")]);
    write_vault(&dir, "ops", "kv-prod", &[("DB_HOST", "1")]);

    in_project(&dir)
        .args(["sync-all", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to sync"));
}

// ---------------------------------------------------------------------------
// Edit
// ---------------------------------------------------------------------------

#[test]
fn edit_writes_value_into_target() {
    let dir = project();

    in_project(&dir)
        .args(["edit", "LEGACY_TOKEN", "fresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully updated 'LEGACY_TOKEN'"));

    assert_eq!(read_secrets(&dir, "ops", "kv-prod")["LEGACY_TOKEN"], "fresh");
}

#[test]
fn edit_reads_piped_value() {
    let dir = project();

    in_project(&dir)
        .args(["edit", "NEW"])
        .write_stdin("piped-value\n")
        .assert()
        .success();

    assert_eq!(read_secrets(&dir, "ops", "kv-prod")["NEW"], "piped-value");
}

#[test]
fn edit_rejects_empty_value() {
    let dir = project();

    in_project(&dir)
        .args(["edit", "DB_HOST"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty value"));

    assert_eq!(read_secrets(&dir, "ops", "kv-prod")["DB_HOST"], "1");
}

#[test]
fn edit_dry_run_does_not_write() {
    let dir = project();

    in_project(&dir)
        .args(["edit", "API_KEY", "2", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN]"))
        .stdout(predicate::str::contains("different → match"));

    assert_eq!(read_secrets(&dir, "ops", "kv-prod")["API_KEY"], "9");
}

// ---------------------------------------------------------------------------
// Export / import
// ---------------------------------------------------------------------------

#[test]
fn export_writes_json_document() {
    let dir = project();

    in_project(&dir)
        .args(["export", "--output", "prod.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 3 secrets"));

    let doc: Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("prod.json")).unwrap()).unwrap();
    assert_eq!(doc["vault_name"], "kv-prod");
    assert_eq!(doc["secrets"]["LEGACY_TOKEN"], "4");
    assert_eq!(doc["exported_by"], "vaultsync");
    assert!(doc["export_date"].is_string());
    assert!(doc["metadata"].is_object());
}

#[test]
fn export_refuses_store_directory() {
    let dir = project();

    in_project(&dir)
        .args(["export", "--output", "vaults/ops/kv-prod.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing"));
}

#[test]
fn import_reports_not_implemented() {
    let dir = project();
    in_project(&dir)
        .args(["export", "--vault", "kv-dev", "--output", "dev.json"])
        .assert()
        .success();

    in_project(&dir)
        .args(["import", "dev.json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("3 secrets found"))
        .stderr(predicate::str::contains("not implemented"));

    // Nothing was written into the target.
    assert!(!read_secrets(&dir, "ops", "kv-prod").contains_key("NEW_FLAG"));
}

#[test]
fn import_rejects_malformed_file() {
    let dir = project();
    fs::write(dir.path().join("bad.json"), r#"{"vault_name": "x"}"#).unwrap();

    in_project(&dir)
        .args(["import", "bad.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid import file"));
}

// ---------------------------------------------------------------------------
// Audit and completions
// ---------------------------------------------------------------------------

#[test]
fn audit_records_writes_without_values() {
    let dir = project();
    in_project(&dir).args(["sync", "API_KEY"]).assert().success();
    in_project(&dir).args(["edit", "LEGACY_TOKEN", "s3cr3t-value"]).assert().success();

    in_project(&dir)
        .arg("audit")
        .assert()
        .success()
        .stdout(predicate::str::contains("sync"))
        .stdout(predicate::str::contains("edit"))
        .stdout(predicate::str::contains("kv-prod"))
        .stdout(predicate::str::contains("s3cr3t-value").not());

    assert!(Path::new(&dir.path().join("vaults").join("audit.db")).exists());
}

#[test]
fn audit_can_be_disabled() {
    let dir = project();
    fs::write(dir.path().join(".vaultsync.toml"), "audit = false\n").unwrap();
    in_project(&dir).args(["sync", "API_KEY"]).assert().success();

    assert!(!dir.path().join("vaults").join("audit.db").exists());
}

#[test]
fn completions_generate_script() {
    vaultsync()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vaultsync"));
}
