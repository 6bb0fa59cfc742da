//! CLI integration tests for the locpage binary
//!
//! These tests run the compiled binary against a temporary website root.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command instance for the locpage binary
#[allow(deprecated)]
fn locpage_cmd() -> Command {
    let mut cmd = Command::cargo_bin("locpage").expect("Failed to find locpage binary");
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

fn research_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("research")
}

// ============================================================================
// --help and --version
// ============================================================================

#[test]
fn test_help_lists_commands() {
    locpage_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("batch"))
        .stdout(predicate::str::contains("registry"))
        .stdout(predicate::str::contains("sitemap"));
}

#[test]
fn test_version_flag() {
    locpage_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_subcommand_fails() {
    locpage_cmd().arg("publish").assert().failure();
}

// ============================================================================
// generate / qa / score
// ============================================================================

#[test]
fn test_generate_dry_run_writes_nothing() {
    let root = TempDir::new().unwrap();

    locpage_cmd()
        .arg("--root")
        .arg(root.path())
        .arg("generate")
        .arg("Indira Nagar")
        .arg("--research-dir")
        .arg(research_dir())
        .arg("--dry-run")
        .arg("--json")
        .assert()
        .stdout(predicate::str::contains("\"slug\": \"indira-nagar\""))
        .stdout(predicate::str::contains("\"certification\""));

    assert!(!root.path().join("data").exists());
    assert!(!root.path().join("app").exists());
}

#[test]
fn test_generate_writes_files_and_registry() {
    let root = TempDir::new().unwrap();

    locpage_cmd()
        .arg("--root")
        .arg(root.path())
        .arg("--quiet")
        .arg("generate")
        .arg("Koramangala")
        .arg("--research-dir")
        .arg(research_dir())
        .assert()
        .code(predicate::in_iter([0, 1]));

    assert!(root.path().join("data/locations/koramangala.ts").exists());
    assert!(root
        .path()
        .join("app/gynecologist-in-koramangala/page.tsx")
        .exists());
    assert!(root.path().join("public/sitemap-locations.xml").exists());

    locpage_cmd()
        .arg("--root")
        .arg(root.path())
        .args(["registry", "list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"slug\": \"koramangala\""));
}

#[test]
fn test_generate_invalid_location_fails() {
    let root = TempDir::new().unwrap();

    locpage_cmd()
        .arg("--root")
        .arg(root.path())
        .args(["generate", "!!!", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("research"));
}

#[test]
fn test_qa_json_reports_categories() {
    locpage_cmd()
        .args(["qa", "Indira Nagar", "--json", "--research-dir"])
        .arg(research_dir())
        .assert()
        .stdout(predicate::str::contains("\"overall_score\""))
        .stdout(predicate::str::contains("\"performance\""));
}

#[test]
fn test_score_basic_mode() {
    locpage_cmd()
        .args(["score", "Indira Nagar", "--mode", "basic", "--json", "--research-dir"])
        .arg(research_dir())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"overall_score\""));
}

// ============================================================================
// registry / sitemap / config
// ============================================================================

#[test]
fn test_registry_list_empty_root() {
    let root = TempDir::new().unwrap();

    locpage_cmd()
        .arg("--root")
        .arg(root.path())
        .args(["registry", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No locations yet"));
}

#[test]
fn test_registry_status_unknown_slug() {
    let root = TempDir::new().unwrap();

    locpage_cmd()
        .arg("--root")
        .arg(root.path())
        .args(["registry", "status", "nowhere", "active"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not in the registry"));
}

#[test]
fn test_registry_status_rejects_unknown_value() {
    locpage_cmd()
        .args(["registry", "status", "indira-nagar", "retired"])
        .assert()
        .failure();
}

#[test]
fn test_sitemap_on_empty_registry() {
    let root = TempDir::new().unwrap();

    locpage_cmd()
        .arg("--root")
        .arg(root.path())
        .arg("sitemap")
        .assert()
        .success()
        .stdout(predicate::str::contains("sitemap has no locations"));

    let sitemap =
        std::fs::read_to_string(root.path().join("public/sitemap-locations.xml")).unwrap();
    assert!(sitemap.contains("<urlset"));
}

#[test]
fn test_config_prints_effective_values() {
    locpage_cmd()
        .args(["--config", "config/locpage.toml", "config"])
        .env("LOCPAGE__OPTIMIZER__MAX_ITERATIONS", "5")
        .assert()
        .success()
        .stdout(predicate::str::contains("max_iterations = 5"));
}

#[test]
fn test_missing_config_file_fails() {
    locpage_cmd()
        .args(["--config", "does/not/exist.toml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

// ============================================================================
// batch
// ============================================================================

#[test]
fn test_batch_from_locations_file_reports_failures() {
    let root = TempDir::new().unwrap();
    let list = root.path().join("locations.txt");
    std::fs::write(&list, "# Bangalore localities\nIndira Nagar\n\n???\n").unwrap();

    locpage_cmd()
        .arg("--root")
        .arg(root.path())
        .arg("batch")
        .arg("--locations-file")
        .arg(&list)
        .arg("--research-dir")
        .arg(research_dir())
        .args(["--delay-ms", "0", "--dry-run", "--json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"slug\": \"indira-nagar\""))
        .stdout(predicate::str::contains("\"stage\": \"research\""));
}

#[test]
fn test_batch_requires_locations() {
    locpage_cmd().arg("batch").assert().failure();
}
