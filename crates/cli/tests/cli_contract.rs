// Integration tests for the skuflow shell contract: exit codes, a single JSON
// value on stdout with --json, human summaries on stderr.
//
// Run with: cargo test -p skuflow-cli --test cli_contract -- --nocapture

use std::path::PathBuf;
use std::process::{Command, Output};

fn skuflow() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_skuflow"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("SKUFLOW_LOG").env_remove("SKUFLOW_REGION");
    cmd
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../recon/tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn run(args: &[&str]) -> Output {
    skuflow().args(args).output().expect("run skuflow")
}

fn code(output: &Output) -> i32 {
    output.status.code().expect("exit code")
}

/// Assert stdout is a single, parseable JSON value with no extra lines.
fn assert_single_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");
    serde_json::from_str(trimmed).unwrap_or_else(|e| panic!("stdout must be valid JSON.\nParse error: {}\nstdout:\n{}", e, trimmed))
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ===========================================================================
// review
// ===========================================================================

#[test]
fn review_with_discrepancies_exits_3() {
    let output = run(&["review", "--import", &fixture("us_import.csv"), "--sku-list", &fixture("us_sku_list.csv")]);
    assert_eq!(code(&output), 3, "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty(), "human mode writes nothing to stdout");
    let err = stderr(&output);
    assert!(err.contains("SKUs missing from import: 1 [M4]"), "stderr: {err}");
    assert!(err.contains("discrepancies found"));
}

#[test]
fn review_json_is_single_value() {
    let output = run(&[
        "review",
        "--region",
        "eu",
        "--import",
        &fixture("eu_import.csv"),
        "--sku-list",
        &fixture("eu_sku_list.csv"),
        "--json",
    ]);
    assert_eq!(code(&output), 3);
    let val = assert_single_json(&output);
    assert_eq!(val["meta"]["workflow"], "review");
    assert_eq!(val["meta"]["region"], "eu");
    assert_eq!(val["meta"]["match_key"], "Manufacturer Sku EU");
    assert!(val["summary"]["pattern_violations"].as_u64().unwrap() >= 1);
}

#[test]
fn review_missing_match_key_exits_4() {
    let output = run(&[
        "review",
        "--import",
        &fixture("us_import.csv"),
        "--sku-list",
        &fixture("us_sku_list.csv"),
        "--match-key",
        "Material Bank SKU",
    ]);
    assert_eq!(code(&output), 4);
    let err = stderr(&output);
    assert!(err.contains("error:") && err.contains("Material Bank SKU"), "stderr: {err}");
    assert!(err.contains("hint:"));
}

#[test]
fn review_writes_sheets() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("review.xlsx");
    let output = run(&[
        "review",
        "--import",
        &fixture("us_import.csv"),
        "--sku-list",
        &fixture("us_sku_list.csv"),
        "-o",
        out.to_str().unwrap(),
    ]);
    assert_eq!(code(&output), 3);
    assert!(out.exists(), "stderr: {}", stderr(&output));
}

// ===========================================================================
// maintenance
// ===========================================================================

#[test]
fn retire_json_reports_final_results() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("retire.csv");
    let output = run(&[
        "retire",
        "--export",
        &fixture("retire_export.csv"),
        "--ticket",
        &fixture("retire_ticket.csv"),
        "--initials",
        "LL",
        "--ticket-id",
        "4521",
        "--json",
        "-o",
        out.to_str().unwrap(),
    ]);
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    let val = assert_single_json(&output);
    assert_eq!(val["meta"]["workflow"], "retire");
    assert_eq!(val["transitions"][0]["sku"], "SKU1");

    let final_csv = dir.path().join("retire.Final_Results.csv");
    let content = std::fs::read_to_string(&final_csv).unwrap();
    assert!(content.contains("Ticket 4521, Retired - LL"));
    assert!(dir.path().join("retire.ReassignPrimaryChild.csv").exists());
}

#[test]
fn retire_blank_initials_is_usage_error() {
    let output = run(&[
        "retire",
        "--export",
        &fixture("retire_export.csv"),
        "--ticket",
        &fixture("retire_ticket.csv"),
        "--initials",
        "  ",
    ]);
    assert_eq!(code(&output), 2);
    let err = stderr(&output);
    assert!(err.contains("initials must not be blank"), "stderr: {err}");
    assert!(err.contains("hint:  pass --initials"), "stderr: {err}");
}

#[test]
fn retire_without_initials_is_rejected_by_clap() {
    let output = run(&["retire", "--export", &fixture("retire_export.csv"), "--ticket", &fixture("retire_ticket.csv")]);
    assert_eq!(code(&output), 2);
}

#[test]
fn visibility_summary_on_stderr() {
    let output = run(&["visibility", "--export", &fixture("catalog_export.csv"), "--ticket", &fixture("catalog_ticket.csv")]);
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("Final Results: 4 row(s)"), "stderr: {err}");
}

#[test]
fn filter_with_unknown_column_exits_4() {
    let dir = tempfile::tempdir().unwrap();
    let filter = dir.path().join("filter.csv");
    std::fs::write(&filter, "Vendor Code\nV1\n").unwrap();
    let output = run(&["filter", "--main", &fixture("catalog_export.csv"), "--filter", filter.to_str().unwrap()]);
    assert_eq!(code(&output), 4);
    assert!(stderr(&output).contains("Vendor Code"));
}

#[test]
fn filter_by_family_json() {
    let output = run(&[
        "filter",
        "--main",
        &fixture("catalog_export.csv"),
        "--filter",
        &fixture("catalog_ticket.csv"),
        "--by-family",
        "--json",
    ]);
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    let val = assert_single_json(&output);
    assert_eq!(val["meta"]["workflow"], "filter");
    assert!(val["sheets"][0]["table"]["rows"].as_array().unwrap().len() >= 2);
}

#[test]
fn unsupported_input_format_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("export.parquet");
    std::fs::write(&export, "x").unwrap();
    let output = run(&["primary-child", "--export", export.to_str().unwrap(), "--ticket", &fixture("catalog_ticket.csv")]);
    assert_eq!(code(&output), 2);
    assert!(stderr(&output).contains("unsupported file format"));
}

#[test]
fn missing_input_file_exits_2() {
    let output = run(&["primary-child", "--export", "/nonexistent/export.csv", "--ticket", &fixture("catalog_ticket.csv")]);
    assert_eq!(code(&output), 2);
}

// ===========================================================================
// config
// ===========================================================================

#[test]
fn config_validate_builtins() {
    let output = run(&["config", "validate", "--json"]);
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    let val = assert_single_json(&output);
    let checks = val.as_array().unwrap();
    assert_eq!(checks.len(), 2);
    assert!(checks.iter().all(|c| c["valid"] == true));
}

#[test]
fn config_validate_rejects_bad_pattern() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    let source = std::fs::read_to_string(fixture("custom_region.toml")).unwrap();
    std::fs::write(&path, format!("{source}\n[[review.patterns]]\nfield = \"Batch Number\"\npattern = \"(unclosed\"\n")).unwrap();

    let output = run(&["config", "validate", path.to_str().unwrap()]);
    assert_eq!(code(&output), 6);
    assert!(stderr(&output).contains("invalid:"));
}

#[test]
fn config_show_prints_builtin_toml() {
    let output = run(&["config", "show", "--region", "eu"]);
    assert_eq!(code(&output), 0);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Manufacturer Sku EU"));
}

#[test]
fn bad_region_config_exits_6() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "region = \"mars\"\n").unwrap();
    let output = run(&[
        "primary-child",
        "--region-config",
        path.to_str().unwrap(),
        "--export",
        &fixture("catalog_export.csv"),
        "--ticket",
        &fixture("catalog_ticket.csv"),
    ]);
    assert_eq!(code(&output), 6);
}
