//! CLI end-to-end tests.

#![allow(clippy::expect_used)]

mod common;

use assert_cmd::Command;
use common::{full_chunks, write_monolith, write_sidecar};
use predicates::prelude::*;
use tempfile::TempDir;

fn planqa() -> Command {
    Command::cargo_bin("planqa-rs").expect("binary")
}

#[test]
fn test_usage_error_without_plan() {
    planqa()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--plan"));
}

#[test]
fn test_unknown_mode_is_usage_error() {
    let temp = TempDir::new().expect("tempdir");
    let plan = temp.path().join("plan.pdf");
    std::fs::write(&plan, b"%PDF-1.4").expect("plan");
    planqa()
        .arg("--plan")
        .arg(&plan)
        .arg("--mode")
        .arg("staging")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unknown mode"));
}

#[test]
fn test_unknown_provider_is_usage_error() {
    let temp = TempDir::new().expect("tempdir");
    let plan = temp.path().join("plan.pdf");
    std::fs::write(&plan, b"%PDF-1.4").expect("plan");
    planqa()
        .arg("--plan")
        .arg(&plan)
        .arg("--ingestion")
        .arg("ocr")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_full_run_exits_zero() {
    let temp = TempDir::new().expect("tempdir");
    let plan = temp.path().join("plan.pdf");
    std::fs::write(&plan, b"%PDF-1.4 plan").expect("plan");
    write_sidecar(&plan, &full_chunks());
    let monolith = write_monolith(temp.path());

    planqa()
        .arg("--plan")
        .arg(&plan)
        .arg("--questionnaire")
        .arg(&monolith)
        .arg("--artifacts-dir")
        .arg(temp.path().join("artifacts"))
        .arg("--max-workers")
        .arg("4")
        .assert()
        .success()
        .stdout(predicate::str::contains("Puntaje macro"));

    assert!(temp.path().join("artifacts/manifest.json").is_file());
}

#[test]
fn test_json_summary_output() {
    let temp = TempDir::new().expect("tempdir");
    let plan = temp.path().join("plan.pdf");
    std::fs::write(&plan, b"%PDF-1.4 plan").expect("plan");
    write_sidecar(&plan, &full_chunks());
    let monolith = write_monolith(temp.path());

    let output = planqa()
        .arg("--plan")
        .arg(&plan)
        .arg("--questionnaire")
        .arg(&monolith)
        .arg("--artifacts-dir")
        .arg(temp.path().join("artifacts"))
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let summary: serde_json::Value =
        serde_json::from_slice(&output).expect("summary json");
    assert!(summary["macro_score"].is_number());
    assert_eq!(summary["cluster_scores"].as_array().expect("clusters").len(), 4);
}

#[test]
fn test_missing_sidecar_fails() {
    let temp = TempDir::new().expect("tempdir");
    let plan = temp.path().join("plan.pdf");
    std::fs::write(&plan, b"%PDF-1.4").expect("plan");
    let monolith = write_monolith(temp.path());

    planqa()
        .arg("--plan")
        .arg(&plan)
        .arg("--questionnaire")
        .arg(&monolith)
        .arg("--artifacts-dir")
        .arg(temp.path().join("artifacts"))
        .assert()
        .failure();
}
