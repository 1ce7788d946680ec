//! CLI integration tests for the escala binary.

use std::io::Write as _;

use assert_cmd::Command;
use predicates::prelude::*;

fn spans_csv() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "start,stop,count,load").unwrap();
    writeln!(file, "0,5,10,1").unwrap();
    writeln!(file, "5,9,8,1").unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_requires_input_or_selftest() {
    Command::cargo_bin("escala")
        .unwrap()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--selftest"));
}

#[test]
fn test_csv_format_emits_table() {
    let file = spans_csv();
    Command::cargo_bin("escala")
        .unwrap()
        .arg(file.path())
        .args(["--iterations", "500", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("load,throughput"))
        .stdout(predicate::str::contains("1,2.000000"));
}

#[test]
fn test_text_format_reports_fit_fields() {
    let file = spans_csv();
    Command::cargo_bin("escala")
        .unwrap()
        .arg(file.path())
        .args(["--iterations", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gamma:"))
        .stdout(predicate::str::contains("alpha:"))
        .stdout(predicate::str::contains("beta:"))
        .stdout(predicate::str::contains("errInit:"));
}

#[test]
fn test_json_format_is_parseable() {
    let file = spans_csv();
    let output = Command::cargo_bin("escala")
        .unwrap()
        .arg(file.path())
        .args(["--iterations", "500", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert!(value["fit"]["params"].get("gamma").is_some());
}

#[test]
fn test_predictions_follow_report() {
    let file = spans_csv();
    Command::cargo_bin("escala")
        .unwrap()
        .arg(file.path())
        .args(["--iterations", "500", "--format", "csv", "--predict", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4,"));
}

#[test]
fn test_selftest_produces_report() {
    Command::cargo_bin("escala")
        .unwrap()
        .args(["--selftest", "--workers", "4", "--iterations", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gamma:"));
}

#[test]
fn test_rejects_malformed_row() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "start,stop,count,load").unwrap();
    writeln!(file, "9,3,1,1").unwrap();
    file.flush().unwrap();

    Command::cargo_bin("escala")
        .unwrap()
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 1"));
}
