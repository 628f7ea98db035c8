//! Black-box tests for the `ra` binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn ra() -> Command {
    let mut cmd = Command::cargo_bin("ra").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn sample_prints_tables() {
    ra().args(["--sample", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CAP002 (20)"))
        .stdout(predicate::str::contains("efficiency (recovery): 58.3%"))
        .stdout(predicate::str::contains("Groups"));
}

#[test]
fn sample_writes_artifacts_and_reports() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("run");
    ra().args(["--sample", "--any-group", "--trail", "both", "--render", "json", "html", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    for f in [
        "result.json",
        "run_record.json",
        "units.csv",
        "allocations.csv",
        "summary.csv",
        "report.json",
        "report.html",
    ] {
        assert!(out.join(f).is_file(), "missing {f}");
    }
    let alloc = fs::read_to_string(out.join("allocations.csv")).unwrap();
    assert!(alloc.contains("0,CAP004,CAP002,"));
    let html = fs::read_to_string(out.join("report.html")).unwrap();
    assert!(html.contains("Efficiency (recovery): 100.0%"));
}

#[test]
fn reruns_are_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    ra().args(["--sample", "--quiet", "--out"]).arg(&a).assert().success();
    ra().args(["--sample", "--quiet", "--out"]).arg(&b).assert().success();
    for f in ["result.json", "run_record.json", "units.csv", "summary.csv"] {
        assert_eq!(fs::read(a.join(f)).unwrap(), fs::read(b.join(f)).unwrap(), "{f} differs");
    }
}

#[test]
fn validate_only_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("units.csv");
    fs::write(&input, "grupo;capacidade_instalada;demanda\nA;100;120\nA;150;100\n").unwrap();
    ra().arg("--input")
        .arg(&input)
        .arg("--validate-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: 2 unit(s) valid"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn invalid_rows_exit_2_with_findings() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.csv");
    fs::write(&input, "group,capacity,demand\ng,abc,5\n").unwrap();
    ra().arg("--input")
        .arg(&input)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Cell.InvalidNumber"));
}

#[test]
fn zero_min_allocation_is_a_config_error() {
    ra().args(["--sample", "--min-allocation", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("min_allocation"));
}

#[test]
fn argument_errors_exit_2() {
    ra().assert().code(2).stderr(predicate::str::contains("--input or --sample"));
    ra().args(["--input", "https://example.org/u.csv"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no scheme"));
    ra().args(["--input", "no/such/file.csv"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("file not found"));
    ra().args(["--sample", "--input", "x.csv"]).assert().code(2);
}

#[test]
fn bad_params_file_exit_2() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("params.json");
    fs::write(&p, r#"{"min_allocation": 5, "colour": "blue"}"#).unwrap();
    ra().args(["--sample", "--params"]).arg(&p).assert().code(2);
}
