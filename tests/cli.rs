use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::cargo_bin("sgra-obs").unwrap()
}

fn reference_table() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/sgr_a_observations.tsv")
}

fn json_stdout(args: &[&str]) -> Value {
    let out = cmd()
        .arg("--table")
        .arg(reference_table())
        .arg("--json")
        .args(args)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn validate_reference_table() {
    cmd()
        .arg("--table")
        .arg(reference_table())
        .arg("validate")
        .assert()
        .success()
        .stdout(contains("table valid: 14 records, 5 citations"));
}

#[test]
fn list_radio_json_in_file_order() {
    let v = json_stdout(&["list", "--band", "radio"]);
    let rows = v.as_array().unwrap();
    assert_eq!(rows.len(), 7);
    assert!(rows.iter().all(|r| r["band"] == "radio"));
    assert_eq!(rows[0]["log10_frequency_hz"], 9.133539);
    assert_eq!(rows[6]["log10_frequency_hz"], 11.372175);
}

#[test]
fn list_accepts_band_alias() {
    cmd()
        .arg("--table")
        .arg(reference_table())
        .args(["list", "--band", "X-ray"])
        .assert()
        .success()
        .stdout(contains("18.383454"))
        .stdout(contains("Baganoff").and(contains("Falcke").not()));
}

#[test]
fn summary_reports_xray_envelope() {
    let v = json_stdout(&["summary"]);
    let xray = v
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["band"] == "xray")
        .unwrap();
    assert_eq!(xray["records"], 2);
    assert_eq!(xray["envelope"]["min_log10_luminosity_erg_s"], 33.0);
    assert_eq!(xray["envelope"]["max_log10_luminosity_erg_s"], 33.4);
}

#[test]
fn citations_are_distinct() {
    let v = json_stdout(&["citations"]);
    assert_eq!(v.as_array().unwrap().len(), 5);
}

#[test]
fn malformed_table_fails_with_row_context() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bad.tsv");
    std::fs::write(
        &path,
        "band\tlog10_frequency_hz\tlog10_luminosity_erg_s\tsource_citation\n\
         radio\t10.0\t33.0\n",
    )
    .unwrap();

    cmd()
        .arg("--table")
        .arg(&path)
        .arg("validate")
        .assert()
        .failure()
        .stderr(contains("malformed record at row 1"));
}

#[test]
fn out_of_band_frequency_fails() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bad.csv");
    std::fs::write(
        &path,
        "band,log10_frequency_hz,log10_luminosity_erg_s,source_citation\n\
         xray,17.0,33.0,Chandra\n",
    )
    .unwrap();

    cmd()
        .arg("--table")
        .arg(&path)
        .arg("validate")
        .assert()
        .failure()
        .stderr(contains("outside the X-ray range"));
}

#[test]
fn convert_then_validate_parquet() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("obs.parquet");

    cmd()
        .arg("--table")
        .arg(reference_table())
        .arg("convert")
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("wrote 14 records"));

    cmd()
        .arg("--table")
        .arg(&out)
        .arg("validate")
        .assert()
        .success()
        .stdout(contains("14 records"));
}

#[test]
fn import_legacy_uses_configured_citation() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path();
    std::fs::write(dir.join("sgr_a_observations_xray_frequency.txt"), "17.7\n18.3\n").unwrap();
    std::fs::write(dir.join("sgr_a_observations_xray_luminosity.txt"), "33.0\n33.4\n").unwrap();
    let config = dir.join("opts.json");
    std::fs::write(&config, r#"{ "legacy_citations": { "xray": "Chandra quiescent" } }"#).unwrap();
    let out = dir.join("imported.json");

    cmd()
        .arg("--config")
        .arg(&config)
        .arg("import-legacy")
        .arg(dir)
        .arg(&out)
        .assert()
        .success();

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let rows = written.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["source_citation"], "Chandra quiescent");
    assert_eq!(rows[1]["band"], "xray");
}
