//! Integration tests for the kpi-compare binary
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const INPUT: &str = r#"{
    "metrics": [
        { "name": "DL_THROUGHPUT", "weight": 9,
          "period1": [140, 142, 145, 141, 143],
          "period2": [150, 149, 151, 148, 152] },
        { "name": "ERAB_DROP_RATE", "weight": 7,
          "period1": [1.0, 1.1, 0.9, 1.0, 1.05],
          "period2": [1.6, 1.7, 1.5, 1.65, 1.55] },
        { "name": "RRC_SETUP_SR", "weight": 8,
          "period1": [99.1, 99.2, 99.0, 99.3],
          "period2": [99.2, 99.1, 99.3, 99.0] },
        { "name": "PAGING_DISCARD", "weight": 2,
          "period1": { "mean": 0.0, "count": 96 },
          "period2": { "mean": 2.5, "count": 96, "std_dev": 0.4 } }
    ],
    "weights": { "PAGING_DISCARD": 3 }
}"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_text_report() {
    let input = write_temp(INPUT);
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kpi-compare");
    cmd.arg("--input").arg(input.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ALARM LEVEL: WARNING"))
        .stdout(predicate::str::contains("Abnormal metrics: 1 of 4"))
        .stdout(predicate::str::contains("ERAB_DROP_RATE"))
        .stdout(predicate::str::contains("confidence: high"))
        .stdout(predicate::str::contains("N/A"));
}

#[test]
fn test_json_report_parses() {
    let input = write_temp(INPUT);
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kpi-compare");
    cmd.arg("--input").arg(input.path()).arg("--format").arg("json");

    let output = cmd.output().unwrap();
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["alarm"]["alarm_level"], "warning");
    assert_eq!(parsed["alarm"]["abnormal_count"], 1);
    assert_eq!(parsed["diagnostics"][0]["change"]["name"], "ERAB_DROP_RATE");
    assert_eq!(parsed["diagnostics"][0]["confidence"], "high");
    assert_eq!(parsed["ranking"]["total_matches"], 4);

    let records = parsed["ranking"]["records"].as_array().unwrap();
    let paging = records
        .iter()
        .find(|r| r["name"] == "PAGING_DISCARD")
        .unwrap();
    assert_eq!(paging["weight"], 3.0);
    assert!(paging["percent_change"].is_null());
}

#[test]
fn test_trend_and_name_filters() {
    let input = write_temp(INPUT);
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kpi-compare");
    cmd.arg("--input")
        .arg(input.path())
        .arg("--format")
        .arg("json")
        .arg("--trend")
        .arg("up")
        .arg("--name")
        .arg("throughput");

    let output = cmd.output().unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = parsed["ranking"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "DL_THROUGHPUT");
    assert_eq!(records[0]["trend"], "up");
}

#[test]
fn test_sort_and_paging() {
    let input = write_temp(INPUT);
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kpi-compare");
    cmd.arg("--input")
        .arg(input.path())
        .arg("--format")
        .arg("json")
        .arg("--sort")
        .arg("name")
        .arg("--order")
        .arg("asc")
        .arg("--page")
        .arg("1")
        .arg("--page-size")
        .arg("2");

    let output = cmd.output().unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = parsed["ranking"]["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["PAGING_DISCARD", "RRC_SETUP_SR"]);
    assert_eq!(parsed["ranking"]["total_pages"], 2);
    assert_eq!(parsed["ranking"]["page_index"], 1);
}

#[test]
fn test_config_file() {
    let input = write_temp(INPUT);
    let config = write_temp("screening_threshold = 5.0\ntop_k = 2\n");
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kpi-compare");
    cmd.arg("--input")
        .arg(input.path())
        .arg("--config")
        .arg(config.path())
        .arg("--format")
        .arg("json");

    let output = cmd.output().unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // DL_THROUGHPUT (+5.49%) is now abnormal too
    assert_eq!(parsed["alarm"]["abnormal_count"], 2);
    assert_eq!(parsed["alarm"]["alarm_level"], "critical");
}

#[test]
fn test_invalid_alpha_fails() {
    let input = write_temp(INPUT);
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kpi-compare");
    cmd.arg("--input").arg(input.path()).arg("--alpha").arg("1.5");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("significance_alpha"));
}

#[test]
fn test_invalid_config_file_fails() {
    let input = write_temp(INPUT);
    let config = write_temp("top_k = 0\n");
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kpi-compare");
    cmd.arg("--input").arg(input.path()).arg("--config").arg(config.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("top_k"));
}

#[test]
fn test_missing_input_file() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kpi-compare");
    cmd.arg("--input").arg("/nonexistent/kpis.json");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read input file"));
}

#[test]
fn test_malformed_input() {
    let input = write_temp("{ \"metrics\": [ { \"period1\": [1, 2] } ] }");
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kpi-compare");
    cmd.arg("--input").arg(input.path());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse comparison input JSON"));
}

#[test]
fn test_zero_page_size_fails() {
    let input = write_temp(INPUT);
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kpi-compare");
    cmd.arg("--input").arg(input.path()).arg("--page-size").arg("0");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("page_size"));
}

#[test]
fn test_debug_flag_logs_to_stderr() {
    let input = write_temp(INPUT);
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kpi-compare");
    cmd.arg("--input").arg(input.path()).arg("--debug");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("ALARM LEVEL"))
        .stderr(predicate::str::contains("comparison complete"));
}

#[test]
fn test_version() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("kpi-compare");
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("kpi-compare"));
}
