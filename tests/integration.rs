use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn cfx_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("cfx");
    path
}

const APPLE: &str = r#"{
  "cik": 320193,
  "entityName": "Apple Inc.",
  "facts": {
    "dei": {"EntityCommonStockSharesOutstanding": {"units": {"shares": [
      {"end": "2021-10-15", "val": 16406397000, "form": "10-K", "accn": "a1", "fp": "FY", "filed": "2021-10-29"}
    ]}}},
    "us-gaap": {
      "Assets": {"label": "Assets", "units": {"USD": [
        {"end": "2020-01-01", "val": 100, "form": "10-K", "accn": "a2", "fp": "FY", "filed": "2020-02-01"},
        {"end": "2020-01-01", "val": 200, "form": "10-Q", "accn": "a3", "fp": "Q1", "filed": "2020-02-02"},
        {"end": "2021-06-30", "val": 300, "form": "10-K", "accn": "a4", "fp": "FY", "filed": "2021-08-01"}
      ]}},
      "Goodwill": {"units": {"USD": [
        {"end": "2015-09-26", "val": 5116000000, "form": "10-K", "accn": "a5", "fp": "FY", "filed": "2015-10-28"}
      ]}}
    }
  }
}"#;

const STALE: &str = r#"{
  "cik": "1750",
  "entityName": "AAR CORP",
  "facts": {"us-gaap": {"Assets": {"units": {"USD": [
    {"end": "2011-05-31", "val": 1, "form": "10-K", "accn": "b1", "fp": "FY", "filed": "2011-07-01"}
  ]}}}}
}"#;

const FOREIGN: &str = r#"{
  "cik": "1000184",
  "entityName": "SAP SE",
  "facts": {"ifrs-full": {"Revenue": {"units": {"EUR": [
    {"end": "2022-12-31", "val": 30871000000, "form": "20-F", "accn": "c1", "fp": "FY", "filed": "2023-02-23"}
  ]}}}}
}"#;

const BROKEN: &str = r#"{"entityName": "No Cik Corp", "facts": {}}"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let raw_dir = root.join("data/companyfacts");
    fs::create_dir_all(&raw_dir).unwrap();
    fs::write(raw_dir.join("CIK0000320193.json"), APPLE).unwrap();
    fs::write(raw_dir.join("CIK0000001750.json"), STALE).unwrap();
    fs::write(raw_dir.join("CIK0001000184.json"), FOREIGN).unwrap();
    fs::write(raw_dir.join("CIK0000001800.json"), BROKEN).unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/cfx.sqlite"

[paths]
company_facts = "{root}/data/companyfacts"
modified_facts = "{root}/data/modified_facts"

[filter]
date_threshold = "2019-12-31"
accepted_forms = ["10-K", "10-Q", "20-F", "6-K"]
min_keys = 2

[source]
url = "http://127.0.0.1:9/companyfacts.zip"
user_agent = "test@example.com"
timeout_secs = 5
"#,
        root = root.display()
    );

    let config_path = config_dir.join("cfx.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_cfx(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = cfx_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run cfx binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_cfx(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));

    let (_, _, success2) = run_cfx(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_transform_counts() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_cfx(&config_path, &["transform", "--progress", "off"]);
    assert!(success, "transform failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("processed: 4"), "got: {}", stdout);
    assert!(stdout.contains("kept: 2"), "got: {}", stdout);
    assert!(stdout.contains("skipped: 1"), "got: {}", stdout);
    assert!(stdout.contains("errors: 1"), "got: {}", stdout);
    assert!(stdout.contains("CIK0000001800.json"));
    assert!(stdout.contains("ok"));
}

#[test]
fn test_transform_output_shape() {
    let (tmp, config_path) = setup_test_env();

    run_cfx(&config_path, &["transform", "--progress", "off"]);

    let out_dir = tmp.path().join("data/modified_facts");
    assert!(!out_dir.join("CIK0000001750.json").exists());
    assert!(!out_dir.join("CIK0000001800.json").exists());

    let text = fs::read_to_string(out_dir.join("CIK0000320193.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    let obj = doc.as_object().unwrap();
    assert_eq!(obj.len(), 3, "cik, entityName, Assets: {}", text);
    assert_eq!(doc["cik"], "0000320193");
    assert_eq!(doc["entityName"], "Apple Inc.");
    let assets = doc["Assets"].as_array().unwrap();
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0]["val"], 100);
    assert_eq!(assets[1]["val"], 300);
    assert_eq!(assets[1]["unit"], "USD");
    assert!(obj.get("Goodwill").is_none());

    let text = fs::read_to_string(out_dir.join("CIK0001000184.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["Revenue"][0]["unit"], "EUR");
    assert_eq!(doc["Revenue"][0]["form"], "20-F");
}

#[test]
fn test_transform_single_file() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_cfx(
        &config_path,
        &["transform", "--file", "CIK0000320193.json", "--progress", "off"],
    );
    assert!(success);
    assert!(stdout.contains("processed: 1"));
    assert!(stdout.contains("kept: 1"));
}

#[test]
fn test_transform_dry_run() {
    let (tmp, config_path) = setup_test_env();

    let (stdout, _, success) =
        run_cfx(&config_path, &["transform", "--dry-run", "--progress", "off"]);
    assert!(success);
    assert!(stdout.contains("dry-run"));
    assert!(stdout.contains("kept: 2"));
    assert!(!tmp.path().join("data/modified_facts").exists());
}

#[test]
fn test_load_and_get() {
    let (_tmp, config_path) = setup_test_env();

    run_cfx(&config_path, &["init"]);
    run_cfx(&config_path, &["transform", "--progress", "off"]);
    let (stdout, stderr, success) = run_cfx(&config_path, &["load"]);
    assert!(success, "load failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("loaded documents: 2"), "got: {}", stdout);

    let (stdout, _, success) = run_cfx(&config_path, &["get", "320193"]);
    assert!(success);
    let doc: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(doc["cik"], "0000320193");
    assert_eq!(doc["Assets"][0]["end"], "2020-01-01");

    // Loading again replaces rows instead of duplicating them
    let (stdout, _, _) = run_cfx(&config_path, &["load"]);
    assert!(stdout.contains("total in database: 2"), "got: {}", stdout);
}

#[test]
fn test_get_missing_document() {
    let (_tmp, config_path) = setup_test_env();

    run_cfx(&config_path, &["init"]);
    let (_, stderr, success) = run_cfx(&config_path, &["get", "999"]);
    assert!(!success);
    assert!(stderr.contains("0000000999"), "got: {}", stderr);
}

#[test]
fn test_stats() {
    let (_tmp, config_path) = setup_test_env();

    run_cfx(&config_path, &["init"]);
    run_cfx(&config_path, &["transform", "--progress", "off"]);
    run_cfx(&config_path, &["load"]);
    let (stdout, stderr, success) = run_cfx(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Documents:   2"), "got: {}", stdout);
    assert!(stdout.contains("Apple Inc."));
}

#[test]
fn test_fetch_failure_cleans_up() {
    let (tmp, config_path) = setup_test_env();

    let (_, _, success) = run_cfx(&config_path, &["fetch", "--progress", "off"]);
    assert!(!success, "fetch from a closed port should fail");
    assert!(!tmp.path().join("data/companyfacts.zip").exists());
    // The directory is reset before downloading
    let raw_dir = tmp.path().join("data/companyfacts");
    assert!(raw_dir.is_dir());
    assert_eq!(fs::read_dir(&raw_dir).unwrap().count(), 0);
}
