use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn shx_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("shx");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let docs_dir = root.join("docs");
    fs::create_dir_all(&docs_dir).unwrap();
    fs::write(
        docs_dir.join("batch1.json"),
        r#"[{"a": 1}, {"a": "x"}, {"a": 1, "b": true}]"#,
    )
    .unwrap();
    fs::write(
        docs_dir.join("batch2.jsonl"),
        "{\"a\": 2, \"items\": [{\"x\": 1}, {\"x\": 2}, {\"x\": 3}, {\"x\": 4, \"late\": 1}]}\n",
    )
    .unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/shx.sqlite"

[inference]
sample_size = 30
array_sample_cap = 3
"#,
        root.display()
    );

    let config_path = config_dir.join("shx.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_shx(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = shx_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run shx binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn docs(config_path: &Path, name: &str) -> String {
    config_path
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("docs")
        .join(name)
        .display()
        .to_string()
}

/// Parse the `latest schema version: N` line printed by `shx ingest`.
fn latest_version(ingest_stdout: &str) -> i64 {
    ingest_stdout
        .lines()
        .find_map(|l| l.trim().strip_prefix("latest schema version: "))
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| panic!("no latest version in output:\n{}", ingest_stdout))
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_shx(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_shx(&config_path, &["init"]);
    assert!(success1, "First init failed");
    let (_, _, success2) = run_shx(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_ingest_creates_first_version() {
    let (_tmp, config_path) = setup_test_env();
    run_shx(&config_path, &["init"]);

    let batch1 = docs(&config_path, "batch1.json");
    let (stdout, stderr, success) = run_shx(&config_path, &["ingest", &batch1]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("records written: 3"));
    assert!(!stdout.contains("inference failures"));

    // Background passes may race the writes and record intermediate
    // versions; the latest one always covers every record.
    let latest = latest_version(&stdout);
    assert!(latest >= 1);

    let (stdout, _, success) = run_shx(&config_path, &["show", &latest.to_string(), "--json"]);
    assert!(success);
    let snap: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(snap["version"], latest);
    assert_eq!(snap["total_samples"], 3);
    assert_eq!(snap["fields"]["a"]["present"], 3);
    assert_eq!(snap["fields"]["a"]["optional"], false);
    assert_eq!(
        snap["fields"]["a"]["types"],
        serde_json::json!(["integer", "string"])
    );
    assert_eq!(snap["fields"]["b"]["optional"], true);
    assert_eq!(snap["fields"]["b"]["types"], serde_json::json!(["boolean"]));
}

#[test]
fn test_infer_twice_is_idempotent() {
    let (_tmp, config_path) = setup_test_env();
    run_shx(&config_path, &["init"]);
    run_shx(&config_path, &["ingest", &docs(&config_path, "batch1.json")]);
    let (before, _, _) = run_shx(&config_path, &["history"]);
    assert!(before.contains("VERSION"));

    let (stdout, _, success) = run_shx(&config_path, &["infer"]);
    assert!(success);
    assert!(stdout.contains("schema unchanged"));

    let (after, _, _) = run_shx(&config_path, &["history"]);
    assert_eq!(before, after);
}

#[test]
fn test_infer_on_empty_database_is_noop() {
    let (_tmp, config_path) = setup_test_env();
    run_shx(&config_path, &["init"]);

    let (stdout, _, success) = run_shx(&config_path, &["infer"]);
    assert!(success);
    assert!(stdout.contains("schema unchanged"));

    let (stdout, _, _) = run_shx(&config_path, &["history"]);
    assert!(stdout.contains("No schema versions"));
}

#[test]
fn test_drift_and_diff() {
    let (_tmp, config_path) = setup_test_env();
    run_shx(&config_path, &["init"]);
    let (stdout, _, _) = run_shx(&config_path, &["ingest", &docs(&config_path, "batch1.json")]);
    let v1 = latest_version(&stdout);
    let (stdout, stderr, success) =
        run_shx(&config_path, &["ingest", &docs(&config_path, "batch2.jsonl")]);
    assert!(success, "ingest failed: stdout={}, stderr={}", stdout, stderr);
    let v2 = latest_version(&stdout);
    assert_eq!(v2, v1 + 1);
    let (v1s, v2s) = (v1.to_string(), v2.to_string());

    let (stdout, _, success) = run_shx(&config_path, &["diff", &v1s, &v2s, "--json"]);
    assert!(success);
    let diff: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(diff["from"], v1);
    assert_eq!(diff["to"], v2);
    assert_eq!(
        diff["added"],
        serde_json::json!(["items", "items[]", "items[].x"])
    );
    assert_eq!(diff["removed"], serde_json::json!([]));
    let changed: Vec<String> = serde_json::from_value(diff["changed"].clone()).unwrap();
    assert!(changed.contains(&"a".to_string()));

    // Only the first three array elements are profiled.
    let (stdout, _, _) = run_shx(&config_path, &["show", &v2s, "--json"]);
    assert!(!stdout.contains("items[].late"));

    // Reverse direction swaps added and removed.
    let (stdout, _, _) = run_shx(&config_path, &["diff", &v2s, &v1s, "--json"]);
    let reverse: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(reverse["removed"], diff["added"]);
    assert_eq!(reverse["added"], diff["removed"]);
}

#[test]
fn test_diff_missing_version_fails_cleanly() {
    let (_tmp, config_path) = setup_test_env();
    run_shx(&config_path, &["init"]);
    run_shx(&config_path, &["ingest", &docs(&config_path, "batch1.json")]);

    let (_, stderr, success) = run_shx(&config_path, &["diff", "1", "42"]);
    assert!(!success);
    assert!(stderr.contains("schema version 42 not found"));
}

#[test]
fn test_show_text_output() {
    let (_tmp, config_path) = setup_test_env();
    run_shx(&config_path, &["init"]);
    let (stdout, _, _) = run_shx(&config_path, &["ingest", &docs(&config_path, "batch1.json")]);
    let latest = latest_version(&stdout);

    let (stdout, _, success) = run_shx(&config_path, &["show", &latest.to_string()]);
    assert!(success);
    assert!(stdout.contains(&format!("--- Schema version {} ---", latest)));
    assert!(stdout.contains("integer, string"));
}

#[test]
fn test_stats() {
    let (_tmp, config_path) = setup_test_env();
    run_shx(&config_path, &["init"]);
    run_shx(
        &config_path,
        &["ingest", &docs(&config_path, "batch1.json"), "--source", "crm"],
    );

    let (stdout, _, success) = run_shx(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Records:     3"));
    assert!(stdout.contains("Latest:      v"));
    assert!(stdout.contains("crm"));
}

#[test]
fn test_missing_config_fails() {
    let (_, stderr, success) = run_shx(Path::new("/nonexistent/shx.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
