//! Drives the `scholask` binary against an offline configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let docs_dir = root.join("docs");
    fs::create_dir_all(&docs_dir).unwrap();
    fs::write(
        docs_dir.join("admissions.md"),
        "# Admissions\n\nApply online through the admissions portal.\n\nApplication deadlines are in May.",
    )
    .unwrap();
    fs::write(
        docs_dir.join("housing.txt"),
        "Housing is available on campus for first-year students.",
    )
    .unwrap();
    fs::write(docs_dir.join("notes.csv"), "ignored,by,default\n").unwrap();

    let config_content = format!(
        r#"[index]
dir = "{}/data/index"
mode = "offline"

[chunking]
max_chars = 400

[retrieval]
top_k = 4
"#,
        root.display()
    );
    let config_path = config_dir.join("scholask.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_scholask(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(env!("CARGO_BIN_EXE_scholask"))
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run scholask binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_ingest_dir_and_status() {
    let (tmp, config) = setup_test_env();
    let docs = tmp.path().join("docs");

    let args = ["ingest", "state-college", "--dir", docs.to_str().unwrap()];
    let (stdout, stderr, ok) = run_scholask(&config, &args);
    assert!(ok, "ingest failed: {}", stderr);
    assert!(stdout.contains("Ingested 4 new chunks into 'state-college' (4 total)."), "{}", stdout);

    let (stdout, _, ok) = run_scholask(&config, &["status", "state-college"]);
    assert!(ok);
    assert!(stdout.contains("backend: sparse"));
    assert!(stdout.contains("chunks:  4"));
    assert!(stdout.contains("rows:    4"));

    let tenant_dir = tmp.path().join("data/index/state-college");
    assert!(tenant_dir.join("chunks.json").exists());
    assert!(tenant_dir.join("index.sparse.json").exists());
}

#[test]
fn test_ingest_text_then_search_json() {
    let (_tmp, config) = setup_test_env();

    let (_, stderr, ok) = run_scholask(
        &config,
        &[
            "ingest",
            "state-college",
            "--text",
            "Paragraph one about tuition.\n\nParagraph two about deadlines.",
            "--source-url",
            "https://state.edu/info",
        ],
    );
    assert!(ok, "ingest failed: {}", stderr);

    let args = ["search", "state-college", "deadlines", "--json"];
    let (stdout, stderr, ok) = run_scholask(&config, &args);
    assert!(ok, "search failed: {}", stderr);
    let results: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["hit"]["chunk_id"], 1);
    assert_eq!(results[0]["text"], "Paragraph two about deadlines.");
    assert_eq!(results[0]["meta"]["source_url"], "https://state.edu/info");
}

#[test]
fn test_ask_offline_extracts_with_citations() {
    let (tmp, config) = setup_test_env();
    let docs = tmp.path().join("docs");
    run_scholask(&config, &["ingest", "state-college", "--dir", docs.to_str().unwrap()]);

    let args = ["ask", "state-college", "Where is housing?"];
    let (stdout, stderr, ok) = run_scholask(&config, &args);
    assert!(ok, "ask failed: {}", stderr);
    assert!(stdout.contains("Based on available offline information for State College:"));
    assert!(stdout.contains("Sources:"));
    assert!(stdout.contains("file://"));

    let (stdout, _, ok) = run_scholask(&config, &["ask", "state-college", "housing", "--json"]);
    assert!(ok);
    let answer: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(answer["outcome"], "extracted");
    assert!(!answer["sources"].as_array().unwrap().is_empty());
}

#[test]
fn test_ask_unknown_tenant_has_no_context() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_scholask(&config, &["ask", "new-tenant", "anything", "--json"]);
    assert!(ok);
    let answer: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(answer["outcome"], "no_context");
    assert_eq!(answer["sources"].as_array().unwrap().len(), 0);
}

#[test]
fn test_search_without_index_fails() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, ok) = run_scholask(&config, &["search", "new-tenant", "tuition"]);
    assert!(!ok);
    assert!(stderr.contains("no index"), "{}", stderr);
}

#[test]
fn test_facts_for_empty_tenant() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_scholask(&config, &["facts", "new-tenant", "--limit", "2"]);
    assert!(ok);
    assert!(stdout.contains("## Overview"));
    assert!(stdout.contains("## Contact"));
    assert!(!stdout.contains("## Apply"));
    assert!(stdout.contains("Please ask about 'Overview' or check the school website."));
}

#[test]
fn test_invalid_tenant_rejected() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, ok) = run_scholask(&config, &["ingest", "../escape", "--text", "hello there"]);
    assert!(!ok);
    assert!(stderr.to_lowercase().contains("tenant"), "{}", stderr);
}

#[test]
fn test_empty_ingest_rejected() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, ok) = run_scholask(&config, &["ingest", "state-college", "--text", "   "]);
    assert!(!ok);
    assert!(stderr.contains("No content to ingest"), "{}", stderr);
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, ok) = run_scholask(&tmp.path().join("nope.toml"), &["status", "x"]);
    assert!(!ok);
    assert!(stderr.contains("Failed to read config file"));
}
