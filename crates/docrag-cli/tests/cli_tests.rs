//! Integration tests for commands that run without external services

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Command isolated from the user's config and data directories
fn docrag_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("docrag").unwrap();
    cmd.env("DOCRAG_CONFIG", dir.path().join("config.yml"))
        .env("DOCRAG_DB", dir.path().join("chunks.sqlite"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_config_path_respects_override() {
    let dir = TempDir::new().unwrap();

    docrag_cmd(&dir)
        .arg("config")
        .arg("path")
        .assert()
        .success()
        .stdout(predicate::str::contains("config.yml"));
}

#[test]
fn test_config_show_json_reads_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.yml"),
        "chunking:\n  strategy: paragraph\n  chunk_size: 500\n",
    )
    .unwrap();

    docrag_cmd(&dir)
        .args(["--format", "json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"strategy\": \"paragraph\""))
        .stdout(predicate::str::contains("\"chunk_size\": 500"));
}

#[test]
fn test_chunk_text_file_with_paragraph_strategy() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "Paragraph one.\n\nParagraph two.").unwrap();

    docrag_cmd(&dir)
        .arg("chunk")
        .arg(&path)
        .args(["--strategy", "paragraph", "--no-token-safe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 chunks (paragraph)"))
        .stdout(predicate::str::contains("Paragraph one.\n\nParagraph two."));
}

#[test]
fn test_chunk_json_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "alpha beta gamma delta").unwrap();

    docrag_cmd(&dir)
        .args(["--format", "json", "chunk"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"strategy\": \"recursive\""))
        .stdout(predicate::str::contains("\"token_safe\": true"));
}

#[test]
fn test_unsupported_file_exits_with_code_2() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("slides.pptx");
    fs::write(&path, "not really slides").unwrap();

    docrag_cmd(&dir)
        .args(["ingest", "file"])
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Use .pdf or .txt"));
}

#[test]
fn test_unsupported_file_json_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("slides.pptx");
    fs::write(&path, "not really slides").unwrap();

    docrag_cmd(&dir)
        .args(["--format", "json", "chunk"])
        .arg(&path)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("\"exit_code\": 2"));
}

#[test]
fn test_reset_empty_store() {
    let dir = TempDir::new().unwrap();

    docrag_cmd(&dir)
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 chunks"));
}

#[test]
fn test_pages_rejects_invalid_pdf() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.pdf");
    fs::write(&path, "%PDF-garbage").unwrap();

    docrag_cmd(&dir)
        .arg("pages")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_query_requires_message() {
    let dir = TempDir::new().unwrap();

    docrag_cmd(&dir).arg("query").assert().failure();
}

#[test]
fn test_unknown_strategy_is_rejected() {
    let dir = TempDir::new().unwrap();

    docrag_cmd(&dir)
        .args(["query", "what?", "--strategy", "telepathy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("telepathy"));
}
