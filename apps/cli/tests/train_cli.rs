//! End-to-end CLI tests against the local backend.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn loraforge(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("loraforge").unwrap();
    cmd.current_dir(dir);
    cmd
}

fn write_dataset(dir: &Path) {
    let lines: String = (0..20)
        .map(|i| format!("{{\"text\": \"instruction {i}: respond with text number {i}\"}}\n"))
        .collect();
    std::fs::write(dir.join("dataset.jsonl"), lines).unwrap();
}

#[test]
fn missing_dataset_exits_with_code_one() {
    let temp = TempDir::new().unwrap();
    loraforge(temp.path())
        .args(["train", "--model", "local/test", "--dataset", "absent.jsonl", "--adapter", "my-adapter"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("dataset file not found"));
}

#[test]
fn missing_model_flag_is_a_config_error() {
    let temp = TempDir::new().unwrap();
    loraforge(temp.path())
        .args(["train", "--dataset", "dataset.jsonl", "--adapter", "my-adapter"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("--model is required"));
}

#[test]
fn unknown_profile_is_a_config_error() {
    let temp = TempDir::new().unwrap();
    write_dataset(temp.path());
    loraforge(temp.path())
        .args([
            "train", "--model", "local/test", "--dataset", "dataset.jsonl", "--adapter",
            "my-adapter", "--profile", "turbo",
        ])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("unknown profile"));
}

#[test]
fn successful_train_saves_adapter_and_checkpoints() {
    let temp = TempDir::new().unwrap();
    write_dataset(temp.path());
    loraforge(temp.path())
        .args([
            "train", "--model", "local/test", "--dataset", "dataset.jsonl", "--adapter",
            "my-adapter", "--batch-size", "1", "--epochs", "5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fine-tuning complete"));

    let adapter_dir = temp.path().join("my-adapter");
    assert!(adapter_dir.join("adapter_model.json").exists());
    assert!(adapter_dir.join("adapter_config.json").exists());
    assert!(adapter_dir.join("adapter_manifest.json").exists());
    // 20 examples, batch 1, 5 epochs => step 50 hits the checkpoint cadence.
    assert!(temp.path().join("results").join("checkpoint-50").exists());
}

#[test]
fn json_output_prints_the_manifest() {
    let temp = TempDir::new().unwrap();
    write_dataset(temp.path());
    let output = loraforge(temp.path())
        .args([
            "train", "--model", "local/test", "--dataset", "dataset.jsonl", "--adapter",
            "json-adapter", "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let manifest: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(manifest["adapter_name"], "json-adapter");
    assert_eq!(manifest["base_model"], "local/test");
}

#[test]
fn list_reports_trained_adapters() {
    let temp = TempDir::new().unwrap();
    write_dataset(temp.path());

    loraforge(temp.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No trained adapters"));

    loraforge(temp.path())
        .args(["train", "--model", "local/test", "--dataset", "dataset.jsonl", "--adapter", "listed-adapter"])
        .assert()
        .success();

    loraforge(temp.path())
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("listed-adapter"));
}

#[test]
fn config_template_feeds_back_into_train() {
    let temp = TempDir::new().unwrap();
    write_dataset(temp.path());

    loraforge(temp.path())
        .args(["config", "--output", "launch.toml", "--profile", "fast"])
        .assert()
        .success();

    loraforge(temp.path())
        .args(["train", "--config", "launch.toml", "--model", "local/test", "--adapter", "toml-adapter"])
        .assert()
        .success();

    assert!(temp.path().join("toml-adapter").join("adapter_manifest.json").exists());
}
