use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn write_document(content: &str) -> (TempDir, std::path::PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("spells.dice");
    fs::write(&path, content).unwrap();
    (temp_dir, path)
}

#[test]
fn test_cli_run_simple_document() {
    let (_dir, path) = write_document(
        r#"
Greatsword: 2d6 + 3
Dagger: d4
"#,
    );

    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("run").arg(&path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Greatsword"))
        .stdout(predicate::str::contains("Dagger"))
        .stdout(predicate::str::contains("2.5"));
}

#[test]
fn test_cli_run_with_parameter_override() {
    let (_dir, path) = write_document(
        r#"
[min=1][max=9] level ? Slot level = 1
Magic Missile: (3 + lvl1)(1d4 + 1)
"#,
    );

    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("run").arg(&path).arg("--param").arg("level=3");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Magic Missile"))
        .stdout(predicate::str::contains("17.5"));
}

#[test]
fn test_cli_run_json() {
    let (_dir, path) = write_document("Coin: d2\n");

    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    let output = cmd.arg("run").arg(&path).arg("--json").output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["results"][0]["name"], "Coin");
    assert_eq!(json["results"][0]["mean"], 1.5);
    assert_eq!(json["errors"], serde_json::json!([]));
}

#[test]
fn test_cli_run_histogram() {
    let (_dir, path) = write_document("Coin: d2\n");

    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("run").arg(&path).arg("--histogram");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("50.00%"))
        .stdout(predicate::str::contains("█"));
}

#[test]
fn test_cli_run_reports_errors_but_prints_results() {
    let (_dir, path) = write_document(
        r#"
Good: d6
Bad: 1 / 0
"#,
    );

    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("run").arg(&path);

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("Good"))
        .stderr(predicate::str::contains("Division by zero"));
}

#[test]
fn test_cli_run_bundle() {
    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("run").arg("--bundle").arg("example");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Magic Missile"))
        .stdout(predicate::str::contains("Fireball"));
}

#[test]
fn test_cli_run_unknown_bundle() {
    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("run").arg("--bundle").arg("sorcerer");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_cli_run_missing_file() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("run").arg(temp_dir.path().join("nope.dice"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_cli_run_invalid_parameter() {
    let (_dir, path) = write_document("Coin: d2\n");

    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("run").arg(&path).arg("-p").arg("level=high");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("expected an integer"));
}

#[test]
fn test_cli_run_requires_a_source() {
    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("run");

    cmd.assert().failure();
}

#[test]
fn test_cli_show_document() {
    let (_dir, path) = write_document(
        r#"
[min=1][max=20] level ? Character level = 5
bonus = 2
Bolt: lvl1[2]d6 + bonus
"#,
    );

    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("show").arg(&path);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Character level"))
        .stdout(predicate::str::contains("definitions (1):"))
        .stdout(predicate::str::contains("formulas (1):"));
}

#[test]
fn test_cli_list_bundles() {
    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("list");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Example"))
        .stdout(predicate::str::contains("D&D 5e Wizard"));
}
