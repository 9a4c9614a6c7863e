use assert_cmd::Command;

#[test]
fn test_server_command_available() {
    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("server"));
}

#[test]
fn test_server_help_lists_quiet_period() {
    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("server").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicates::str::contains("--quiet-ms"))
        .stdout(predicates::str::contains("--port"));
}

#[test]
fn test_server_rejects_bad_port() {
    let mut cmd = Command::cargo_bin("dicecalc").unwrap();
    cmd.arg("server").arg("--port").arg("not-a-port");

    cmd.assert().failure();
}
