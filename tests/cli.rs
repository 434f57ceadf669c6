use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("chatgate").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: chatgate"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("--env-file <ENV_FILE>"))
        .stdout(predicate::str::contains("--model <MODEL>"))
        .stdout(predicate::str::contains("--help"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_cli_start_help() {
    let mut cmd = Command::cargo_bin("chatgate").unwrap();
    cmd.arg("start")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: chatgate start"))
        .stdout(predicate::str::contains("<APP>"))
        .stdout(predicate::str::contains("docs"))
        .stdout(predicate::str::contains("nutritionist"))
        .stdout(predicate::str::contains("--host <HOST>"))
        .stdout(predicate::str::contains("--port <PORT>"))
        .stdout(predicate::str::contains("--static-dir <STATIC_DIR>"));
}

#[test]
fn test_cli_chat_help() {
    let mut cmd = Command::cargo_bin("chatgate").unwrap();
    cmd.arg("chat")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: chatgate chat"))
        .stdout(predicate::str::contains("<APP>"));
}

#[test]
fn test_cli_no_command() {
    // Running without a command should show usage
    let mut cmd = Command::cargo_bin("chatgate").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage: chatgate"));
}

#[test]
fn test_cli_rejects_unknown_app() {
    let mut cmd = Command::cargo_bin("chatgate").unwrap();
    cmd.arg("start")
        .arg("weather")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'weather'"));
}

#[test]
fn test_cli_fails_without_api_key() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("chatgate").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("OPENAI_API_KEY")
        .arg("--env-file")
        .arg(dir.path().join("missing.env"))
        .arg("chat")
        .arg("nutritionist")
        .assert()
        .failure()
        .stderr(predicate::str::contains("OPENAI_API_KEY is not set"));
}

#[test]
fn test_cli_rejects_zero_top_k() {
    let mut cmd = Command::cargo_bin("chatgate").unwrap();
    cmd.arg("--top-k")
        .arg("0")
        .arg("chat")
        .arg("docs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value '0'"))
        .stderr(predicate::str::contains("--top-k"));
}
