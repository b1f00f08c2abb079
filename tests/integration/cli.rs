//! Integration tests for the zendesk-export binary

use assert_cmd::Command;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("zendesk-export").unwrap();
    cmd.env_remove("ZENDESK_URL")
        .env_remove("ZENDESK_EMAIL")
        .env_remove("ZENDESK_TOKEN")
        .env_remove("LOG_FORMAT");
    cmd
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_lists_commands() {
    let output = cmd().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = stdout_of(&output);
    for command in ["export", "seed", "comments", "status"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_seed_then_status() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("log.txt");

    cmd()
        .args(["--log-file", log.to_str().unwrap(), "seed", "--start-time", "2023-11-14"])
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(&log).unwrap(), "1699920000\n");

    let output = cmd()
        .args(["--log-file", log.to_str().unwrap(), "--output-format", "json", "status"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_str(stdout_of(&output).trim()).unwrap();
    assert_eq!(value["cursor"], 1699920000);
    assert_eq!(value["resumes_at"], "2023-11-14T00:00:00+00:00");
}

#[test]
fn test_seed_refuses_existing_log_without_force() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("log.txt");
    std::fs::write(&log, "100\n").unwrap();

    cmd()
        .args(["--log-file", log.to_str().unwrap(), "seed", "--start-time", "200"])
        .assert()
        .failure()
        .code(1);

    cmd()
        .args(["--log-file", log.to_str().unwrap(), "seed", "--start-time", "200", "--force"])
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(&log).unwrap(), "100\n200\n");
}

#[test]
fn test_status_without_log_fails() {
    let dir = TempDir::new().unwrap();
    cmd()
        .args(["--log-file", dir.path().join("log.txt").to_str().unwrap(), "status"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_export_without_credentials_fails() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("log.txt");
    std::fs::write(&log, "1700000000\n").unwrap();

    let output = cmd()
        .current_dir(dir.path())
        .args(["--log-file", log.to_str().unwrap(), "export"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ZENDESK_URL"));
}

fn run_export(server_uri: String, dir: &Path) -> std::process::Output {
    let log = dir.join("log.txt");
    let out = dir.join("zendump.csv");
    cmd()
        .env("ZENDESK_URL", format!("{server_uri}/api/v2"))
        .env("ZENDESK_EMAIL", "agent@acme.com")
        .env("ZENDESK_TOKEN", "secret-token")
        .args([
            "--log-file",
            log.to_str().unwrap(),
            "export",
            "--output",
            out.to_str().unwrap(),
        ])
        .output()
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/exports/tickets.json"))
        .and(query_param("start_time", "1700000000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "field_headers": {"id": "Id", "subject": "Subject"},
            "results": [{"id": 7, "subject": "Printer on fire"}],
            "end_time": 1700000100
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/exports/tickets.json"))
        .and(query_param("start_time", "1700000100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [],
            "end_time": ""
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("log.txt"), "1700000000\n").unwrap();

    let uri = server.uri();
    let dir_path = dir.path().to_path_buf();
    let output = tokio::task::spawn_blocking(move || run_export(uri, &dir_path))
        .await
        .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Starting ZenDesk ticket pull."));
    assert!(stdout.contains("Reached most current ticket."));

    assert_eq!(
        std::fs::read_to_string(dir.path().join("zendump.csv")).unwrap(),
        "\"id\"~\"subject\"\n\"7\"~\"Printer on fire\"\n"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join("log.txt")).unwrap(),
        "1700000000\n1700000100\n"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_export_too_recent_exits_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/exports/tickets.json"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("log.txt"), "1700000000\n").unwrap();

    let uri = server.uri();
    let dir_path = dir.path().to_path_buf();
    let output = tokio::task::spawn_blocking(move || run_export(uri, &dir_path))
        .await
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("Start time is too recent"));
}
