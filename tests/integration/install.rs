use cpm_cli::test_utils::PackageFixture;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

use crate::common::TestEnv;

#[test]
fn test_install_directory_with_overrides() {
    let env = TestEnv::new();
    env.write_package(&PackageFixture::demo());

    env.cpm()
        .args(["install", "demo", "--set", "environment=prod", "--set", "name=demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Submitted 1 document(s) as release"));

    let state = env.state();
    assert_eq!(state.as_array().unwrap().len(), 1);
    assert_eq!(state[0]["name"], "demo");
    assert_eq!(state[0]["colonyId"], "");
}

#[test]
fn test_install_artifact() {
    let env = TestEnv::new();
    env.write_package(&PackageFixture::demo());
    env.cpm().args(["pack", "demo"]).assert().success();

    env.cpm()
        .args(["install", "demo-0.1.0.cpm", "--set", "name=from-artifact"])
        .assert()
        .success();

    assert_eq!(env.state()[0]["name"], "from-artifact");
}

#[test]
fn test_reinstall_replaces_release() {
    let env = TestEnv::new();
    env.write_package(
        &PackageFixture::new("web").template("spec.json", r#"{"name": "web", "colonyId": "{{ Values.colonyId }}"}"#),
    );

    env.cpm().args(["install", "web", "--colonyid", "first"]).assert().success();
    env.cpm().args(["install", "web", "--colonyid", "second"]).assert().success();

    let state = env.state();
    assert_eq!(state.as_array().unwrap().len(), 1);
    assert_eq!(state[0]["colonyId"], "second");
}

/// Accept one HTTP request, answer `status`, and return the raw request.
fn one_shot_server(status: &'static str) -> (u16, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).unwrap();
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap()))
                    .unwrap_or(0);
                if raw.len() >= end + 4 + length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        let body = r#"{"status":"submitted"}"#;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
        String::from_utf8_lossy(&raw).to_string()
    });
    (port, handle)
}

#[test]
fn test_install_with_http_submitter() {
    let env = TestEnv::new();
    env.write_package(&PackageFixture::demo());
    let (port, server) = one_shot_server("200 OK");

    env.cpm()
        .args([
            "install",
            "demo",
            "--submitter",
            "http",
            "--host",
            "127.0.0.1",
            "--port",
            &port.to_string(),
            "--colonyid",
            "colony-1",
            "--prvkey",
            &"11".repeat(32),
        ])
        .assert()
        .success();

    let request = server.join().unwrap();
    let lower = request.to_ascii_lowercase();
    assert!(request.starts_with("POST /api/workflows"));
    assert!(lower.contains("x-colony-id: colony-1"));
    assert!(lower.contains("x-colony-signature: "));
    assert!(request.contains("\"env\": \"DEV\""));
}

#[test]
fn test_http_rejection_fails_install() {
    let env = TestEnv::new();
    env.write_package(&PackageFixture::demo());
    let (port, server) = one_shot_server("500 Internal Server Error");

    env.cpm()
        .args(["install", "demo", "--submitter", "http", "--host", "127.0.0.1", "--port", &port.to_string()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Submission of document 0 failed"))
        .stderr(predicate::str::contains("500"));

    server.join().unwrap();
    assert!(!env.home().join("state.json").exists());
}

#[test]
fn test_submitter_from_config_file() {
    let env = TestEnv::new();
    env.write_package(&PackageFixture::demo());
    let (port, server) = one_shot_server("200 OK");

    std::fs::create_dir_all(env.home()).unwrap();
    std::fs::write(
        env.home().join("config.toml"),
        format!("[colony]\nhost = \"127.0.0.1\"\nport = {port}\ncolony_id = \"from-config\"\nsubmitter = \"http\"\n"),
    )
    .unwrap();

    env.cpm().args(["install", "demo"]).assert().success();

    let request = server.join().unwrap().to_ascii_lowercase();
    assert!(request.contains("x-colony-id: from-config"));
    assert!(!request.contains("x-colony-signature"));
}
