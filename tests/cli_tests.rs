//! E2E tests for site-probe CLI

#![allow(deprecated)] // cargo_bin deprecation - will update when assert_cmd stabilizes replacement

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn site_probe() -> Command {
    Command::cargo_bin("site-probe").unwrap()
}

fn write_registry(file: &Path, base: &str) {
    let yaml = format!(
        r#"meta:
  created: '2024-05-01'
  last_probed: null
  tool: site-probe
  total_endpoints: 3
endpoints:
- id: 1
  region: 77
  base_address: {base}/one/
  name: First
- id: 2
  region: 78
  base_address: {base}/two/
- id: 3
  region: 5
  base_address: {base}/three/
  has_challenge: true
"#
    );
    fs::write(file, yaml).unwrap();
}

#[test]
fn test_help() {
    site_probe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("challenge"))
        .stdout(predicate::str::contains("interface"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn test_version() {
    site_probe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("site-probe"));
}

#[test]
fn test_challenge_help() {
    site_probe()
        .args(["challenge", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--regions"))
        .stdout(predicate::str::contains("--workers"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--proxy-host"));
}

#[test]
fn test_challenge_file_not_found() {
    site_probe()
        .args(["challenge", "nonexistent.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_config_file_not_found() {
    let dir = tempdir().unwrap();
    let registry = dir.path().join("endpoints.yaml");
    write_registry(&registry, "http://127.0.0.1:9");

    site_probe()
        .args(["interface", registry.to_str().unwrap(), "--config", "missing.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config"));
}

#[test]
fn test_workers_validation() {
    site_probe()
        .args(["challenge", "--workers", "0", "endpoints.yaml"])
        .assert()
        .failure();
}

#[test]
fn test_proxy_needs_port() {
    site_probe()
        .args(["challenge", "--proxy-host", "10.0.0.1", "endpoints.yaml"])
        .assert()
        .failure();
}

#[test]
fn test_init_creates_registry() {
    let dir = tempdir().unwrap();
    let output = dir.path().join("endpoints.yaml");

    site_probe()
        .args(["init", "-o", output.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"file\""));

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("base_address: https://example.com/"));
    assert!(content.contains("total_endpoints: 1"));

    site_probe()
        .args(["init", "-o", output.to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("file_exists"));
}

#[test]
fn test_nothing_selected() {
    let dir = tempdir().unwrap();
    let registry = dir.path().join("endpoints.yaml");
    write_registry(&registry, "http://127.0.0.1:9");
    let before = fs::read_to_string(&registry).unwrap();

    site_probe()
        .args(["challenge", registry.to_str().unwrap(), "--ids", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\":\"challenge\""))
        .stdout(predicate::str::contains("\"total\":3"))
        .stdout(predicate::str::contains("\"selected\":0"))
        .stdout(predicate::str::contains("\"written\":false"))
        .stderr(predicate::str::contains("No endpoints to probe"));

    assert_eq!(fs::read_to_string(&registry).unwrap(), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_challenge_updates_registry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/one/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div id=\"captcha\"></div>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/two/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<form></form>"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let registry = dir.path().join("endpoints.yaml");
    let config = dir.path().join("probe.yaml");
    write_registry(&registry, &server.uri());
    fs::write(&config, "challenge:\n  suffix: search\n").unwrap();

    let registry_arg = registry.to_str().unwrap().to_string();
    let config_arg = config.to_str().unwrap().to_string();
    let assert = tokio::task::spawn_blocking(move || {
        site_probe()
            .args(["challenge", &registry_arg, "--config", &config_arg, "--workers", "2"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("\"selected\":2"))
        .stdout(predicate::str::contains("\"ok\":2"))
        .stdout(predicate::str::contains("\"failed\":0"))
        .stdout(predicate::str::contains("\"changed\":1"))
        .stdout(predicate::str::contains("\"written\":true"))
        .stderr(predicate::str::contains("100%"));

    let content = fs::read_to_string(&registry).unwrap();
    assert!(content.contains("total_endpoints: 3"));
    assert!(content.contains("name: First"));
    assert!(content.contains("2024-05-01"));
    assert_eq!(content.matches("has_challenge: true").count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_interface_dry_run_with_malformed_regions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div id=\"show-sf\"></div>"))
        .expect(3)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let registry = dir.path().join("endpoints.yaml");
    write_registry(&registry, &server.uri());
    let before = fs::read_to_string(&registry).unwrap();

    let registry_arg = registry.to_str().unwrap().to_string();
    let assert = tokio::task::spawn_blocking(move || {
        site_probe()
            .args(["interface", &registry_arg, "--regions", "77;78", "--dry-run"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("\"selected\":3"))
        .stdout(predicate::str::contains("\"written\":false"))
        .stderr(predicate::str::contains("Dry run"));

    assert_eq!(fs::read_to_string(&registry).unwrap(), before);
}
