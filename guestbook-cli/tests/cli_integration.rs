//! CLI integration tests for guestbook-cli.
//!
//! These tests run the actual binary and check outputs, exit codes, and the
//! persisted state file. Commands that need a server are pointed at a port
//! nobody listens on.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a Command for the guestbook binary.
fn guestbook() -> Command {
    let mut cmd = Command::cargo_bin("guestbook").unwrap();
    cmd.env_remove("GUESTBOOK_URL").env_remove("RUST_LOG");
    cmd
}

/// A server URL with nothing behind it.
fn dead_server() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    url
}

fn state_arg(dir: &TempDir) -> String {
    dir.path().join("state.json").to_str().unwrap().to_string()
}

fn write_png(path: &Path) {
    image::DynamicImage::new_rgb8(32, 32).save(path).unwrap();
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    guestbook()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Shared visitor guestbook with live updates",
        ))
        .stdout(predicate::str::contains("whoami"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("publish"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("watch"));
}

#[test]
fn test_version_displays_version() {
    guestbook()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("guestbook"));
}

#[test]
fn test_help_shows_exit_codes() {
    guestbook()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("69"))
        .stdout(predicate::str::contains("77"));
}

#[test]
fn test_publish_help_shows_options() {
    guestbook()
        .args(["publish", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("FILE"))
        .stdout(predicate::str::contains("--name"));
}

#[test]
fn test_watch_rejects_unknown_tab() {
    guestbook()
        .args(["watch", "--tab", "wallpaper"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tab"));
}

// ============================================================================
// Visitor Identity Tests
// ============================================================================

#[test]
fn test_whoami_creates_and_reuses_visitor_id() {
    let temp = TempDir::new().unwrap();
    let state = state_arg(&temp);

    let first = guestbook()
        .args(["--state-file", &state, "-q", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("visitor_"))
        .get_output()
        .stdout
        .clone();

    let second = guestbook()
        .args(["--state-file", &state, "-q", "whoami"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(first, second);

    let saved = fs::read_to_string(temp.path().join("state.json")).unwrap();
    let id = String::from_utf8(first).unwrap();
    assert!(saved.contains("guestbook_visitor_id"));
    assert!(saved.contains(id.trim()));
}

#[test]
fn test_corrupt_state_file_returns_io_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("state.json"), b"not json").unwrap();

    // Exit code 74 = EX_IOERR
    guestbook()
        .args(["--state-file", &state_arg(&temp), "whoami"])
        .assert()
        .code(74)
        .stderr(predicate::str::contains("Failed to parse state file"));
}

// ============================================================================
// Exit Code Tests
// ============================================================================

#[test]
fn test_missing_file_returns_input_error() {
    let temp = TempDir::new().unwrap();

    // Exit code 66 = EX_NOINPUT
    guestbook()
        .args(["--state-file", &state_arg(&temp), "publish", "nonexistent_file.jpg"])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_non_image_returns_data_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("notes.jpg");
    fs::write(&file, b"definitely not an image").unwrap();

    // Exit code 65 = EX_DATAERR; compression runs before anything is sent
    guestbook()
        .args([
            "--server",
            &dead_server(),
            "--state-file",
            &state_arg(&temp),
            "publish",
            file.to_str().unwrap(),
        ])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Compression failed"));
}

#[test]
fn test_publish_to_unreachable_server_returns_network_error() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("photo.png");
    write_png(&file);

    // Exit code 69 = EX_UNAVAILABLE
    guestbook()
        .args([
            "--server",
            &dead_server(),
            "--state-file",
            &state_arg(&temp),
            "publish",
            file.to_str().unwrap(),
            "--name",
            "Ana",
        ])
        .assert()
        .code(69)
        .stderr(predicate::str::contains("Network error. Please try again."));
}

#[test]
fn test_delete_on_unreachable_server_returns_network_error() {
    let temp = TempDir::new().unwrap();

    guestbook()
        .args([
            "--server",
            &dead_server(),
            "--state-file",
            &state_arg(&temp),
            "delete",
            "42",
        ])
        .assert()
        .code(69);
}

#[test]
fn test_invalid_server_url_returns_usage_error() {
    let temp = TempDir::new().unwrap();

    // Exit code 64 = EX_USAGE
    guestbook()
        .args([
            "--server",
            "not a url",
            "--state-file",
            &state_arg(&temp),
            "delete",
            "42",
        ])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("Invalid server URL"));
}
