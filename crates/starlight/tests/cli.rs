//! CLI integration tests.

use std::net::TcpListener;
use std::process::Command;

fn starlight() -> Command {
    Command::new(env!("CARGO_BIN_EXE_starlight"))
}

#[test]
fn test_version_flag() {
    let output = starlight()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("starlight"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_lists_options() {
    let output = starlight()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in ["--host", "--port", "--config", "--debug"] {
        assert!(stdout.contains(flag), "help is missing {flag}");
    }
}

#[test]
fn test_missing_config_file_fails() {
    let output = starlight()
        .args(["--config", "/nonexistent/starlight.yaml"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("starlight.yaml"));
}

#[test]
fn test_invalid_port_rejected() {
    let output = starlight()
        .args(["--port", "not-a-port"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_loaded_configuration_is_logged() {
    // Hold the port so the server exits right after startup.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("starlight.yaml");
    std::fs::write(&path, format!("host: 127.0.0.1\nport: {port}\n")).unwrap();

    let output = starlight()
        .arg("--config")
        .arg(&path)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Loaded configuration"), "stderr: {stderr}");
    assert!(stderr.contains("starlight.yaml"));
    drop(listener);
}
