//! `pruio` binary behaviour that needs a real process.

use std::process::Command;

#[test]
fn missing_config_file_is_reported() {
    let output = Command::new(env!("CARGO_BIN_EXE_pruio"))
        .args(["--simulate", "--config", "/nonexistent/pruio.toml"])
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("pruio failed"), "stderr: {stderr}");
    assert!(stderr.contains("/nonexistent/pruio.toml"), "stderr: {stderr}");
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("pruio.toml");
    std::fs::write(&path, "[simulation]\ntick_us = 0\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_pruio"))
        .arg("--simulate")
        .arg("--config")
        .arg(&path)
        .env_remove("RUST_LOG")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tick_us"), "stderr: {stderr}");
}
