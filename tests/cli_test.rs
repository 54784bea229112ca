//! End-to-end tests for the installer binary's exit posture
//!
//! A failure before the workflow starts must still print its message and
//! hold for an explicit acknowledgment before the process terminates.

use std::io::Write;
use std::process::{Command, Stdio};

fn installer() -> Command {
    Command::new(env!("CARGO_BIN_EXE_codexec-installer"))
}

#[test]
fn config_error_pauses_before_exit() {
    let scratch = tempfile::tempdir().unwrap();
    let bad_config = scratch.path().join("installer.toml");
    std::fs::write(&bad_config, "install_dir = [not valid toml").unwrap();

    let mut child = installer()
        .arg("--config")
        .arg(&bad_config)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.as_mut().unwrap().write_all(b"\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to parse config file"));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Press Enter to exit"));
}

#[test]
fn config_error_with_yes_skips_the_pause() {
    let scratch = tempfile::tempdir().unwrap();
    let bad_config = scratch.path().join("installer.toml");
    std::fs::write(&bad_config, "install_dir = [not valid toml").unwrap();

    let output = installer()
        .arg("--yes")
        .arg("--config")
        .arg(&bad_config)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("Press Enter to exit"));
}
