use assert_cmd::Command;
use std::fs;

// Binary-level startup behavior: everything here fails (or prints) before
// any terminal state is touched, so no PTY is needed.

#[test]
fn missing_file_is_a_fatal_startup_error() {
    let output = Command::cargo_bin("retype")
        .unwrap()
        .arg("/definitely/not/here.txt")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot open"), "stderr was: {stderr}");
    assert!(stderr.contains("/definitely/not/here.txt"));
}

#[test]
fn no_arguments_prints_usage() {
    let output = Command::cargo_bin("retype").unwrap().output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr was: {stderr}");
}

#[test]
fn refuses_to_run_without_a_tty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drill.txt");
    fs::write(&path, "some practice text\n").unwrap();

    let output = Command::cargo_bin("retype")
        .unwrap()
        .arg(&path)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("stdin must be a tty"), "stderr was: {stderr}");
}

#[test]
fn version_flag_reports_the_crate() {
    let output = Command::cargo_bin("retype")
        .unwrap()
        .arg("--version")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("retype"));
}
