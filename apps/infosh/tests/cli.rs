// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Drive the infosh binary end to end over piped stdin.
// Author: Lukas Bower

use std::path::Path;
use std::time::Duration;

fn infosh(stdin: &str, extra: &[&str]) -> (bool, String, String) {
    let mut cmd = assert_cmd::cargo_bin_cmd!("infosh");
    cmd.arg("--startup-delay-ms")
        .arg("0")
        .args(extra)
        .env("RUST_LOG", "warn")
        .env_remove("INFOSH_CONFIG")
        .env_remove("INFOSH_PROMPT")
        .env_remove("INFOSH_HISTORY_SIZE")
        .env_remove("INFOSH_HISTORY_DIR")
        .write_stdin(stdin)
        .timeout(Duration::from_secs(5));
    let output = cmd.output().expect("infosh should run");
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    )
}

fn history_args(dir: &Path) -> Vec<String> {
    vec![
        "--history-dir".to_owned(),
        dir.display().to_string(),
    ]
}

#[test]
fn greeting_then_help_listing() {
    let (ok, stdout, stderr) = infosh("help\n", &["--no-history"]);
    assert!(ok, "infosh failed: {stderr}");
    let banner = stdout
        .find("Hi cybernaut. this is an info terminal.")
        .expect("missing banner");
    let notice = stdout
        .find("creating new session...")
        .expect("missing session notice");
    let listing = stdout
        .find("available commands:")
        .expect("missing help listing");
    assert!(banner < notice && notice < listing, "unexpected order: {stdout:?}");
    for id in ["clear", "echo", "help", "sleep", "whoami"] {
        assert!(stdout.contains(id), "help is missing {id}: {stdout:?}");
    }
}

#[test]
fn ctrl_d_logs_out() {
    let (ok, stdout, stderr) = infosh("\x04", &["--no-history"]);
    assert!(ok, "infosh failed: {stderr}");
    assert!(stdout.contains("logout"), "missing logout: {stdout:?}");
}

#[test]
fn unknown_command_is_reported() {
    let (ok, stdout, _) = infosh("frobnicate --x\n", &["--no-history"]);
    assert!(ok);
    assert!(
        stdout.contains("command not found: frobnicate"),
        "missing error: {stdout:?}"
    );
}

#[test]
fn interrupt_stops_sleep() {
    let (ok, stdout, stderr) = infosh("sleep 60000\n\x03", &["--no-history"]);
    assert!(ok, "infosh failed: {stderr}");
    assert!(stdout.contains("^C"), "missing interrupt echo: {stdout:?}");
}

#[test]
fn history_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let args = history_args(dir.path());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let (ok, stdout, stderr) = infosh("echo hi there\n", &args);
    assert!(ok, "infosh failed: {stderr}");
    assert!(stdout.contains("hi there\r\n"), "missing echo: {stdout:?}");
    let saved = std::fs::read_to_string(dir.path().join("history.json")).unwrap();
    assert_eq!(saved, r#"["echo hi there"]"#);

    // ArrowUp recalls the previous session's line.
    let (ok, stdout, stderr) = infosh("\x1b[A\r", &args);
    assert!(ok, "infosh failed: {stderr}");
    assert_eq!(
        stdout.matches("hi there").count(),
        2,
        "recalled line not rerun: {stdout:?}"
    );
}
