#![cfg(unix)]

mod common;

use common::{dx, parse_json, prepare_fixture, project_with_tools, SNAPSHOT};

#[test]
fn env_prints_an_activation_script() {
    let project = prepare_fixture("dx-env");

    let assert = dx(project.path())
        .args(["env", "--system", "x86_64-linux"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let first = stdout.lines().next().expect("first line");
    assert!(first.starts_with("export PATH='/nix/store/"));
    assert!(stdout.contains("export PIP_DISABLE_PIP_VERSION_CHECK='1'"));
    assert!(stdout.contains("export DX_SHELL=1"));
}

#[test]
fn env_failure_keeps_stdout_clean() {
    let project = project_with_tools("dx-env-fail", SNAPSHOT, &["nonexistent-tool"]);

    let assert = dx(project.path())
        .args(["env", "--system", "x86_64-linux"])
        .assert()
        .code(1);
    assert!(assert.get_output().stdout.is_empty());
}

#[test]
fn shell_runs_commands_with_the_environment() {
    let project = prepare_fixture("dx-shell-env");

    let assert = dx(project.path())
        .args([
            "shell",
            "--system",
            "x86_64-linux",
            "--",
            "sh",
            "-c",
            "echo \"$DX_SHELL:$PYTHONDONTWRITEBYTECODE\"",
        ])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert_eq!(stdout.trim(), "1:1");
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("python dev shell ready"));
}

#[test]
fn shell_exits_with_the_child_status() {
    let project = prepare_fixture("dx-shell-code");

    dx(project.path())
        .args(["shell", "--system", "x86_64-linux", "--", "sh", "-c", "exit 7"])
        .assert()
        .code(7);
}

#[test]
fn shell_path_puts_tools_first() {
    let project = project_with_tools("dx-shell-path", SNAPSHOT, &["python3Packages.black"]);

    let assert = dx(project.path())
        .args([
            "shell",
            "--system",
            "x86_64-linux",
            "--",
            "sh",
            "-c",
            "echo \"$PATH\"",
        ])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let first = stdout.trim().split(':').next().expect("first entry");
    assert!(first.starts_with("/nix/store/"));
    assert!(first.ends_with("-python3.11-black-24.4.2/bin"));
}

#[test]
fn shell_does_not_spawn_after_a_failed_activation() {
    let project = project_with_tools("dx-shell-fail", SNAPSHOT, &["nonexistent-tool"]);
    let marker = project.path().join("spawned");

    let assert = dx(project.path())
        .args(["--json", "shell", "--system", "x86_64-linux", "--", "touch"])
        .arg(&marker)
        .assert()
        .code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["reason"], "unknown_package");
    assert!(!marker.exists());
}

#[test]
fn missing_command_is_a_user_error() {
    let project = project_with_tools("dx-shell-missing", SNAPSHOT, &["python3"]);

    let assert = dx(project.path())
        .args([
            "--json",
            "shell",
            "--system",
            "x86_64-linux",
            "--",
            "dx-definitely-not-installed",
        ])
        .assert()
        .code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["reason"], "command_not_found");
}

#[test]
fn missing_command_behind_a_shell_hook_is_a_user_error() {
    let project = prepare_fixture("dx-shell-hook-missing");

    let assert = dx(project.path())
        .args([
            "--json",
            "shell",
            "--system",
            "x86_64-linux",
            "--",
            "dx-definitely-not-installed",
        ])
        .assert()
        .code(1);
    let payload = parse_json(&assert);
    assert_eq!(payload["details"]["reason"], "command_not_found");
    assert_eq!(payload["details"]["program"], "dx-definitely-not-installed");
}
