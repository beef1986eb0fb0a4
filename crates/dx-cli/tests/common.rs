#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::assert::Assert;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub const SNAPSHOT: &str = "github:NixOS/nixpkgs/nixos-24.05";

const DX_VARS: [&str; 5] = [
    "DX_DESCRIPTOR",
    "DX_SYSTEM",
    "DX_RESOLVER",
    "DX_SNAPSHOT_INDEX",
    "DX_NIX_BIN",
];

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("workspace root")
        .to_path_buf()
}

pub fn snapshot_index() -> PathBuf {
    workspace_root().join("fixtures").join("snapshot_index.json")
}

pub fn fixture_descriptor() -> PathBuf {
    workspace_root()
        .join("fixtures")
        .join("python_shell")
        .join("dx.toml")
}

/// Empty scratch directory for a project.
pub fn scratch(prefix: &str) -> TempDir {
    tempfile::Builder::new()
        .prefix(prefix)
        .tempdir()
        .expect("tempdir")
}

/// Scratch project holding a copy of the Python shell fixture.
pub fn prepare_fixture(prefix: &str) -> TempDir {
    let temp = scratch(prefix);
    fs::copy(fixture_descriptor(), temp.path().join("dx.toml")).expect("copy fixture");
    temp
}

/// Scratch project whose descriptor requests exactly `tools` from `locator`.
pub fn project_with_tools(prefix: &str, locator: &str, tools: &[&str]) -> TempDir {
    let temp = scratch(prefix);
    let inputs = tools
        .iter()
        .map(|tool| format!("  \"{tool}\",\n"))
        .collect::<String>();
    let descriptor = format!(
        "[inputs]\nnixpkgs = \"{locator}\"\n\n[outputs.devShell]\nbuildInputs = [\n{inputs}]\n"
    );
    fs::write(temp.path().join("dx.toml"), descriptor).expect("write descriptor");
    temp
}

/// `dx` running in `dir` against the fixture snapshot index with a clean `DX_*` environment.
pub fn dx(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("dx");
    for var in DX_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(dir)
        .env("DX_SNAPSHOT_INDEX", snapshot_index())
        .env("NO_COLOR", "1");
    cmd
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}
