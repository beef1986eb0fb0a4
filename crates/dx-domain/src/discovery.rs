use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::descriptor::DESCRIPTOR_FILE;

pub const MISSING_DESCRIPTOR_MESSAGE: &str = "No dx.toml found in this directory or its parents";

/// Walks up from `start` to the closest directory holding a `dx.toml`.
#[must_use]
pub fn discover_descriptor_from(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(DESCRIPTOR_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

pub fn discover_descriptor() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir().context("unable to determine the working directory")?;
    Ok(discover_descriptor_from(&cwd))
}

pub fn current_descriptor() -> Result<PathBuf> {
    discover_descriptor()?.ok_or_else(|| anyhow!(MISSING_DESCRIPTOR_MESSAGE))
}
