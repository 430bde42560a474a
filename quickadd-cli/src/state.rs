use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$QUICKADD_HOME`, or `~/.quickadd`.
pub fn quickadd_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("QUICKADD_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".quickadd"))
}

pub fn ensure_quickadd_home() -> Result<PathBuf> {
    let dir = quickadd_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_store_path() -> Result<PathBuf> {
    Ok(quickadd_home()?.join("messages.jsonl"))
}

pub fn default_outbox_path() -> Result<PathBuf> {
    Ok(quickadd_home()?.join("notifications.jsonl"))
}
