//! Path utilities

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Convert absolute path to relative path from base
pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

/// Expand a leading `~` to the home directory (`HOME`, or `USERPROFILE` on Windows).
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"));
    match home {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Make `path` absolute against the current directory without touching the filesystem.
pub fn absolutize(path: &Path) -> Result<PathBuf> {
    let path = expand_home(path);
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().context("read current directory")?;
    Ok(cwd.join(path))
}

/// Shorten a path for one-line display: keep the last `max_chars` characters behind `...`.
pub fn abbreviate_path(path: &Path, max_chars: usize) -> String {
    let s = path.display().to_string();
    let count = s.chars().count();
    if count <= max_chars {
        return s;
    }
    let tail: String = s.chars().skip(count - max_chars).collect();
    format!("...{tail}")
}
