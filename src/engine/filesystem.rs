//! Filesystem helpers: size parsing, staleness checks, metadata duplication, tree sizing and cleanup.

use anyhow::{Context, Result, bail};
use filetime::FileTime;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::ComparePolicy;
use crate::engine::hashing::hash_file;

/// Parse a size such as `5M`, `10GB`, `6K`, `8B` or `8` into bytes (decimal units).
pub fn size_to_bytes(size: &str) -> Result<u64> {
    let size = size.trim();
    let split = size
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(size.len());
    let (number, unit) = size.split_at(split);
    let number: u64 = number
        .trim()
        .parse()
        .with_context(|| format!("invalid size: {size:?}"))?;
    let multiplier: u64 = match unit.to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" => 1_000,
        "M" | "MB" => 1_000_000,
        "G" | "GB" => 1_000_000_000,
        "T" | "TB" => 1_000_000_000_000,
        other => bail!("unable to identify unit {other:?} in size {size:?}"),
    };
    number
        .checked_mul(multiplier)
        .with_context(|| format!("size overflows: {size:?}"))
}

/// Modification time truncated to whole seconds.
fn mtime_secs(meta: &fs::Metadata) -> i64 {
    FileTime::from_last_modification_time(meta).unix_seconds()
}

/// True if `dst` must be recopied from `src` under `policy`.
///
/// mtime: source newer than destination (whole seconds, so sub-second filesystem rounding
/// does not force recopies). size: lengths differ. checksum: blake3 digests differ.
pub fn files_different(src: &Path, dst: &Path, policy: &ComparePolicy) -> io::Result<bool> {
    let src_meta = fs::metadata(src)?;
    let dst_meta = fs::metadata(dst)?;
    if policy.mtime && mtime_secs(&src_meta) > mtime_secs(&dst_meta) {
        return Ok(true);
    }
    if policy.size && src_meta.len() != dst_meta.len() {
        return Ok(true);
    }
    if policy.checksum {
        if src_meta.len() != dst_meta.len() {
            return Ok(true);
        }
        let a = hash_file(src, src_meta.len())?;
        let b = hash_file(dst, dst_meta.len())?;
        return Ok(a != b);
    }
    Ok(false)
}

/// Copy permissions and access/modification times from `src` onto `dst`.
pub fn copy_file_stat(src: &Path, dst: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;
    fs::set_permissions(dst, meta.permissions())?;
    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    filetime::set_file_times(dst, atime, mtime)
}

/// Best-effort timestamp copy onto each destination directory that mirrors a source directory
/// in `relpath` (`a/b/file.txt` → `a`, `a/b`). Failures are logged, never returned.
pub fn copy_parent_dir_times(src: &Path, dst: &Path, relpath: &Path) {
    let depth = relpath.components().count();
    let (Some(src_root), Some(dst_root)) = (src.ancestors().nth(depth), dst.ancestors().nth(depth))
    else {
        return;
    };
    let Some(rel_parent) = relpath.parent() else {
        return;
    };
    let mut rel = PathBuf::new();
    for part in rel_parent.components() {
        rel.push(part);
        let src_dir = src_root.join(&rel);
        let dst_dir = dst_root.join(&rel);
        let result = fs::metadata(&src_dir).and_then(|meta| {
            filetime::set_file_times(
                &dst_dir,
                FileTime::from_last_access_time(&meta),
                FileTime::from_last_modification_time(&meta),
            )
        });
        if let Err(e) = result {
            warn!("Unable to copy stats from {}: {}", src_dir.display(), e);
        }
    }
}

/// Bytes occupied under `root`: every file and subdirectory entry (not the root itself).
/// A missing root has size 0.
pub fn directory_size(root: &Path) -> u64 {
    if !root.is_dir() {
        return 0;
    }
    WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Every regular file under `root`, skipping paths in `keep`.
pub fn list_files(root: &Path, keep: &[PathBuf]) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!("Skipping unreadable path in output: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| !keep.iter().any(|k| k == p))
        .collect()
}

/// Remove a file; one that is already gone counts as removed.
pub fn remove_file_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Remove empty directories under `root`, deepest first. The root itself is kept.
/// Directories that still hold something are left alone. Returns the number removed.
pub fn remove_empty_dirs(root: &Path) -> Result<usize> {
    if !root.is_dir() {
        return Ok(0);
    }
    let mut removed = 0_usize;
    for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!("Skipping unreadable path during cleanup: {}", err);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        match fs::remove_dir(entry.path()) {
            Ok(()) => {
                debug!("Removed empty directory: {}", entry.path().display());
                removed += 1;
            }
            Err(e)
                if e.kind() == io::ErrorKind::DirectoryNotEmpty
                    || e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("remove directory {}", entry.path().display()));
            }
        }
    }
    Ok(removed)
}
