//! Volume probing: free space, mount point, and disk-full error classification.
//!
//! The rest of the crate never inspects raw OS error codes; it asks [`is_device_full_error`].
//! Free space is read through the [`VolumeSpace`] trait so reconcilers can be driven by a
//! simulated capacity in tests.

use log::debug;
use std::io;
use std::path::{Path, PathBuf};
use sysinfo::Disks;

#[cfg(unix)]
mod unix;
#[cfg(not(unix))]
mod other;

/// POSIX `ENOSPC`.
pub const POSIX_DISKFULL_ERRNO: i32 = 28;
/// Windows `ERROR_HANDLE_DISK_FULL`.
pub const WINDOWS_HANDLE_DISKFULL_ERRNO: i32 = 39;
/// Windows `ERROR_DISK_FULL`.
pub const WINDOWS_DISKFULL_ERRNO: i32 = 112;

/// Bytes still writable on the volume holding a path.
pub trait VolumeSpace: Send + Sync {
    fn available_bytes(&self, path: &Path) -> io::Result<u64>;
}

/// The real filesystem: `statvfs` on Unix, sysinfo disks elsewhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemVolume;

impl VolumeSpace for SystemVolume {
    fn available_bytes(&self, path: &Path) -> io::Result<u64> {
        let probe = nearest_existing(path);
        let avail = platform_available_bytes(&probe)?;
        debug!("Volume free at {}: {} bytes", probe.display(), avail);
        Ok(avail)
    }
}

#[cfg(unix)]
fn platform_available_bytes(path: &Path) -> io::Result<u64> {
    unix::available_bytes(path)
}

#[cfg(not(unix))]
fn platform_available_bytes(path: &Path) -> io::Result<u64> {
    other::available_bytes(path)
}

/// True if `err` means the destination volume ran out of space.
pub fn is_device_full_error(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::StorageFull {
        return true;
    }
    match err.raw_os_error() {
        Some(code) => is_device_full_code(code),
        None => false,
    }
}

#[cfg(windows)]
fn is_device_full_code(code: i32) -> bool {
    code == WINDOWS_HANDLE_DISKFULL_ERRNO || code == WINDOWS_DISKFULL_ERRNO
}

#[cfg(not(windows))]
fn is_device_full_code(code: i32) -> bool {
    code == POSIX_DISKFULL_ERRNO
}

/// Walk up from `path` to the first ancestor that exists (the output dir may not be created yet).
pub fn nearest_existing(path: &Path) -> PathBuf {
    let mut current = path.to_path_buf();
    loop {
        if current.exists() {
            return current;
        }
        match current.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => current = parent.to_path_buf(),
            _ => return PathBuf::from("."),
        }
    }
}

/// Mount point of the filesystem holding `path` (longest matching disk mount). Falls back to the path.
pub fn mount_point(path: &Path) -> PathBuf {
    let probe = nearest_existing(path);
    let canonical = probe.canonicalize().unwrap_or(probe);
    let disks = Disks::new_with_refreshed_list();
    disks
        .iter()
        .map(|d| d.mount_point())
        .filter(|mount| canonical.starts_with(mount))
        .max_by_key(|mount| mount.as_os_str().len())
        .map(Path::to_path_buf)
        .unwrap_or(canonical)
}
