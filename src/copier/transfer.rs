//! The per-file copy operation workers run.

use log::debug;
use std::fs;
use std::io;

use crate::engine::filesystem::{
    copy_file_stat, copy_parent_dir_times, files_different, remove_file_if_present,
};
use crate::{ComparePolicy, CopyRecord};

/// What happened to one record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Bytes and metadata were written.
    Copied,
    /// Destination already present and not stale.
    Skipped,
}

/// Copies one record. Errors are raw `io::Error` so the worker can classify disk-full.
pub trait Transfer: Send + Sync {
    fn transfer(&self, record: &CopyRecord) -> io::Result<TransferOutcome>;
}

/// Real filesystem copy honoring a staleness policy.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsTransfer {
    pub policy: ComparePolicy,
}

impl FsTransfer {
    pub fn new(policy: ComparePolicy) -> Self {
        Self { policy }
    }
}

impl Transfer for FsTransfer {
    fn transfer(&self, record: &CopyRecord) -> io::Result<TransferOutcome> {
        let (src, dst) = (&record.src, &record.dst);
        if dst.is_file() {
            if !files_different(src, dst, &self.policy)? {
                debug!("file exists, not stale. skipped: {}", dst.display());
                return Ok(TransferOutcome::Skipped);
            }
            // a preserved read-only mode would make the overwrite fail
            remove_file_if_present(dst)?;
        }
        if let Some(parent) = dst.parent()
            && !parent.is_dir()
        {
            fs::create_dir_all(parent)?;
        }
        debug!("copying file: {} to {}", src.display(), dst.display());
        fs::copy(src, dst)?;
        copy_file_stat(src, dst)?;
        copy_parent_dir_times(src, dst, &record.relpath);
        Ok(TransferOutcome::Copied)
    }
}
