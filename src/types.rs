//! Public and internal types for the mvcopy API and copier.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::config::{PackagePaths, WorkerDefaults};

/// One file to copy. Immutable once resolved; shared read-only with workers.
///
/// `index` is assigned once by the resolver (contiguous `0..N-1`, ascending in emit order) and
/// is the only key the copier, reconcilers and verifier use to address a record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyRecord {
    /// Absolute source path.
    pub src: PathBuf,
    /// Absolute destination path.
    pub dst: PathBuf,
    /// Path relative to the source root the file was found under.
    pub relpath: PathBuf,
    /// Source size in bytes at resolve time.
    pub bytes: u64,
    pub index: usize,
}

/// Which checks decide that an existing destination is stale and must be recopied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComparePolicy {
    /// Source modified later than destination (whole seconds).
    pub mtime: bool,
    /// Sizes differ.
    pub size: bool,
    /// Blake3 digests differ (slow).
    pub checksum: bool,
}

impl Default for ComparePolicy {
    fn default() -> Self {
        Self {
            mtime: true,
            size: true,
            checksum: false,
        }
    }
}

/// Reconciler variant used before copying and after every volume swap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReconcilerKind {
    /// Keep destination files that belong on this volume and will fit.
    #[default]
    KeepFiles,
    /// Wipe the output directory every time (everything is recopied).
    DeleteAll,
}

/// Configuration of one copy job. Built once, never mutated after the run starts.
#[derive(Clone, Debug)]
pub struct CopyOptions {
    /// Directory the backup is written to (the mounted volume, or a directory on it).
    pub output: PathBuf,
    /// Bytes to leave free on each volume.
    pub device_padding: u64,
    /// Desired number of copy workers.
    pub num_workers: usize,
    /// Jobs a worker processes before it exits and is replaced.
    pub max_worker_tasks: usize,
    /// Staleness checks for existing destination files.
    pub compare: ComparePolicy,
    /// Where the resolved record list is persisted (JSON).
    pub jobfile: PathBuf,
    /// Where the resume point is persisted (JSON).
    pub indexfile: PathBuf,
    /// First record index that belongs to the currently mounted volume.
    pub device_start_index: usize,
    /// First record index scheduled for copying. Records in
    /// `[device_start_index, start_index)` are asserted present already.
    pub start_index: usize,
    /// Indexes that failed in an earlier run. Copied again even when below `start_index`.
    pub retry_indexes: Vec<usize>,
    /// Render a progress bar while copying.
    pub show_progress: bool,
    pub reconciler: ReconcilerKind,
    /// Verbose (debug) logging.
    pub verbose: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        let paths = PackagePaths::get();
        Self {
            output: PathBuf::new(),
            device_padding: 0,
            num_workers: WorkerDefaults::current().num_workers(),
            max_worker_tasks: WorkerDefaults::MAX_WORKER_TASKS,
            compare: ComparePolicy::default(),
            jobfile: paths.default_jobfile(),
            indexfile: paths.default_indexfile(),
            device_start_index: 0,
            start_index: 0,
            retry_indexes: Vec::new(),
            show_progress: false,
            reconciler: ReconcilerKind::default(),
            verbose: false,
        }
    }
}

impl CopyOptions {
    /// Options writing to `output`, everything else default.
    pub fn with_output(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    /// Reject combinations that can never run.
    pub fn validate(&self) -> Result<()> {
        if self.output.as_os_str().is_empty() {
            bail!("output directory is required (-o/--output)");
        }
        if self.num_workers == 0 {
            bail!("at least one worker is required");
        }
        if self.max_worker_tasks == 0 {
            bail!("max_worker_tasks must be at least 1");
        }
        if self.start_index < self.device_start_index {
            bail!(
                "start index {} is before device start index {}",
                self.start_index,
                self.device_start_index
            );
        }
        Ok(())
    }
}

/// Why a run stopped before every record was processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbortReason {
    /// Operator answered "q" at the volume-swap prompt (or closed stdin).
    User,
    /// Ctrl+C.
    Interrupted,
}

/// Result of [`Copier::start`](crate::copier::Copier::start).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CopyOutcome {
    /// Every record was either copied or failed unrecoverably.
    Finished {
        copied: Vec<usize>,
        errors: Vec<usize>,
    },
    Aborted(AbortReason),
}

impl CopyOutcome {
    /// True when the run finished without per-file errors.
    pub fn is_success(&self) -> bool {
        matches!(self, CopyOutcome::Finished { errors, .. } if errors.is_empty())
    }
}
