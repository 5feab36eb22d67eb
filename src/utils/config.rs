//! Application configuration constants.
//! Tuning and defaults in one place.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived file names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    jobfile_name: String,
    indexfile_name: String,
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                jobfile_name: format!(".{pkg}-jobdata.json"),
                indexfile_name: format!(".{pkg}-index"),
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    pub fn jobfile_name(&self) -> &str {
        &self.jobfile_name
    }

    pub fn indexfile_name(&self) -> &str {
        &self.indexfile_name
    }

    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Job file in the current directory (absolute when the cwd is readable).
    pub fn default_jobfile(&self) -> PathBuf {
        in_current_dir(self.jobfile_name())
    }

    /// Index file in the current directory (absolute when the cwd is readable).
    pub fn default_indexfile(&self) -> PathBuf {
        in_current_dir(self.indexfile_name())
    }
}

fn in_current_dir(name: &str) -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| Path::new(".").to_path_buf())
        .join(name)
}

// ---- Workers ----

/// Worker pool defaults.
/// Use [`WorkerDefaults::current()`] to fill `all_threads` from rayon; the rest are const.
#[derive(Clone, Copy, Debug)]
pub struct WorkerDefaults {
    /// Available threads (from rayon); set by [`WorkerDefaults::current()`].
    pub all_threads: usize,
}

impl WorkerDefaults {
    /// Jobs a worker handles before it is recycled.
    pub const MAX_WORKER_TASKS: usize = 5;
    /// Floor for the worker count.
    pub const FLOOR_WORKERS: usize = 1;

    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
        }
    }

    /// One worker per CPU minus one for the control loop, never below the floor.
    pub fn num_workers(&self) -> usize {
        self.all_threads
            .saturating_sub(1)
            .max(Self::FLOOR_WORKERS)
    }
}

// ---- Polling ----

/// Intervals for the orchestrator loop and idle workers.
pub struct PollConsts;

impl PollConsts {
    /// Orchestrator sleep when an iteration observed nothing new.
    pub const LOOP_INTERVAL: Duration = Duration::from_millis(20);
    /// How long an idle worker waits on an empty queue before re-checking the device-full signal.
    pub const WORKER_POP_TIMEOUT: Duration = Duration::from_millis(50);
    /// Wait for workers to finish their current file on stop. Stragglers are detached after this.
    pub const JOIN_TIMEOUT: Duration = Duration::from_secs(30);
    /// Granularity of `WorkerPool::join` polling.
    pub const JOIN_POLL: Duration = Duration::from_millis(10);
}

// ---- Progress ----

pub struct ProgressConsts;

impl ProgressConsts {
    /// Characters of the last copied path shown next to the bar.
    pub const MAX_FILE_CHARS: usize = 50;
}

// ---- Hashing ----

/// Hashing I/O thresholds and buffer sizes.
pub struct HashingConsts;

impl HashingConsts {
    /// File size above which hashing uses memory-mapped I/O (bytes). 100 MB.
    pub const HASH_MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;
    /// Chunk size for reading files below mmap threshold (bytes). 1 MB.
    pub const HASH_READ_CHUNK_SIZE: usize = 1024 * 1024;
}
