use clap::Parser;
use std::path::PathBuf;

/// Copy files across multiple volumes, prompting for a new one whenever the output fills up.
#[derive(Clone, Parser)]
#[command(name = "mvcopy")]
#[command(
    about = "Copy files onto one or more volumes; you are prompted to swap media when the output is full."
)]
pub struct Cli {
    /// Files or directories to copy. Required unless --from-jobfile or --resume.
    #[arg(value_name = "SRCPATHS")]
    pub srcpaths: Vec<PathBuf>,

    /// Directory on the backup volume to copy into.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Space to leave free on each volume, e.g. 500M or 1G.
    #[arg(long, value_name = "SIZE")]
    pub padding: Option<String>,

    /// Number of copy workers. Default: CPUs - 1.
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Files a worker copies before it is replaced.
    #[arg(long)]
    pub max_worker_tasks: Option<usize>,

    /// Where the resolved file list is written. Default: `.mvcopy-jobdata.json` in the current directory.
    #[arg(long)]
    pub jobfile: Option<PathBuf>,

    /// Where the resume point is written. Default: `.mvcopy-index` in the current directory.
    #[arg(long)]
    pub indexfile: Option<PathBuf>,

    /// Read the file list from the job file instead of walking SRCPATHS.
    #[arg(long)]
    pub from_jobfile: bool,

    /// Continue an interrupted run from the job file and index file.
    #[arg(long)]
    pub resume: bool,

    /// First index that belongs to the mounted volume.
    #[arg(long)]
    pub device_start_index: Option<usize>,

    /// First index to copy; files from --device-start-index up to here are assumed present.
    #[arg(long)]
    pub start_index: Option<usize>,

    /// Also compare blake3 checksums of existing destination files (slow).
    #[arg(long, short = 'c', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub checksum: Option<bool>,

    /// Do not recopy a file because the source is newer.
    #[arg(long)]
    pub no_mtime: bool,

    /// Do not recopy a file because its size differs.
    #[arg(long)]
    pub no_size: bool,

    /// Wipe the output directory before copying onto each volume.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub delete_all: Option<bool>,

    /// Hide the progress bar.
    #[arg(long)]
    pub no_progress: bool,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Check the mounted volume against the job file instead of copying.
    #[arg(long)]
    pub verify: bool,

    /// Last index (exclusive) to verify. Default: the index file's next index, else all records.
    #[arg(long, value_name = "INDEX")]
    pub verify_end: Option<usize>,
}

impl Cli {
    /// True when the file list comes from the job file.
    pub fn uses_jobfile(&self) -> bool {
        self.from_jobfile || self.resume || self.verify
    }
}
