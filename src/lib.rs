//! mvcopy: copy a file set across several output volumes, prompting for a swap whenever the
//! current one fills up. Work is spread over a pool of copy workers; a reconciler prepares each
//! volume so nothing is copied twice and nothing stale is left behind.

pub mod copier;
pub mod engine;
pub mod reconcile;
pub mod resolve;
pub mod types;
pub mod utils;
pub mod verifier;
pub mod volume;

/// Re-export types for API
pub use types::*;

pub use copier::Copier;
pub use verifier::{Verifier, VerifyResult};

use log::debug;
use std::path::PathBuf;

use resolve::{DirectoryListResolver, JobFileResolver};

/// Result alias used by public mvcopy API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Copy `srcpaths` into `options.output`, prompting on stdin when a volume fills.
///
/// Use [`Copier`] directly to supply a different prompt, transfer or reconciler.
pub fn copy_files(srcpaths: &[PathBuf], options: CopyOptions) -> Result<CopyOutcome> {
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        options
    );
    let resolver = DirectoryListResolver::new(srcpaths.to_vec(), options.output.clone());
    Copier::new(Box::new(resolver), options).start()
}

/// Verify `[device_start_index, last_copied_index)` of the job file in `options.jobfile`.
pub fn verify_files(
    options: &CopyOptions,
    device_start_index: usize,
    last_copied_index: usize,
) -> Result<VerifyResult> {
    let resolver = JobFileResolver::new(&options.jobfile);
    Verifier::new(Box::new(resolver), options.clone()).verify(device_start_index, last_copied_index)
}
