//! Verifier: audits a volume against the job file after copying.
//!
//! Reports records in `[device_start_index, last_copied_index)` whose destination is missing or
//! stale, plus byte totals for what should be on the volume and what actually is.

use anyhow::Result;
use log::{debug, warn};
use rayon::prelude::*;

use crate::engine::filesystem::{directory_size, files_different};
use crate::engine::tools::absolutize;
use crate::resolve::Resolver;
use crate::{CopyOptions, CopyRecord};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerifyResult {
    /// Records whose destination is not a file. Ascending.
    pub missing_indexes: Vec<usize>,
    /// Records whose destination is present but stale. Ascending.
    pub different_indexes: Vec<usize>,
    /// Bytes of every record whose destination is present.
    pub copied_bytes: u64,
    /// Current size of the output directory.
    pub backup_bytes: u64,
}

impl VerifyResult {
    pub fn valid(&self) -> bool {
        self.missing_indexes.is_empty() && self.different_indexes.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DestState {
    Missing,
    Different,
    Same,
}

pub struct Verifier {
    resolver: Box<dyn Resolver>,
    options: CopyOptions,
}

impl Verifier {
    pub fn new(resolver: Box<dyn Resolver>, options: CopyOptions) -> Self {
        Self { resolver, options }
    }

    pub fn verify(&self, device_start_index: usize, last_copied_index: usize) -> Result<VerifyResult> {
        let records: Vec<CopyRecord> = self
            .resolver
            .resolve_from(device_start_index)?
            .into_iter()
            .filter(|r| r.index < last_copied_index)
            .collect();
        debug!(
            "Verifying {} records in [{}, {})",
            records.len(),
            device_start_index,
            last_copied_index
        );

        let policy = self.options.compare;
        let mut states: Vec<(usize, u64, DestState)> = records
            .par_iter()
            .map(|r| {
                let state = if !r.dst.is_file() {
                    DestState::Missing
                } else {
                    match files_different(&r.src, &r.dst, &policy) {
                        Ok(true) => DestState::Different,
                        Ok(false) => DestState::Same,
                        Err(e) => {
                            warn!("Unable to compare {}: {}", r.src.display(), e);
                            DestState::Different
                        }
                    }
                };
                (r.index, r.bytes, state)
            })
            .collect();
        states.sort_unstable_by_key(|(index, _, _)| *index);

        let mut result = VerifyResult::default();
        for (index, bytes, state) in states {
            match state {
                DestState::Missing => result.missing_indexes.push(index),
                DestState::Different => {
                    result.different_indexes.push(index);
                    result.copied_bytes += bytes;
                }
                DestState::Same => result.copied_bytes += bytes,
            }
        }
        result.backup_bytes = directory_size(&absolutize(&self.options.output)?);
        Ok(result)
    }
}
