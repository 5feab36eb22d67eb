//! Keep-files reconciler.
//!
//! A destination file survives only if its record is still uncopied and falls inside the
//! prefix (in index order) of uncopied records that fits in the estimated free space, or if its
//! record is asserted present on the volume.

use anyhow::{Context, Result};
use log::debug;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::CopyRecord;
use crate::engine::filesystem::{directory_size, list_files};
use crate::volume::VolumeSpace;

use super::{Reconciler, present_destinations};

pub struct KeepFilesReconciler {
    output: PathBuf,
    device_padding: u64,
    keep: Vec<PathBuf>,
    volume: Box<dyn VolumeSpace>,
}

impl KeepFilesReconciler {
    pub fn new(output: impl Into<PathBuf>, volume: Box<dyn VolumeSpace>) -> Self {
        Self {
            output: output.into(),
            device_padding: 0,
            keep: Vec::new(),
            volume,
        }
    }

    /// Bytes to leave free on the volume.
    pub fn with_padding(mut self, device_padding: u64) -> Self {
        self.device_padding = device_padding;
        self
    }

    /// Files never deleted (job file, index file).
    pub fn with_keep(mut self, keep: Vec<PathBuf>) -> Self {
        self.keep = keep;
        self
    }

    /// `free - size(output) - padding`, floored at zero.
    pub fn estimate_available_bytes(&self) -> Result<u64> {
        let free = self
            .volume
            .available_bytes(&self.output)
            .with_context(|| format!("probe free space at {}", self.output.display()))?;
        let used = directory_size(&self.output);
        let estimate = free
            .saturating_sub(used)
            .saturating_sub(self.device_padding);
        debug!(
            "Estimated room on volume: {} bytes (free {}, output {}, padding {})",
            estimate, free, used, self.device_padding
        );
        Ok(estimate)
    }
}

/// How many leading `records` fit strictly below `available` bytes.
pub(crate) fn fitting_prefix(records: &[&CopyRecord], available: u64) -> usize {
    let mut total = 0_u64;
    for (count, record) in records.iter().enumerate() {
        total = total.saturating_add(record.bytes);
        if total >= available {
            return count;
        }
    }
    records.len()
}

impl Reconciler for KeepFilesReconciler {
    fn output(&self) -> &Path {
        &self.output
    }

    fn calculate_with_present(
        &self,
        records: &[CopyRecord],
        copied: &BTreeSet<usize>,
        present: &BTreeSet<usize>,
    ) -> Result<BTreeSet<PathBuf>> {
        let kept = present_destinations(records, present);
        let uncopied: Vec<&CopyRecord> = records
            .iter()
            .filter(|r| !copied.contains(&r.index) && !present.contains(&r.index))
            .collect();
        let mut wanted: HashSet<&Path> = uncopied.iter().map(|r| r.dst.as_path()).collect();
        wanted.extend(kept.iter().copied());

        // everything that is neither present nor an uncopied record's destination
        let mut delete: BTreeSet<PathBuf> = list_files(&self.output, &self.keep)
            .into_iter()
            .filter(|p| !wanted.contains(p.as_path()))
            .collect();
        let unrelated = delete.len();

        // uncopied destinations past the point where the volume fills
        let fit = fitting_prefix(&uncopied, self.estimate_available_bytes()?);
        for record in &uncopied[fit..] {
            if record.dst.is_file() && !kept.contains(record.dst.as_path()) {
                delete.insert(record.dst.clone());
            }
        }
        debug!(
            "{} of {} uncopied records fit ({} present); deleting {} unrelated and {} overflow files",
            fit,
            uncopied.len(),
            kept.len(),
            unrelated,
            delete.len() - unrelated
        );
        Ok(delete)
    }
}
