use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::CopyRecord;
use crate::engine::filesystem::list_files;

use super::{Reconciler, present_destinations};

/// Wipes the output directory on every reconciliation, so everything is recopied. Only files
/// asserted present on the mounted volume are spared.
#[derive(Clone, Debug)]
pub struct DeleteAllReconciler {
    output: PathBuf,
    keep: Vec<PathBuf>,
}

impl DeleteAllReconciler {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            keep: Vec::new(),
        }
    }

    /// Files never deleted (job file, index file).
    pub fn with_keep(mut self, keep: Vec<PathBuf>) -> Self {
        self.keep = keep;
        self
    }
}

impl Reconciler for DeleteAllReconciler {
    fn output(&self) -> &Path {
        &self.output
    }

    fn calculate_with_present(
        &self,
        records: &[CopyRecord],
        _copied: &BTreeSet<usize>,
        present: &BTreeSet<usize>,
    ) -> Result<BTreeSet<PathBuf>> {
        let kept = present_destinations(records, present);
        Ok(list_files(&self.output, &self.keep)
            .into_iter()
            .filter(|p| !kept.contains(p.as_path()))
            .collect())
    }
}
