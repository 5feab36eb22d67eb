//! Reconcilers decide which files in the output directory must go before (re)copying onto a
//! volume: files that belong to no remaining record, files already copied to an earlier
//! volume, and files that will not fit on this one.

mod delete_all;
mod keep_files;

pub use delete_all::DeleteAllReconciler;
pub use keep_files::KeepFilesReconciler;

use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::engine::filesystem::{remove_empty_dirs, remove_file_if_present};
use crate::engine::tools::absolutize;
use crate::volume::SystemVolume;
use crate::{CopyOptions, CopyRecord, ReconcilerKind};

/// What one reconciliation removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub deleted_files: usize,
    pub deleted_dirs: usize,
}

pub trait Reconciler: Send {
    /// Root the reconciler walks.
    fn output(&self) -> &Path;

    /// Paths to delete, given the records of this and later volumes and the indexes already
    /// copied. Pure with respect to the filesystem.
    fn calculate(
        &self,
        records: &[CopyRecord],
        copied: &BTreeSet<usize>,
    ) -> Result<BTreeSet<PathBuf>> {
        self.calculate_with_present(records, copied, &BTreeSet::new())
    }

    /// [`Reconciler::calculate`] for a volume that already holds the `present` indexes. Their
    /// destinations are never deleted and take no room from the records still to copy.
    fn calculate_with_present(
        &self,
        records: &[CopyRecord],
        copied: &BTreeSet<usize>,
        present: &BTreeSet<usize>,
    ) -> Result<BTreeSet<PathBuf>>;

    /// Delete what [`Reconciler::calculate`] returns, then prune empty directories.
    fn reconcile(
        &self,
        records: &[CopyRecord],
        copied: &BTreeSet<usize>,
    ) -> Result<ReconcileSummary> {
        self.reconcile_with_present(records, copied, &BTreeSet::new())
    }

    fn reconcile_with_present(
        &self,
        records: &[CopyRecord],
        copied: &BTreeSet<usize>,
        present: &BTreeSet<usize>,
    ) -> Result<ReconcileSummary> {
        let paths = self.calculate_with_present(records, copied, present)?;
        let mut summary = ReconcileSummary::default();
        for path in &paths {
            let removed = remove_file_if_present(path)
                .with_context(|| format!("delete {}", path.display()))?;
            if removed {
                debug!("Deleted {}", path.display());
                summary.deleted_files += 1;
            }
        }
        summary.deleted_dirs = remove_empty_dirs(self.output())?;
        info!(
            "Reconciled {}: deleted {} files and {} empty directories",
            self.output().display(),
            summary.deleted_files,
            summary.deleted_dirs
        );
        Ok(summary)
    }
}

/// Destinations of the `present` records.
pub(crate) fn present_destinations<'a>(
    records: &'a [CopyRecord],
    present: &BTreeSet<usize>,
) -> HashSet<&'a Path> {
    records
        .iter()
        .filter(|r| present.contains(&r.index))
        .map(|r| r.dst.as_path())
        .collect()
}

/// The reconciler `options` select, probing the real volume. Output and bookkeeping paths are
/// made absolute so they compare equal to resolved destinations.
pub fn for_options(options: &CopyOptions) -> Result<Box<dyn Reconciler>> {
    let output = absolutize(&options.output)?;
    let keep = vec![absolutize(&options.jobfile)?, absolutize(&options.indexfile)?];
    Ok(match options.reconciler {
        ReconcilerKind::KeepFiles => Box::new(
            KeepFilesReconciler::new(output, Box::new(SystemVolume))
                .with_padding(options.device_padding)
                .with_keep(keep),
        ),
        ReconcilerKind::DeleteAll => Box::new(DeleteAllReconciler::new(output).with_keep(keep)),
    })
}
