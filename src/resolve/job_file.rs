//! The job file: the resolved record list persisted as a JSON array, one record per line.

use anyhow::{Context, Result, bail};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::CopyRecord;
use crate::utils::tempfiles::write_atomic;

use super::Resolver;

/// Write `records` atomically (`<path>.tmp` then rename).
pub fn write_jobfile(path: &Path, records: &[CopyRecord]) -> Result<()> {
    let mut out = String::from("[\n");
    for (i, record) in records.iter().enumerate() {
        let line = serde_json::to_string(record).context("serialize copy record")?;
        out.push_str("  ");
        out.push_str(&line);
        if i + 1 < records.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("]\n");
    write_atomic(path, out.as_bytes())?;
    debug!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read and validate a job file. Indexes must run `0..N-1` in file order.
pub fn read_jobfile(path: &Path) -> Result<Vec<CopyRecord>> {
    let data = fs::read(path).with_context(|| format!("read job file {}", path.display()))?;
    let records: Vec<CopyRecord> = serde_json::from_slice(&data)
        .with_context(|| format!("parse job file {}", path.display()))?;
    for (position, record) in records.iter().enumerate() {
        if record.index != position {
            bail!(
                "job file {} is corrupt: record {} has index {}",
                path.display(),
                position,
                record.index
            );
        }
    }
    Ok(records)
}

/// Resolves from a previously written job file.
#[derive(Clone, Debug)]
pub struct JobFileResolver {
    path: PathBuf,
}

impl JobFileResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Resolver for JobFileResolver {
    fn resolve(&self) -> Result<Vec<CopyRecord>> {
        read_jobfile(&self.path)
    }
}
