//! Resolve source paths by walking them.

use anyhow::{Result, bail};
use log::{debug, warn};
use std::collections::HashSet;
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::CopyRecord;
use crate::engine::tools::{absolutize, path_relative_to};

use super::Resolver;

/// Walks each source path and maps every file to `output/<path relative to its source root>`.
/// A source that is itself a file maps to `output/<file name>`.
#[derive(Clone, Debug)]
pub struct DirectoryListResolver {
    srcpaths: Vec<PathBuf>,
    output: PathBuf,
}

impl DirectoryListResolver {
    pub fn new(srcpaths: Vec<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            srcpaths,
            output: output.into(),
        }
    }
}

impl Resolver for DirectoryListResolver {
    fn resolve(&self) -> Result<Vec<CopyRecord>> {
        let output = absolutize(&self.output)?;
        let mut records = Vec::new();

        for srcpath in &self.srcpaths {
            let root = absolutize(srcpath)?;
            if !root.exists() {
                bail!("source path does not exist: {}", root.display());
            }
            for entry in WalkDir::new(&root).follow_links(false) {
                let entry = match entry {
                    Ok(e) => e,
                    Err(e) => {
                        warn!("Skipping unreadable path: {}", e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let relpath = match path_relative_to(entry.path(), &root) {
                    Some(rel) if !rel.as_os_str().is_empty() => rel,
                    _ => match entry.path().file_name() {
                        Some(name) => PathBuf::from(name),
                        None => continue,
                    },
                };
                let bytes = match entry.metadata() {
                    Ok(meta) => meta.len(),
                    Err(e) => {
                        warn!("Skipping {}: {}", entry.path().display(), e);
                        continue;
                    }
                };
                records.push(CopyRecord {
                    src: entry.path().to_path_buf(),
                    dst: output.join(&relpath),
                    relpath,
                    bytes,
                    index: 0,
                });
            }
        }

        records.sort_by(|a, b| a.src.cmp(&b.src));
        let mut seen = HashSet::with_capacity(records.len());
        for (index, record) in records.iter_mut().enumerate() {
            record.index = index;
            if !seen.insert(record.dst.clone()) {
                warn!(
                    "{} maps to a destination another source already uses: {}",
                    record.src.display(),
                    record.dst.display()
                );
            }
        }
        debug!(
            "Resolved {} files from {} source paths",
            records.len(),
            self.srcpaths.len()
        );
        Ok(records)
    }
}
