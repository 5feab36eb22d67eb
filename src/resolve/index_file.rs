use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::utils::tempfiles::{remove_if_exists, write_atomic};

/// Where an interrupted run picks up: the first index of the mounted volume, the first index
/// not yet processed, and the indexes that failed (retried on resume).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumePoint {
    pub device_start_index: usize,
    pub next_index: usize,
    #[serde(default)]
    pub errors: Vec<usize>,
}

pub fn write_resume_point(path: &Path, point: &ResumePoint) -> Result<()> {
    let json = serde_json::to_vec(point).context("serialize resume point")?;
    write_atomic(path, &json)
}

/// `None` when no index file exists.
pub fn read_resume_point(path: &Path) -> Result<Option<ResumePoint>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read index file {}", path.display())),
    };
    let point: ResumePoint = serde_json::from_slice(&data)
        .with_context(|| format!("parse index file {}", path.display()))?;
    Ok(Some(point))
}

pub fn remove_resume_point(path: &Path) -> Result<()> {
    remove_if_exists(path)
}
