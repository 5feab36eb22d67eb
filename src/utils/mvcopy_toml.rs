//! Load `.mvcopy.toml` from a directory (CLI only). The library takes everything through CopyOptions.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::CopyOptions;
use crate::engine::filesystem::size_to_bytes;
use crate::types::ReconcilerKind;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct MvcopyToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    output: Option<String>,
    padding: Option<String>,
    workers: Option<usize>,
    max_worker_tasks: Option<usize>,
    jobfile: Option<String>,
    indexfile: Option<String>,
    progress: Option<bool>,
    mtime: Option<bool>,
    size: Option<bool>,
    checksum: Option<bool>,
    delete_all: Option<bool>,
    verbose: Option<bool>,
}

/// Load the config file from `dir` if present. Returns None if missing or unparsable (warns on the latter).
pub fn load_mvcopy_toml(dir: &Path) -> Option<MvcopyToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_mvcopy_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub fn parse_mvcopy_toml(s: &str) -> Result<MvcopyToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $opts:expr, $sec_field:ident => $($opts_field:ident).+) => {
        if let Some(v) = $sec.$sec_field {
            $opts.$($opts_field).+ = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_opts(file: &MvcopyToml, opts: &mut CopyOptions) {
    let sec = &file.settings;
    if let Some(ref p) = sec.output {
        opts.output = PathBuf::from(p);
    }
    if let Some(ref p) = sec.padding {
        match size_to_bytes(p) {
            Ok(bytes) => opts.device_padding = bytes,
            Err(e) => log::warn!("ignoring padding {:?} from config: {}", p, e),
        }
    }
    apply_file_opt!(sec, opts, workers => num_workers);
    apply_file_opt!(sec, opts, max_worker_tasks => max_worker_tasks);
    if let Some(ref p) = sec.jobfile {
        opts.jobfile = PathBuf::from(p);
    }
    if let Some(ref p) = sec.indexfile {
        opts.indexfile = PathBuf::from(p);
    }
    apply_file_opt!(sec, opts, progress => show_progress);
    apply_file_opt!(sec, opts, mtime => compare.mtime);
    apply_file_opt!(sec, opts, size => compare.size);
    apply_file_opt!(sec, opts, checksum => compare.checksum);
    if let Some(delete_all) = sec.delete_all {
        opts.reconciler = if delete_all {
            ReconcilerKind::DeleteAll
        } else {
            ReconcilerKind::KeepFiles
        };
    }
    apply_file_opt!(sec, opts, verbose => verbose);
}
