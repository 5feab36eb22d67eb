//! Progress bar for the copy loop

use kdam::{Animation, Bar, BarExt};
use std::path::Path;

use crate::engine::tools::abbreviate_path;
use crate::utils::config::ProgressConsts;

/// Create a progress bar over `total` records.
pub fn create_progress_bar(total: usize, desc: &'static str) -> Bar {
    kdam::tqdm!(
        total = total,
        desc = desc,
        animation = Animation::Classic,
        unit = " files",
        position = 0
    )
}

/// Copy progress display. Renders nothing when disabled so callers never branch on it.
pub struct CopyProgress {
    bar: Option<Bar>,
    rendered: usize,
    errors: usize,
    last_file: String,
}

impl CopyProgress {
    pub fn new(enabled: bool, total: usize) -> Self {
        Self {
            bar: enabled.then(|| create_progress_bar(total, "Copying")),
            rendered: 0,
            errors: 0,
            last_file: String::new(),
        }
    }

    /// Remember the most recently finished file for the postfix.
    pub fn set_last_file(&mut self, path: &Path) {
        self.last_file = abbreviate_path(path, ProgressConsts::MAX_FILE_CHARS);
    }

    /// Move the bar to `processed` with the current error count.
    pub fn render(&mut self, processed: usize, errors: usize) {
        let Some(bar) = self.bar.as_mut() else {
            return;
        };
        if processed == self.rendered && errors == self.errors {
            return;
        }
        self.rendered = processed;
        self.errors = errors;
        bar.set_postfix(format!("errors={} {}", errors, self.last_file));
        let _ = bar.update_to(processed);
    }

    /// Break the bar's line so a prompt or log block starts on a fresh one.
    pub fn suspend(&mut self) {
        if self.bar.is_some() {
            eprintln!();
        }
    }

    /// Force a redraw (after a prompt).
    pub fn refresh(&mut self) {
        if let Some(bar) = self.bar.as_mut() {
            let _ = bar.refresh();
        }
    }
}
