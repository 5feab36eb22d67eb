#![allow(dead_code)]

use mvcopy::CopyRecord;
use mvcopy::copier::{FsTransfer, Transfer, TransferOutcome};
use mvcopy::engine::filesystem::directory_size;
use mvcopy::resolve::Resolver;
use mvcopy::utils::Prompt;
use mvcopy::volume::VolumeSpace;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

pub fn write_file(path: &Path, len: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![b'x'; len]).unwrap();
}

/// `count` source files `src/<i>.txt` of `size` bytes and their records into `output`.
pub fn flat_records(src: &Path, output: &Path, count: usize, size: usize) -> Vec<CopyRecord> {
    (0..count)
        .map(|index| {
            let relpath = PathBuf::from(format!("{index}.txt"));
            let src_path = src.join(&relpath);
            write_file(&src_path, size);
            CopyRecord {
                src: src_path,
                dst: output.join(&relpath),
                relpath,
                bytes: size as u64,
                index,
            }
        })
        .collect()
}

/// Resolver over a fixed record list.
pub struct VecResolver(pub Vec<CopyRecord>);

impl Resolver for VecResolver {
    fn resolve(&self) -> anyhow::Result<Vec<CopyRecord>> {
        Ok(self.0.clone())
    }
}

/// Volume reporting a constant amount of free space.
pub struct FixedVolume(pub u64);

impl VolumeSpace for FixedVolume {
    fn available_bytes(&self, _path: &Path) -> io::Result<u64> {
        Ok(self.0)
    }
}

/// A volume of `capacity` bytes whose contents are whatever is under `output`.
/// Writes that would exceed the capacity fail with `StorageFull`.
pub struct SimulatedVolume {
    output: PathBuf,
    capacity: AtomicU64,
    volume_no: AtomicUsize,
    inner: FsTransfer,
    written: Mutex<Vec<(usize, usize)>>,
}

impl SimulatedVolume {
    pub fn new(output: &Path, capacity: u64) -> Self {
        Self {
            output: output.to_path_buf(),
            capacity: AtomicU64::new(capacity),
            volume_no: AtomicUsize::new(1),
            inner: FsTransfer::default(),
            written: Mutex::new(Vec::new()),
        }
    }

    /// Pretend a new medium of `capacity` bytes was mounted.
    pub fn swap(&self, capacity: u64) {
        self.capacity.store(capacity, Ordering::SeqCst);
        self.volume_no.fetch_add(1, Ordering::SeqCst);
    }

    /// Indexes written while volume `volume_no` (1-based) was mounted, ascending.
    pub fn written_on(&self, volume_no: usize) -> Vec<usize> {
        let mut indexes: Vec<usize> = self
            .written
            .lock()
            .unwrap()
            .iter()
            .filter(|(v, _)| *v == volume_no)
            .map(|(_, i)| *i)
            .collect();
        indexes.sort_unstable();
        indexes
    }
}

impl SimulatedVolume {
    /// Every index written on any volume, ascending. Duplicates stay.
    pub fn all_written(&self) -> Vec<usize> {
        let mut indexes: Vec<usize> = self.written.lock().unwrap().iter().map(|(_, i)| *i).collect();
        indexes.sort_unstable();
        indexes
    }

    pub fn volumes_used(&self) -> usize {
        self.volume_no.load(Ordering::SeqCst)
    }
}

impl Transfer for SimulatedVolume {
    fn transfer(&self, record: &CopyRecord) -> io::Result<TransferOutcome> {
        let used = directory_size(&self.output);
        if used + record.bytes > self.capacity.load(Ordering::SeqCst) {
            return Err(io::Error::from(io::ErrorKind::StorageFull));
        }
        let outcome = self.inner.transfer(record)?;
        let volume_no = self.volume_no.load(Ordering::SeqCst);
        self.written.lock().unwrap().push((volume_no, record.index));
        Ok(outcome)
    }
}

impl VolumeSpace for SimulatedVolume {
    fn available_bytes(&self, _path: &Path) -> io::Result<u64> {
        let used = directory_size(&self.output);
        Ok(self.capacity.load(Ordering::SeqCst).saturating_sub(used))
    }
}

/// Shares a `SimulatedVolume` with a reconciler.
pub struct VolumeHandle(pub std::sync::Arc<SimulatedVolume>);

impl VolumeSpace for VolumeHandle {
    fn available_bytes(&self, path: &Path) -> io::Result<u64> {
        self.0.available_bytes(path)
    }
}

/// Prompt answered by a closure; `None` means input closed.
pub struct HookPrompt<F>(pub F);

impl<F> Prompt for HookPrompt<F>
where
    F: FnMut(&str) -> Option<String> + Send,
{
    fn input(&mut self, message: &str) -> anyhow::Result<Option<String>> {
        Ok((self.0)(message))
    }
}
