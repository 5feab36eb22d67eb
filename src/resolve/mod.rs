//! Resolvers turn a copy request into the ordered, indexed record list the copier works on.

mod directory_list;
mod index_file;
mod job_file;

pub use directory_list::DirectoryListResolver;
pub use index_file::{ResumePoint, read_resume_point, remove_resume_point, write_resume_point};
pub use job_file::{JobFileResolver, read_jobfile, write_jobfile};

use anyhow::Result;

use crate::CopyRecord;

/// Produces the full record list, indexed `0..N-1` in ascending order.
pub trait Resolver: Send {
    fn resolve(&self) -> Result<Vec<CopyRecord>>;

    /// Only the records that belong on a volume starting at `device_start_index` or later.
    fn resolve_from(&self, device_start_index: usize) -> Result<Vec<CopyRecord>> {
        let mut records = self.resolve()?;
        records.retain(|r| r.index >= device_start_index);
        Ok(records)
    }
}
