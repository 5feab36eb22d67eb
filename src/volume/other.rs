//! Free-space probe for platforms without `statvfs`, using sysinfo disks.

use std::io;
use std::path::Path;
use sysinfo::Disks;

pub(super) fn available_bytes(path: &Path) -> io::Result<u64> {
    let canonical = path.canonicalize()?;
    let disks = Disks::new_with_refreshed_list();
    disks
        .iter()
        .filter(|d| canonical.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
        .map(|d| d.available_space())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no disk found for {}", path.display()),
            )
        })
}
