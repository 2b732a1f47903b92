//! Crash-safe file replacement.
use std::{fs, io::Write, path::Path};

/// Write `bytes` to a sibling temp file, fsync it, rename over `path`, then
/// fsync the directory so the rename itself is durable.
///
/// A reader sees either the previous file or the complete new one, never a
/// partial write. The temp file is removed if the write or the rename fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    let written = (|| {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()
    })()
    .and_then(|()| fs::rename(&tmp, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    sync_parent(path)
}

#[cfg(unix)]
fn sync_parent(path: &Path) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::File::open(dir)?.sync_all()
}

// Directory handles cannot be fsynced here; rename is as durable as it gets.
#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
