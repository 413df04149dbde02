//! Atomic file operations
//!
//! Snapshots and committed index generations are written with the
//! temp-file pattern so a crash leaves either the old or the new file:
//!
//! 1. Write to a temporary file (.tmp)
//! 2. Call sync_all() to flush to disk
//! 3. Rename temp file to final path (atomic on most filesystems)

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Atomically write a file using a writer function
///
/// The writer is buffered; it is flushed and synced before the rename.
///
/// # Example
///
/// ```ignore
/// atomic_write_with("data/snapshots/latest.jsonl", |file| {
///     writeln!(file, "line1")?;
///     Ok(())
/// })?;
/// ```
pub fn atomic_write_with<P, F>(path: P, write_fn: F) -> io::Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(&temp_path)?);
    write_fn(&mut writer)?;
    writer.flush()?;

    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Rename `from` over `to`, first moving an existing `to` to `backup`
///
/// # Returns
///
/// * `Ok(true)` - File was renamed successfully
/// * `Ok(false)` - Source file doesn't exist
pub fn safe_rename<P1, P2, P3>(from: P1, to: P2, backup: Option<P3>) -> io::Result<bool>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
    P3: AsRef<Path>,
{
    let from = from.as_ref();
    let to = to.as_ref();

    if !from.exists() {
        return Ok(false);
    }

    if let Some(backup_path) = backup {
        if to.exists() {
            let backup = backup_path.as_ref();
            if backup.exists() {
                fs::remove_file(backup)?;
            }
            fs::rename(to, backup)?;
        }
    }

    fs::rename(from, to)?;

    Ok(true)
}

/// Remove `.tmp` files left behind by interrupted writes
///
/// Call this on startup, before anything else writes into `dir`.
pub fn cleanup_temp_files<P: AsRef<Path>>(dir: P) -> io::Result<usize> {
    let dir = dir.as_ref();
    let mut cleaned = 0;

    if !dir.exists() {
        return Ok(0);
    }

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();

        if path.extension().map(|e| e == "tmp").unwrap_or(false) {
            fs::remove_file(&path)?;
            cleaned += 1;
        }
    }

    Ok(cleaned)
}
