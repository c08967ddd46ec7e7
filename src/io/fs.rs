//! Atomic file writes and size-limited reads
//!
//! Writes go to a temporary file in the destination's own directory and are
//! renamed over the destination only once the bytes are flushed to disk. On
//! any failure the temporary file is removed and the destination keeps its
//! previous content.

use crate::error::{QuireError, Result};
use log::debug;
use std::fs::{self, File, Permissions};
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Ceiling for binder reads (10 MiB)
pub const MAX_BINDER_SIZE: u64 = 10 * 1024 * 1024;

/// Atomically replace (or create) `path` with `content`.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    write_via_temp(path, content, true)
}

/// Atomically create `path` with `content`, failing with
/// [`QuireError::NodeExists`] if something is already there.
pub fn write_atomic_new(path: &Path, content: &[u8]) -> Result<()> {
    write_via_temp(path, content, false)
}

/// Reject destinations whose mode bits make them read-only.
///
/// A missing destination is writable.
pub fn ensure_writable(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.permissions().readonly() => Err(QuireError::read_only(path)),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(QuireError::io(format!("inspecting {}", path.display()), e)),
    }
}

/// Read a whole file, refusing anything larger than `limit` bytes before
/// reading its content.
pub fn read_limited(path: &Path, limit: u64) -> Result<Vec<u8>> {
    let file =
        File::open(path).map_err(|e| QuireError::io(format!("opening {}", path.display()), e))?;

    let size = file
        .metadata()
        .map_err(|e| QuireError::io(format!("inspecting {}", path.display()), e))?
        .len();
    if size > limit {
        return Err(QuireError::file_too_large(path, size, limit));
    }

    // the file may grow between the size check and the read
    let mut content = Vec::with_capacity(size as usize);
    file.take(limit + 1)
        .read_to_end(&mut content)
        .map_err(|e| QuireError::io(format!("reading {}", path.display()), e))?;
    if content.len() as u64 > limit {
        return Err(QuireError::file_too_large(path, content.len() as u64, limit));
    }

    Ok(content)
}

fn write_via_temp(path: &Path, content: &[u8], replace: bool) -> Result<()> {
    ensure_writable(path)?;

    let parent_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp_file = NamedTempFile::new_in(parent_dir).map_err(|e| {
        QuireError::io(format!("creating temp file in {}", parent_dir.display()), e)
    })?;
    debug!(
        "Writing {} bytes to {} via {}",
        content.len(),
        path.display(),
        temp_file.path().display()
    );

    let write_err =
        |e: std::io::Error| QuireError::io(format!("writing temp file for {}", path.display()), e);
    temp_file.write_all(content).map_err(write_err)?;
    temp_file.flush().map_err(write_err)?;
    temp_file.as_file().sync_all().map_err(write_err)?;

    let permissions = destination_permissions(path, temp_file.path())?;
    fs::set_permissions(temp_file.path(), permissions).map_err(|e| {
        QuireError::io(format!("setting permissions for {}", path.display()), e)
    })?;

    // a PersistError hands the temp file back; dropping it deletes it
    let persisted = if replace {
        temp_file.persist(path)
    } else {
        temp_file.persist_noclobber(path)
    };
    persisted.map_err(|e| {
        if !replace && e.error.kind() == std::io::ErrorKind::AlreadyExists {
            QuireError::node_exists(path)
        } else {
            QuireError::io(format!("persisting {}", path.display()), e.error)
        }
    })?;

    Ok(())
}

/// Permissions the replacement should carry: the destination's own, or the
/// usual default for a new file.
fn destination_permissions(path: &Path, temp_path: &Path) -> Result<Permissions> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(metadata.permissions()),
        Err(_) => default_permissions(temp_path),
    }
}

#[cfg(unix)]
fn default_permissions(_temp_path: &Path) -> Result<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Ok(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions(temp_path: &Path) -> Result<Permissions> {
    fs::metadata(temp_path)
        .map(|m| m.permissions())
        .map_err(|e| QuireError::io(format!("inspecting {}", temp_path.display()), e))
}

/// Delete a file, labelling failures with `context`.
pub fn remove_file(path: &Path, context: &str) -> Result<()> {
    fs::remove_file(path)
        .map_err(|e| QuireError::io(format!("{} {}", context, path.display()), e))
}
