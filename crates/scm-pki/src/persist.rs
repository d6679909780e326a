//! Atomic, permission-restricted file writes.
//!
//! Content is written to a temporary file in the target directory, synced,
//! restricted to the owner, and only then linked into place. Readers see
//! either no file or the complete file with its final permissions. If any
//! step fails the temporary file is removed when it is dropped.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Mode applied to directories created for security material.
pub const DIR_MODE: u32 = 0o700;

/// Mode applied to written files.
pub const FILE_MODE: u32 = 0o600;

/// What to do when the target file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Fail with [`Error::FileAlreadyExists`] and leave the file untouched.
    #[default]
    CreateNew,
    /// Atomically replace the existing file.
    Overwrite,
}

impl WriteMode {
    /// Maps a boolean `overwrite` flag to a mode.
    #[must_use]
    pub const fn from_overwrite(overwrite: bool) -> Self {
        if overwrite { Self::Overwrite } else { Self::CreateNew }
    }
}

/// Writes `contents` to `path`, creating missing parent directories.
pub(crate) fn write_atomic(path: &Path, contents: &[u8], mode: WriteMode) -> Result<()> {
    if mode == WriteMode::CreateNew && path.exists() {
        warn!(path = %path.display(), "refusing to overwrite existing file");
        return Err(Error::FileAlreadyExists {
            path: path.to_path_buf(),
        });
    }

    let dir = parent_dir(path);
    ensure_private_dir(dir)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    tmp.write_all(contents).map_err(|e| Error::io(tmp.path(), e))?;
    restrict_file(tmp.as_file()).map_err(|e| Error::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| Error::io(tmp.path(), e))?;

    match mode {
        WriteMode::Overwrite => {
            tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
        }
        WriteMode::CreateNew => {
            tmp.persist_noclobber(path).map_err(|e| {
                if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                    warn!(path = %path.display(), "lost create race for file");
                }
                Error::io(path, e.error)
            })?;
        }
    }

    sync_dir(dir);

    info!(path = %path.display(), bytes = contents.len(), ?mode, "wrote file");

    Ok(())
}

/// Reads a UTF-8 text file.
pub(crate) fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "read file");
    String::from_utf8(bytes)
        .map_err(|e| Error::Encoding(format!("{} is not valid UTF-8: {e}", path.display())))
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Creates `dir` and any missing parents; created directories get [`DIR_MODE`].
fn ensure_private_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(dir).map_err(|e| Error::io(dir, e))?;

    debug!(dir = %dir.display(), "created directory");
    Ok(())
}

fn restrict_file(file: &fs::File) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(FILE_MODE))?;
    }
    #[cfg(not(unix))]
    {
        let _ = file;
    }
    Ok(())
}

/// Makes the directory entry durable. Failure only weakens crash durability,
/// so it is logged rather than returned.
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    {
        if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
            debug!(dir = %dir.display(), error = %e, "directory sync failed");
        }
    }
    #[cfg(not(unix))]
    {
        let _ = dir;
    }
}
