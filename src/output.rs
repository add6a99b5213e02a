//! Write-back of edited contents.
//!
//! Files are replaced atomically (tempfile in the same directory, fsync,
//! rename) and their mtime is bumped so incremental builds notice.

use crate::safety::{SafetyError, WorkspaceGuard};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} has no parent directory")]
    NoParent { path: PathBuf },

    #[error(transparent)]
    Safety(#[from] SafetyError),
}

/// Write every entry of `files`, returning the paths actually written.
///
/// Files whose current contents already equal the new contents are left
/// alone. With a guard, each path is resolved and rechecked right before it
/// is replaced. Writing stops at the first failure; files already written
/// stay written.
pub fn write_edited_files(
    files: &BTreeMap<PathBuf, String>,
    guard: Option<&WorkspaceGuard>,
) -> Result<Vec<PathBuf>, WriteError> {
    let mut written = Vec::new();

    for (file, contents) in files {
        let path = match guard {
            Some(guard) => guard.resolve(file)?,
            None => file.clone(),
        };

        if std::fs::read_to_string(&path).is_ok_and(|current| current == *contents) {
            log::debug!("{} unchanged, skipping write", path.display());
            continue;
        }

        if let Some(guard) = guard {
            guard.recheck(&path)?;
        }
        atomic_write(&path, contents.as_bytes())?;
        log::info!("wrote {}", path.display());
        written.push(path);
    }

    Ok(written)
}

/// Atomic file write: tempfile + fsync + rename, then touch mtime.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<(), WriteError> {
    let io_err = |source: std::io::Error| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
        Some(parent) => parent,
        None => {
            return Err(WriteError::NoParent {
                path: path.to_path_buf(),
            })
        }
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    temp.write_all(content).map_err(io_err)?;
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;

    filetime::set_file_mtime(path, filetime::FileTime::now()).map_err(io_err)?;
    Ok(())
}
