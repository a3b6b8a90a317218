//! Materializing bytes onto disk: create-parent-dirs, write to a sibling
//! temp file, rename into place. Never clobbers a file that already exists
//! under its final name, since a content-addressed name only ever denotes
//! one set of bytes.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub trait Emitter {
    /// Writes `bytes` to `path` unless `path` already exists as a regular
    /// file, in which case this is a no-op (the hash in the name already
    /// vouches for the content).
    fn write_text(&self, path: &Path, bytes: &[u8]) -> Result<(), Error>;

    /// Copies the file at `src` to `path`, under the same idempotence rule
    /// as [`Self::write_text`].
    fn copy_binary(&self, src: &Path, path: &Path) -> Result<(), Error>;
}

#[derive(Debug, Default)]
pub struct FsEmitter;

impl Emitter for FsEmitter {
    fn write_text(&self, path: &Path, bytes: &[u8]) -> Result<(), Error> {
        if path.is_file() {
            tracing::debug!(path = %path.display(), "already present, skipping emission");
            return Ok(());
        }

        create_parent(path)?;
        let tmp = sibling_tmp_path(path);
        fs::write(&tmp, bytes).map_err(|source| Error::Emit { path: path.to_owned(), source })?;
        finish_atomic_write(&tmp, path)?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "emitted");
        Ok(())
    }

    fn copy_binary(&self, src: &Path, path: &Path) -> Result<(), Error> {
        if path.is_file() {
            tracing::debug!(path = %path.display(), "already present, skipping emission");
            return Ok(());
        }

        create_parent(path)?;
        let tmp = sibling_tmp_path(path);
        fs::copy(src, &tmp).map_err(|source| Error::Emit { path: path.to_owned(), source })?;
        finish_atomic_write(&tmp, path)?;
        tracing::info!(path = %path.display(), src = %src.display(), "emitted");
        Ok(())
    }
}

fn create_parent(path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::Emit { path: path.to_owned(), source })?;
    }
    Ok(())
}

fn finish_atomic_write(tmp: &Path, dst: &Path) -> Result<(), Error> {
    match fs::rename(tmp, dst) {
        Ok(()) => Ok(()),
        Err(source) => {
            let _ = fs::remove_file(tmp);
            Err(Error::Emit { path: dst.to_owned(), source })
        }
    }
}

/// `dst` with `.{pid}.tmp` appended to its file name, so concurrent runs
/// against the same output tree never collide on the temp file.
fn sibling_tmp_path(dst: &Path) -> PathBuf {
    let pid = std::process::id();
    let file_name = dst.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    dst.with_file_name(format!("{file_name}.{pid}.tmp"))
}
