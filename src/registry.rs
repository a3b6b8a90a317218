//! Builds a [`FileRegistry`] by walking a set of search roots on disk.
//! Every regular file found becomes an [`Asset`], registered under its
//! path relative to the root it was found under.

use std::path::Path;

use walkdir::WalkDir;

use crate::asset::{Asset, FileRegistry};

/// Walks every directory in `roots`, in order, inserting one asset per
/// regular file found. A file under an earlier root always wins over a
/// same-named file under a later root (see [`FileRegistry::insert`]).
pub fn build(roots: &[impl AsRef<Path>]) -> FileRegistry {
    let mut registry = FileRegistry::new();

    for root in roots {
        let root = root.as_ref();
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }

            let disk_path = entry.path();
            let Ok(relative) = disk_path.strip_prefix(root) else {
                continue;
            };
            let logical_path = relative.to_string_lossy().replace('\\', "/");
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);

            registry.insert(Asset::new(disk_path.to_owned(), logical_path, size));
        }
    }

    registry
}
