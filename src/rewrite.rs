//! Pure formatting helpers shared by the orchestrator's textual and opaque
//! branches: how a reference to an asset gets rewritten, and where an
//! asset's bytes end up on disk.

use std::path::{Path, PathBuf};

use crate::asset::Asset;

/// The in-text replacement for a reference to `asset`, once `hash` is
/// known. Always `/`-prefixed: the registry never keeps a leading `/` on a
/// logical path, so there's nothing to preserve here.
pub fn hashed_reference(asset: &Asset, hash: &str) -> String {
    format!("/{}_{hash}__.{}", asset.logical_path(), asset.extension())
}

/// The in-text replacement for a reference to an entry point: its own
/// logical path, untouched.
pub fn entry_reference(asset: &Asset) -> String {
    format!("/{}", asset.logical_path())
}

/// Where `asset`'s bytes are written under `out_dir`. Entry points keep
/// their original name; everything else gets its hash spliced into the
/// filename.
pub fn output_path_for(out_dir: &Path, asset: &Asset, hash: &str, is_entry: bool) -> PathBuf {
    if is_entry {
        out_dir.join(asset.logical_path())
    } else {
        out_dir.join(format!("{}_{hash}__.{}", asset.logical_path(), asset.extension()))
    }
}
