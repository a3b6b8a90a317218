use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to write cache output '{path}': {source}")]
    Emit { path: PathBuf, #[source] source: io::Error },

    #[error("failed to load ignore list '{path}': {source}")]
    IgnoreList { path: PathBuf, #[source] source: io::Error },

    #[error("malformed ignore list '{path}': {source}")]
    IgnoreListFormat { path: PathBuf, #[source] source: serde_json::Error },

    #[error("failed to write not-found report '{path}': {source}")]
    NotFoundReport { path: PathBuf, #[source] source: io::Error },

    #[error("entry point '{path}' could not be read")]
    EntryUnreadable { path: PathBuf },

    #[error(
        "'{asset}' is still part of an unresolved cyclic dependency after its \
         deferred rerun; this tool only breaks simple two-party cycles"
    )]
    MultiCycle { asset: String },
}
