//! The data model shared by every stage of the pipeline: [`Asset`], the
//! [`FileRegistry`] it lives in, and the small sets ([`EntrySet`],
//! [`IgnoreSet`]) that configure a run.

use std::path::{Path, PathBuf};

use ahash::{AHashMap, AHashSet};

/// The extensions the [`FileRegistry`] builder treats as textual, i.e.
/// candidates for scanning and reference rewriting. Everything else is
/// opaque and only ever copied byte-for-byte.
pub const TEXTUAL_EXTENSIONS: &[&str] = &["js", "mjs", "html", "css", "dae", "json"];

/// Assets larger than this are always treated as opaque, even if their
/// extension is one of [`TEXTUAL_EXTENSIONS`]. Scanning a multi-megabyte
/// generated file line-by-line isn't worth it, and such files are rarely
/// hand-edited references anyway.
pub const MAX_TEXTUAL_BYTES: u64 = 5 * 1024 * 1024;

/// A single registered file.
///
/// Assets are created once, by whatever enumerates the search roots (see
/// [`crate::registry`]), and are immutable afterwards: the hash fields that
/// the [`crate::orchestrator::Orchestrator`] computes live in its own
/// `ProcessingState`, not on the `Asset` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Path to the file on disk.
    disk_path: PathBuf,

    /// The path by which other files refer to this asset, e.g. `app.js` or
    /// `img/logo.png`. Never has a leading `/`; the registry indexes both
    /// the bare and the `/`-prefixed form against the same `Asset`.
    logical_path: String,

    /// `logical_path` with its extension (and the preceding `.`) removed.
    base: String,

    /// The file extension, without the leading `.`. Empty if the file has
    /// none.
    extension: String,

    /// Whether this asset is scanned and rewritten (`true`) or copied
    /// verbatim (`false`). See [`TEXTUAL_EXTENSIONS`] and
    /// [`MAX_TEXTUAL_BYTES`].
    is_textual: bool,
}

impl Asset {
    /// Creates a new asset for a file at `disk_path`, registered under
    /// `logical_path`. `size` is the file's size in bytes, used to decide
    /// whether it's treated as textual.
    pub fn new(disk_path: PathBuf, logical_path: impl Into<String>, size: u64) -> Self {
        let logical_path = logical_path.into();
        let logical_path = logical_path
            .strip_prefix('/')
            .map(str::to_owned)
            .unwrap_or(logical_path);

        let (base, extension) = split_extension(&logical_path);
        let is_textual = size < MAX_TEXTUAL_BYTES
            && TEXTUAL_EXTENSIONS.contains(&extension.as_str());

        Self {
            disk_path,
            base,
            extension,
            is_textual,
            logical_path,
        }
    }

    pub fn disk_path(&self) -> &Path {
        &self.disk_path
    }

    pub fn logical_path(&self) -> &str {
        &self.logical_path
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn is_textual(&self) -> bool {
        self.is_textual
    }

    /// The logical directory containing this asset, i.e. `logical_path`
    /// with its final path segment removed. Empty string for top-level
    /// assets.
    pub fn logical_dir(&self) -> &str {
        match self.logical_path.rfind('/') {
            Some(pos) => &self.logical_path[..pos],
            None => "",
        }
    }
}

/// Splits `path` into `(base, extension)`, where `extension` has no leading
/// `.`. A path with no `.` after its last `/` has an empty extension and
/// `base == path`.
fn split_extension(path: &str) -> (String, String) {
    let file_name_start = path.rfind('/').map(|p| p + 1).unwrap_or(0);
    match path[file_name_start..].rfind('.') {
        Some(pos) => {
            let dot = file_name_start + pos;
            (path[..dot].to_owned(), path[dot + 1..].to_owned())
        }
        None => (path.to_owned(), String::new()),
    }
}

/// `{ logical_path → Asset }`, as built by an external enumerator and
/// consumed read-only by the core.
///
/// Each asset is reachable under both `p/q` and `/p/q`; whichever asset was
/// inserted first under a given key wins.
#[derive(Debug, Default)]
pub struct FileRegistry {
    assets: AHashMap<String, Asset>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `asset`, indexing it under both its bare and
    /// `/`-prefixed logical path. Does nothing if either key is already
    /// occupied (first-wins).
    pub fn insert(&mut self, asset: Asset) {
        let bare = asset.logical_path().to_owned();
        let absolute = format!("/{bare}");

        self.assets.entry(bare).or_insert_with(|| asset.clone());
        self.assets.entry(absolute).or_insert(asset);
    }

    /// Looks up `logical_path` exactly as given (no normalization).
    pub fn get(&self, logical_path: &str) -> Option<&Asset> {
        self.assets.get(logical_path)
    }

    pub fn len(&self) -> usize {
        // Every asset is indexed twice; the bare key is canonical.
        self.assets.keys().filter(|k| !k.starts_with('/')).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the distinct immediate child directory names found directly
    /// under `prefix` among all registered assets, used by the resolver's
    /// fallback search. Computed on demand from the registry rather than
    /// stored per-asset, since it's a property of the whole tree, not of any
    /// one file.
    pub fn child_dirs_of(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.trim_end_matches('/');
        let mut dirs: Vec<String> = self
            .assets
            .keys()
            .filter(|k| !k.starts_with('/'))
            .filter_map(|k| {
                let rest = format!("/{k}").strip_prefix(prefix)?.strip_prefix('/')?.to_owned();
                let name = rest.split('/').next()?;
                if name.is_empty() || !rest.contains('/') {
                    None
                } else {
                    Some(name.to_owned())
                }
            })
            .collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }
}

/// Ordered list of logical paths designated as entry points. Entries keep
/// their on-disk filename in the output and are never descended into from
/// another file (they may only be roots of a traversal).
#[derive(Debug, Clone)]
pub struct EntrySet {
    entries: Vec<String>,
    lookup: AHashSet<String>,
}

impl EntrySet {
    pub fn new(entries: Vec<String>) -> Self {
        let lookup = entries.iter().map(|e| normalize(e)).collect();
        Self { entries, lookup }
    }

    /// The default entry set used when no configuration overrides it.
    pub fn default_entries() -> Self {
        Self::new(vec!["index.html".to_owned(), "tester.html".to_owned()])
    }

    pub fn contains(&self, logical_path: &str) -> bool {
        self.lookup.contains(&normalize(logical_path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

fn normalize(path: &str) -> String {
    path.trim_start_matches('/').to_owned()
}

/// Set of candidate strings the scanner must silently discard, as if they
/// had resolved to nothing.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet(AHashSet<String>);

impl IgnoreSet {
    pub fn new(candidates: impl IntoIterator<Item = String>) -> Self {
        Self(candidates.into_iter().collect())
    }

    pub fn contains(&self, candidate: &str) -> bool {
        self.0.contains(candidate)
    }
}
