//! Loads the `recache.ignore` file: a JSON object mapping candidate strings
//! the scanner should treat as if they never resolved to anything to `true`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::asset::IgnoreSet;
use crate::error::Error;

/// Reads `path` as a JSON object of `candidate -> true` and builds an
/// [`IgnoreSet`] from its keys. A missing file is not an error: it simply
/// means nothing is ignored.
pub fn load(path: &Path) -> Result<IgnoreSet, Error> {
    if !path.is_file() {
        return Ok(IgnoreSet::default());
    }

    let text = fs::read_to_string(path).map_err(|source| Error::IgnoreList { path: path.to_owned(), source })?;
    let entries: BTreeMap<String, bool> = serde_json::from_str(&text)
        .map_err(|source| Error::IgnoreListFormat { path: path.to_owned(), source })?;

    Ok(IgnoreSet::new(entries.into_keys()))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_file_yields_an_empty_set() {
        let dir = tempdir().unwrap();
        let set = load(&dir.path().join("recache.ignore")).unwrap();
        assert!(!set.contains("/anything.js"));
    }

    #[test]
    fn loads_a_json_object_of_candidates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recache.ignore");
        std::fs::write(&path, r#"{"/debug.js": true, "legacy/old.css": true}"#).unwrap();

        let set = load(&path).unwrap();
        assert!(set.contains("/debug.js"));
        assert!(set.contains("legacy/old.css"));
        assert!(!set.contains("/other.js"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("recache.ignore");
        std::fs::write(&path, "not json").unwrap();

        assert!(load(&path).is_err());
    }
}
