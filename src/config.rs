//! The small, serializable knobs a run is parameterized by. Built either
//! from parsed CLI arguments (the `recache` binary) or directly by an
//! embedding application.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::asset::EntrySet;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logical paths of the entry points. Empty means "use the default
    /// entry set" (see [`EntrySet::default_entries`]).
    pub entries: Vec<String>,

    /// Enables informational (`info`-level) logging of what gets emitted.
    pub verbose: bool,

    /// Enables debug-level logging of cycle detection.
    pub loops: bool,

    /// Search roots enumerated to build the file registry.
    pub roots: Vec<PathBuf>,

    /// Output cache directory.
    pub out: PathBuf,

    /// Path to the ignore-list JSON.
    pub ignore_file: PathBuf,

    /// Path to the not-found report this run writes.
    pub notfound_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            verbose: false,
            loops: false,
            roots: Vec::new(),
            out: PathBuf::from("cache"),
            ignore_file: PathBuf::from("recache.ignore"),
            notfound_file: PathBuf::from("recache.notfound"),
        }
    }
}

impl Config {
    /// The [`EntrySet`] this configuration describes: the configured
    /// `entries` if any were given, otherwise the built-in defaults.
    pub fn entry_set(&self) -> EntrySet {
        if self.entries.is_empty() {
            EntrySet::default_entries()
        } else {
            EntrySet::new(self.entries.clone())
        }
    }
}
