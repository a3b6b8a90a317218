//! Content-addressed web-asset cache builder.
//!
//! Given a set of entry files and a collection of search roots, [`run`]
//! discovers the transitive closure of textual and binary assets those
//! entries reference, computes a Merkle-style content hash for each one,
//! rewrites references to the hashed output names, and materializes the
//! result into an output directory.

pub mod asset;
pub mod clock;
pub mod config;
pub mod emitter;
pub mod error;
pub mod hash;
pub mod ignore;
pub mod orchestrator;
pub mod registry;
pub mod resolver;
pub mod rewrite;
pub mod scanner;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub use config::Config;
pub use error::Error;

use clock::SystemClock;
use emitter::FsEmitter;
use orchestrator::Orchestrator;
use resolver::ResolverConfig;

/// The outcome of a full run: where things were written, and what failed
/// to resolve.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub not_found: BTreeMap<String, bool>,
}

/// Runs the whole pipeline against `config`: builds the file registry from
/// `config.roots`, loads the ignore list, walks the entry points, and
/// emits the hashed cache tree.
pub fn run(config: &Config) -> Result<RunReport, Error> {
    let registry = registry::build(&config.roots);
    let entries = config.entry_set();
    let ignore = ignore::load(&config.ignore_file)?;
    let resolver_config = ResolverConfig::default();
    let emitter = FsEmitter;
    let clock = SystemClock;

    let mut orchestrator =
        Orchestrator::new(&registry, &entries, &ignore, &resolver_config, &emitter, &clock, &config.out);
    orchestrator.run()?;

    write_not_found_report(&config.notfound_file, orchestrator.not_found())?;

    Ok(RunReport { not_found: orchestrator.not_found().clone() })
}

fn write_not_found_report(path: &Path, not_found: &BTreeMap<String, bool>) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(not_found)
        .expect("a BTreeMap<String, bool> always serializes");
    fs::write(path, json).map_err(|source| Error::NotFoundReport { path: path.to_owned(), source })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn end_to_end_run_emits_and_writes_a_not_found_report() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("index.html"), r#"<script src="/app.js"></script><img src="/missing.png">"#).unwrap();
        fs::write(src.join("app.js"), "console.log(42);").unwrap();

        let config = Config {
            entries: vec!["index.html".into()],
            roots: vec![src],
            out: dir.path().join("cache"),
            ignore_file: dir.path().join("recache.ignore"),
            notfound_file: dir.path().join("recache.notfound"),
            ..Config::default()
        };

        let report = run(&config).unwrap();
        assert!(report.not_found.contains_key("/missing.png"));

        let notfound_on_disk = fs::read_to_string(&config.notfound_file).unwrap();
        assert!(notfound_on_disk.contains("/missing.png"));

        let emitted: Vec<_> = fs::read_dir(&config.out).unwrap().filter_map(Result::ok).collect();
        assert_eq!(emitted.len(), 2);
    }
}
