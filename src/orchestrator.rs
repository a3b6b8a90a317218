//! The dependency orchestrator: walks the reference graph depth-first from
//! each entry point, computing a Merkle-style content hash for every asset
//! it reaches and emitting the hashed output tree as it goes.
//!
//! Cycles are broken rather than rejected. The first asset to notice it's
//! revisiting one of its own ancestors hashes that ancestor's on-disk bytes
//! as a stand-in (`plain_hash`) and keeps going; the asset that used the
//! stand-in is queued for a second pass once the ancestor's real hash is
//! known. See [`Self::process`] and [`Self::complete`] for the mechanics.

use std::collections::BTreeMap;
use std::path::PathBuf;

use ahash::{AHashMap, AHashSet};

use crate::asset::{Asset, EntrySet, FileRegistry, IgnoreSet};
use crate::clock::Clock;
use crate::emitter::Emitter;
use crate::error::Error;
use crate::hash;
use crate::resolver::{Resolution, Resolver, ResolverConfig};
use crate::rewrite;
use crate::scanner;

/// What [`Orchestrator::process`] reports back to whichever line discovered
/// the dependency.
enum Outcome {
    /// A usable hash for this asset — either its real, final Merkle hash,
    /// or (if the asset is itself mid-cycle) the interim hash it computed
    /// over its own first-pass output. Either way, safe for a caller to
    /// splice into a reference right now.
    Done(String),

    /// `asset` is a direct ancestor of the current call stack: a true
    /// cycle. Carries its `plain_hash` if one could be computed.
    Pending(Option<String>),

    /// `asset` is an entry point, and some asset is already being
    /// processed — entries are only ever traversal roots, never
    /// dependencies of another file.
    Entry,
}

#[derive(Default)]
struct ProcessingState {
    in_progress: AHashSet<String>,
    done: AHashSet<String>,
    plain_hash: AHashMap<String, String>,
    special_hash: AHashMap<String, String>,
    merkle_hash: AHashMap<String, String>,
    /// asset → the dependents waiting on it to finish before they can be
    /// correctly reprocessed.
    pending: AHashMap<String, Vec<String>>,
    inv_pending: AHashSet<String>,
    /// Failed resolutions worth reporting, keyed by the literal candidate
    /// text. `BTreeMap` so the JSON report has a stable key order.
    not_found: BTreeMap<String, bool>,
}

pub struct Orchestrator<'a> {
    registry: &'a FileRegistry,
    entries: &'a EntrySet,
    ignore: &'a IgnoreSet,
    resolver_config: &'a ResolverConfig,
    emitter: &'a dyn Emitter,
    clock: &'a dyn Clock,
    out_dir: PathBuf,
    state: ProcessingState,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        registry: &'a FileRegistry,
        entries: &'a EntrySet,
        ignore: &'a IgnoreSet,
        resolver_config: &'a ResolverConfig,
        emitter: &'a dyn Emitter,
        clock: &'a dyn Clock,
        out_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            entries,
            ignore,
            resolver_config,
            emitter,
            clock,
            out_dir: out_dir.into(),
            state: ProcessingState::default(),
        }
    }

    /// Processes every entry point in turn, emitting the full output tree.
    ///
    /// An entry point that can't be read at all is a hard error: unlike a
    /// read failure on some asset mid-graph (logged and left unresolved),
    /// the caller asked for this exact file to be built and got nothing.
    pub fn run(&mut self) -> Result<(), Error> {
        let paths: Vec<String> = self.entries.iter().map(str::to_owned).collect();
        for path in paths {
            match self.registry.get(&path).cloned() {
                Some(asset) => {
                    if let Outcome::Pending(_) = self.process(&asset, false)? {
                        return Err(Error::EntryUnreadable { path: asset.disk_path().to_owned() });
                    }
                }
                None => {
                    tracing::warn!(entry = %path, "entry point not found in the file registry, skipping");
                }
            }
        }
        Ok(())
    }

    /// Candidates that looked like a path (contained a `/`) but never
    /// resolved to a registered asset, keyed by their literal text.
    pub fn not_found(&self) -> &BTreeMap<String, bool> {
        &self.state.not_found
    }

    fn process(&mut self, asset: &Asset, pending_ok: bool) -> Result<Outcome, Error> {
        let key = asset.logical_path().to_owned();

        // 1. Entry guard: entries are roots, never mid-graph dependencies.
        if !self.state.in_progress.is_empty() && self.entries.contains(&key) {
            return Ok(Outcome::Entry);
        }

        // 2. Cycle detection: asset is a live ancestor on the call stack.
        if self.state.in_progress.contains(&key) {
            if !self.state.plain_hash.contains_key(&key) {
                match std::fs::read(asset.disk_path()) {
                    Ok(bytes) => {
                        self.state.plain_hash.insert(key.clone(), hash::short_hash(&bytes));
                    }
                    Err(source) => {
                        tracing::error!(path = %asset.disk_path().display(), %source, "read failed while breaking a cycle");
                    }
                }
            }
            tracing::debug!(asset = %key, "cyclic reference detected");
            return Ok(Outcome::Pending(self.state.plain_hash.get(&key).cloned()));
        }

        // 3. Idempotence: already fully processed.
        if self.state.done.contains(&key) {
            let hash = self
                .state
                .merkle_hash
                .get(&key)
                .cloned()
                .expect("an asset in `done` always has a merkle hash");
            return Ok(Outcome::Done(hash));
        }

        // 4. Claim it.
        self.state.in_progress.insert(key.clone());

        if asset.is_textual() {
            self.process_textual(asset, &key, pending_ok)
        } else {
            self.process_opaque(asset, &key)
        }
    }

    fn process_textual(&mut self, asset: &Asset, key: &str, pending_ok: bool) -> Result<Outcome, Error> {
        let bytes = match std::fs::read(asset.disk_path()) {
            Ok(bytes) => bytes,
            Err(source) => {
                tracing::error!(path = %asset.disk_path().display(), %source, "read failed, skipping");
                self.state.in_progress.remove(key);
                return Ok(Outcome::Pending(None));
            }
        };
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();

        let first_line = lines.first().map(String::as_str).unwrap_or("");
        if let Some(stamp) = timestamp_line(asset.extension(), first_line, &self.clock.now()) {
            lines.insert(0, stamp);
        }

        let mut come_back_later = false;
        let mut out_lines = Vec::with_capacity(lines.len());
        for line in &lines {
            let (rewritten, deferred) = self.rewrite_line(asset, line)?;
            come_back_later |= deferred;
            out_lines.push(rewritten);
        }
        let out = out_lines.join("\n");

        if come_back_later {
            if pending_ok {
                tracing::warn!(asset = %key, "still cyclic after its deferred rerun, aborting");
                return Err(Error::MultiCycle { asset: key.to_owned() });
            }
            self.state.special_hash.insert(key.to_owned(), hash::hash_lines(&out_lines));
            return Ok(Outcome::Done(self.state.special_hash[key].clone()));
        }

        let final_hash = if pending_ok {
            self.state
                .special_hash
                .get(key)
                .cloned()
                .expect("a deferred rerun always has a first-pass special hash")
        } else {
            self.state
                .special_hash
                .get(key)
                .cloned()
                .unwrap_or_else(|| hash::hash_lines(&out_lines))
        };
        self.state.merkle_hash.insert(key.to_owned(), final_hash.clone());

        let is_entry = self.entries.contains(key);
        let out_path = rewrite::output_path_for(&self.out_dir, asset, &final_hash, is_entry);
        self.emitter.write_text(&out_path, out.as_bytes())?;

        self.complete(key)?;
        Ok(Outcome::Done(final_hash))
    }

    fn process_opaque(&mut self, asset: &Asset, key: &str) -> Result<Outcome, Error> {
        if !self.state.plain_hash.contains_key(key) {
            match std::fs::read(asset.disk_path()) {
                Ok(bytes) => {
                    self.state.plain_hash.insert(key.to_owned(), hash::short_hash(&bytes));
                }
                Err(source) => {
                    tracing::error!(path = %asset.disk_path().display(), %source, "read failed, skipping");
                    self.state.in_progress.remove(key);
                    return Ok(Outcome::Pending(None));
                }
            }
        }
        let final_hash = self.state.plain_hash[key].clone();
        self.state.merkle_hash.insert(key.to_owned(), final_hash.clone());

        let is_entry = self.entries.contains(key);
        let out_path = rewrite::output_path_for(&self.out_dir, asset, &final_hash, is_entry);
        self.emitter.copy_binary(asset.disk_path(), &out_path)?;

        self.complete(key)?;
        Ok(Outcome::Done(final_hash))
    }

    /// Rewrites one already-extracted line: resolves each candidate,
    /// recursively processes whatever it resolves to, and substitutes the
    /// matched span accordingly. Returns the rewritten line and whether any
    /// candidate in it came back `Pending`.
    fn rewrite_line(&mut self, referrer: &Asset, line: &str) -> Result<(String, bool), Error> {
        let scanned = scanner::scan_line(line, self.ignore);
        if scanned.drop_line {
            return Ok((String::new(), false));
        }
        if scanned.candidates.is_empty() {
            return Ok((line.to_owned(), false));
        }

        let mut deferred = false;
        let mut out = String::with_capacity(line.len());
        let mut last = 0;

        for candidate in &scanned.candidates {
            out.push_str(&line[last..candidate.start]);
            last = candidate.end;

            let resolution = {
                let resolver = Resolver::new(self.registry, self.resolver_config);
                resolver.resolve_detailed(referrer, &candidate.text)
            };

            match resolution {
                Resolution::Found(target) => {
                    let outcome = self.process(target, false)?;
                    match outcome {
                        Outcome::Entry => out.push_str(&rewrite::entry_reference(target)),
                        Outcome::Done(hash) => out.push_str(&rewrite::hashed_reference(target, &hash)),
                        Outcome::Pending(plain_hash) => {
                            deferred = true;
                            self.state
                                .pending
                                .entry(target.logical_path().to_owned())
                                .or_default()
                                .push(referrer.logical_path().to_owned());
                            self.state.inv_pending.insert(referrer.logical_path().to_owned());

                            match plain_hash {
                                Some(h) => out.push_str(&rewrite::hashed_reference(target, &h)),
                                None => out.push_str(&candidate.text),
                            }
                        }
                    }
                }
                Resolution::SelfReference => {
                    out.push_str(&candidate.text);
                }
                Resolution::NotFound => {
                    if candidate.text.contains('/') {
                        self.state.not_found.insert(candidate.text.clone(), true);
                    }
                    out.push_str(&candidate.text);
                }
            }
        }
        out.push_str(&line[last..]);
        Ok((out, deferred))
    }

    /// Step 8: an asset has just emitted successfully. Marks it done and
    /// wakes up anything that was waiting on it.
    fn complete(&mut self, key: &str) -> Result<(), Error> {
        self.state.in_progress.remove(key);
        self.state.done.insert(key.to_owned());

        let dependents = self.state.pending.remove(key).unwrap_or_default();
        for dependent in dependents {
            self.state.in_progress.remove(&dependent);
            self.state.inv_pending.remove(&dependent);
            self.state.done.remove(&dependent);

            if let Some(asset) = self.registry.get(&dependent).cloned() {
                self.process(&asset, true)?;
            }
        }
        Ok(())
    }
}

/// The `Updated:` comment line prepended to certain textual assets, or
/// `None` if this extension/content combination doesn't get one. `.json`
/// and `.dae` never get a stamp (there's no comment syntax to borrow);
/// `.js`/`.mjs` only get one when the file doesn't already open with a
/// JSON-style object literal.
fn timestamp_line(extension: &str, first_line: &str, now: &str) -> Option<String> {
    match extension {
        "html" | "css" => Some(format!("<!-- Updated: {now} -->")),
        "js" | "mjs" if !first_line.starts_with('{') => Some(format!("// Updated: {now}")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::clock::FixedClock;
    use crate::emitter::FsEmitter;

    fn write(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn run(dir: &std::path::Path, registry: FileRegistry, entries: EntrySet) -> (BTreeMap<String, bool>, PathBuf) {
        let ignore = IgnoreSet::default();
        let config = ResolverConfig::default();
        let emitter = FsEmitter;
        let clock = FixedClock("1000");
        let out_dir = dir.join("cache");

        let mut orch = Orchestrator::new(&registry, &entries, &ignore, &config, &emitter, &clock, &out_dir);
        orch.run().unwrap();
        (orch.not_found().clone(), out_dir)
    }

    #[test]
    fn emits_entry_and_single_dependency_with_hashed_name() {
        let dir = tempdir().unwrap();
        let src = write(dir.path(), "src/index.html", r#"<script src="/app.js"></script>"#);
        write(dir.path(), "src/app.js", "console.log(1);");

        let mut registry = FileRegistry::new();
        registry.insert(Asset::new(src, "index.html", 40));
        registry.insert(Asset::new(dir.path().join("src/app.js"), "app.js", 16));

        let entries = EntrySet::new(vec!["index.html".into()]);
        let (not_found, out_dir) = run(dir.path(), registry, entries);

        assert!(not_found.is_empty());
        let index = fs::read_to_string(out_dir.join("index.html")).unwrap();
        assert!(!index.contains("/app.js\""), "reference should have been rewritten: {index}");
        assert!(index.contains("__.js"));

        let emitted: Vec<_> = fs::read_dir(&out_dir).unwrap().filter_map(Result::ok).collect();
        assert_eq!(emitted.len(), 2);
    }

    #[test]
    fn unresolved_path_like_reference_is_recorded_in_not_found() {
        let dir = tempdir().unwrap();
        let src = write(dir.path(), "src/index.html", r#"<script src="/missing/thing.js"></script>"#);

        let mut registry = FileRegistry::new();
        registry.insert(Asset::new(src, "index.html", 50));
        let entries = EntrySet::new(vec!["index.html".into()]);

        let (not_found, out_dir) = run(dir.path(), registry, entries);

        assert!(not_found.contains_key("/missing/thing.js"));
        let index = fs::read_to_string(out_dir.join("index.html")).unwrap();
        assert!(index.contains("/missing/thing.js"));
    }

    #[test]
    fn two_file_cycle_resolves_and_both_emit_exactly_once() {
        let dir = tempdir().unwrap();
        let src = write(dir.path(), "src/index.html", r#"<script src="/a.js"></script>"#);
        write(dir.path(), "src/a.js", r#"import "/b.js";"#);
        write(dir.path(), "src/b.js", r#"import "/a.js";"#);

        let mut registry = FileRegistry::new();
        registry.insert(Asset::new(src, "index.html", 40));
        registry.insert(Asset::new(dir.path().join("src/a.js"), "a.js", 20));
        registry.insert(Asset::new(dir.path().join("src/b.js"), "b.js", 20));

        let entries = EntrySet::new(vec!["index.html".into()]);
        let (_not_found, out_dir) = run(dir.path(), registry, entries);

        let emitted: Vec<_> = fs::read_dir(&out_dir)
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();

        let a_files: Vec<_> = emitted.iter().filter(|n| n.starts_with("a.js_")).collect();
        let b_files: Vec<_> = emitted.iter().filter(|n| n.starts_with("b.js_")).collect();
        assert_eq!(a_files.len(), 1, "a.js should emit exactly once: {emitted:?}");
        assert_eq!(b_files.len(), 1, "b.js should emit exactly once: {emitted:?}");

        // a.js's content must reference b.js by the name b.js was actually
        // emitted under, and vice versa: the two-pass cycle break only
        // works if each file's final reference matches the other's real
        // output filename.
        let a_content = fs::read_to_string(out_dir.join(a_files[0])).unwrap();
        assert!(a_content.contains(&format!("/{}", b_files[0])), "a.js should reference {}: {a_content}", b_files[0]);

        let b_content = fs::read_to_string(out_dir.join(b_files[0])).unwrap();
        assert!(b_content.contains(&format!("/{}", a_files[0])), "b.js should reference {}: {b_content}", a_files[0]);
    }

    #[test]
    fn opaque_asset_is_copied_byte_for_byte() {
        let dir = tempdir().unwrap();
        let src = write(dir.path(), "src/index.html", r#"<img src="/logo.png">"#);
        let png_path = dir.path().join("src/logo.png");
        fs::write(&png_path, b"\x89PNGDATA").unwrap();

        let mut registry = FileRegistry::new();
        registry.insert(Asset::new(src, "index.html", 30));
        registry.insert(Asset::new(png_path, "logo.png", 8));

        let entries = EntrySet::new(vec!["index.html".into()]);
        let (_not_found, out_dir) = run(dir.path(), registry, entries);

        let emitted: Vec<_> = fs::read_dir(&out_dir)
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        let png = emitted.iter().find(|n| n.starts_with("logo.png_")).expect("logo.png emitted");
        assert_eq!(fs::read(out_dir.join(png)).unwrap(), b"\x89PNGDATA");
    }
}
