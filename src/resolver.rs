//! The path resolver: a pure function from (referrer, textual candidate) to
//! a registered asset, or "unresolved".

use serde::{Deserialize, Serialize};

use crate::asset::{Asset, FileRegistry};

/// The fixed search strategy the resolver falls back to after the
/// as-is/relative lookups fail. Workload-specific, so it's configuration
/// rather than a hard-coded constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Fixed prefixes tried, in order, against the bare candidate.
    pub prefixes: Vec<String>,

    /// Root whose immediate child directories are tried as a last resort.
    pub fallback_root: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            prefixes: vec![
                "/games/sharedAssets-3js/".to_owned(),
                "/games/sharedAssets-3js/particles/".to_owned(),
                "/games/sharedAssets-3js/particles/particles128/".to_owned(),
                "/games/".to_owned(),
                "/games/libs-3js/thrax/".to_owned(),
                "/games/libs-3js/examples/js/".to_owned(),
                "/games/libs-3js/thrax/three86/".to_owned(),
                "/assets/".to_owned(),
            ],
            fallback_root: "/games/sharedAssets-3js".to_owned(),
        }
    }
}

/// The outcome of a resolution attempt, distinguishing "nothing matched"
/// from "something matched, but it was the referrer itself" — the two are
/// handled differently by callers (a genuine miss may be worth recording,
/// a self-reference is always silently dropped).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Found(&'a Asset),
    SelfReference,
    NotFound,
}

/// Resolves a textual candidate, found in `referrer`, to a registered
/// asset.
pub struct Resolver<'a> {
    registry: &'a FileRegistry,
    config: &'a ResolverConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a FileRegistry, config: &'a ResolverConfig) -> Self {
        Self { registry, config }
    }

    /// Resolves `candidate`, referenced from within `referrer`. Returns
    /// `None` if no strategy matches, or if the only match is a
    /// self-reference.
    pub fn resolve(&self, referrer: &Asset, candidate: &str) -> Option<&'a Asset> {
        match self.resolve_detailed(referrer, candidate) {
            Resolution::Found(asset) => Some(asset),
            Resolution::SelfReference | Resolution::NotFound => None,
        }
    }

    /// Like [`Self::resolve`], but keeps apart the two reasons a lookup can
    /// come back empty.
    pub fn resolve_detailed(&self, referrer: &Asset, candidate: &str) -> Resolution<'a> {
        let Some(hit) = self.lookup(referrer, candidate) else {
            return Resolution::NotFound;
        };

        // Self-reference is suppressed: treat it as if nothing resolved.
        if hit.logical_path() == referrer.logical_path() {
            return Resolution::SelfReference;
        }

        Resolution::Found(hit)
    }

    fn lookup(&self, referrer: &Asset, candidate: &str) -> Option<&'a Asset> {
        // 1. As-is.
        if let Some(asset) = self.registry.get(candidate) {
            return Some(asset);
        }

        // 2. Resolved against the referrer's logical directory.
        let relative = resolve_relative(candidate, referrer.logical_dir());
        if let Some(asset) = self.registry.get(&relative) {
            return Some(asset);
        }

        // 3. Fixed prefixes, in order.
        for prefix in &self.config.prefixes {
            if let Some(asset) = self.registry.get(&format!("{prefix}{candidate}")) {
                return Some(asset);
            }
        }

        // 4. Immediate children of the fallback root.
        for child in self.registry.child_dirs_of(&self.config.fallback_root) {
            let path = format!("{}/{}/{}", self.config.fallback_root, child, candidate);
            if let Some(asset) = self.registry.get(&path) {
                return Some(asset);
            }
        }

        None
    }
}

/// Resolves `candidate` against directory `dir` (a logical directory with
/// no leading or trailing `/`), consuming any leading `./` or `../`
/// segments first, popping one component off `dir` per `../`. Always
/// returns an absolute (`/`-prefixed) logical path, matching how assets are
/// indexed in the registry.
fn resolve_relative(candidate: &str, dir: &str) -> String {
    let mut segments: Vec<&str> = if dir.is_empty() {
        Vec::new()
    } else {
        dir.split('/').collect()
    };

    let mut rest = candidate;
    loop {
        if let Some(r) = rest.strip_prefix("../") {
            segments.pop();
            rest = r;
        } else if let Some(r) = rest.strip_prefix("./") {
            rest = r;
        } else {
            break;
        }
    }

    if segments.is_empty() {
        format!("/{rest}")
    } else {
        format!("/{}/{}", segments.join("/"), rest)
    }
}
