//! A seam for the one piece of non-determinism the rewrite step otherwise
//! introduces: the timestamp comment stamped at the top of certain textual
//! assets. Production wiring uses [`SystemClock`]; tests inject a fixed
//! value so emitted content (and its hash) is reproducible.

use std::time::{SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    /// A short, opaque string embedded verbatim in the `Updated:` comment.
    fn now(&self) -> String;
}

/// Seconds since the Unix epoch, as decimal text.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        secs.to_string()
    }
}

#[cfg(test)]
pub struct FixedClock(pub &'static str);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> String {
        self.0.to_owned()
    }
}
