//! Hash primitives. MD5 is used purely for its distribution properties and
//! short digest size; this is not a security boundary.

use md5::{Digest, Md5};

/// Number of hex characters kept from the MD5 digest.
const SHORT_HASH_LEN: usize = 6;

/// Lowercase hex of MD5 over `bytes`, truncated to the first six
/// characters.
pub fn short_hash(bytes: &[u8]) -> String {
    let digest = Md5::digest(bytes);
    let mut hex = hex::encode(digest);
    hex.truncate(SHORT_HASH_LEN);
    hex
}

/// The short hash of `lines` concatenated with a single newline between
/// each pair, with no trailing newline.
pub fn hash_lines<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = lines
        .into_iter()
        .map(|l| l.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join("\n");
    short_hash(joined.as_bytes())
}
