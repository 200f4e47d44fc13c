//! Name canonicalization and stable hash-derived keys

use sha2::{Digest, Sha256};

/// Prefix of canonical keys derived from a full name
pub const MANUAL_KEY_PREFIX: &str = "manual::";

/// Trim and collapse internal whitespace runs to a single space
pub fn normalize_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Unique lookup key for a name variant
///
/// ```
/// use pacct_engine::identity::canonical_alias;
/// assert_eq!(canonical_alias("  María   JESÚS Montero "), "maría jesús montero");
/// ```
pub fn canonical_alias(name: &str) -> String {
    normalize_whitespace(name).to_lowercase()
}

fn sha256_hex(value: &str) -> String {
    format!("{:x}", Sha256::digest(value.as_bytes()))
}

/// Canonical key for a person created without an explicit key hint
pub fn manual_canonical_key(full_name: &str) -> String {
    let digest = sha256_hex(&canonical_alias(full_name));
    format!("{MANUAL_KEY_PREFIX}{}", &digest[..24])
}

/// Deterministic row key: `kind:` + 16 hex chars of SHA-256 over the parts
///
/// Parts are joined with U+001F so `["ab", "c"]` and `["a", "bc"]` differ.
pub fn stable_key(kind: &str, parts: &[&str]) -> String {
    let digest = sha256_hex(&parts.join("\u{1f}"));
    format!("{kind}:{}", &digest[..16])
}
