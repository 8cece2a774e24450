//! Generation-stamped cache key derivation.

/// Suffix of the key under which a prefix persists its generation.
const INCREMENTOR_SUFFIX: &str = "cache_incrementor";

/// Derive the fully-qualified storage key for a logical key.
///
/// The generation sits between the prefix and the logical key, so bumping it
/// moves every key of the prefix to a fresh address.
pub fn derive_key(prefix: &str, generation: u64, key: &str) -> String {
    format!("{prefix}{generation}_{key}")
}

/// Key under which the generation for `prefix` is persisted.
pub fn incrementor_key(prefix: &str) -> String {
    format!("{prefix}{INCREMENTOR_SUFFIX}")
}
