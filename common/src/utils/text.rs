use sha2::{Digest, Sha256};

/// Canonicalizes text for hashing and embedding: lowercases, strips every
/// character that is not alphanumeric, `_`, whitespace, `,` or `.`, then
/// collapses whitespace runs to single spaces and trims.
///
/// Stripping happens before the whitespace collapse so that removed
/// characters cannot leave double spaces behind; the function is
/// idempotent.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace() || *c == ',' || *c == '.')
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Hex-encoded SHA-256 digest of the given text, used as the exact
/// duplicate-detection fingerprint for records and chunks.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
