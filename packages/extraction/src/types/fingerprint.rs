//! Content fingerprinting and idempotency keys.
//!
//! `ContentFingerprint` = SHA-256 over the normalized DOM (scripts,
//! styles, comments stripped; timestamp-like attributes dropped;
//! whitespace collapsed; dynamic-id suffixes stripped), so two fetches
//! of the same logical page hash identically even if a CSRF token or a
//! `data-cache-bust` attribute differs between them.
//!
//! `IdempotencyKey` = SHA-256 over (canonical URL, normalized query,
//! content fingerprint), the key the idempotency store dedupes on.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentFingerprint(pub [u8; 32]);

impl ContentFingerprint {
    pub fn of_normalized(normalized_dom: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(normalized_dom.as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn to_hex(self) -> String {
        hex_encode(&self.0)
    }
}

impl std::fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(pub [u8; 32]);

impl IdempotencyKey {
    pub fn compute(canonical_url: &str, normalized_query: &str, fingerprint: ContentFingerprint) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(canonical_url.as_bytes());
        hasher.update(b"\0");
        hasher.update(normalized_query.as_bytes());
        hasher.update(b"\0");
        hasher.update(fingerprint.0);
        Self(hasher.finalize().into())
    }

    pub fn to_hex(self) -> String {
        hex_encode(&self.0)
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        write!(s, "{b:02x}").unwrap();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = ContentFingerprint::of_normalized("<html><body>hi</body></html>");
        let b = ContentFingerprint::of_normalized("<html><body>hi</body></html>");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_differs_on_different_content() {
        let a = ContentFingerprint::of_normalized("one");
        let b = ContentFingerprint::of_normalized("two");
        assert_ne!(a, b);
    }

    #[test]
    fn idempotency_key_distinguishes_url_query_and_content() {
        let fp = ContentFingerprint::of_normalized("same content");
        let a = IdempotencyKey::compute("https://x.com/a", "q=1", fp);
        let b = IdempotencyKey::compute("https://x.com/b", "q=1", fp);
        let c = IdempotencyKey::compute("https://x.com/a", "q=2", fp);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn hex_round_trips_length() {
        let fp = ContentFingerprint::of_normalized("x");
        assert_eq!(fp.to_hex().len(), 64);
    }
}
