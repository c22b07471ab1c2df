//! Content Hasher / Idempotency Store (spec §4.7): deterministic
//! fingerprinting plus at-most-once coordination across requests for
//! the same (URL, query, content) triple.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::error::{ExtractionError, Result};
use crate::types::fingerprint::{ContentFingerprint, IdempotencyKey};

/// Default time-to-live for a stored idempotency record.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default maximum number of records held before LRU eviction kicks in.
pub const DEFAULT_CAPACITY: usize = 10_000;

struct Record<T> {
    data: T,
    created_at: Instant,
    created_at_unix_ms: u64,
    last_touched: Instant,
    ttl: Duration,
}

impl<T> Record<T> {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }
}

/// At-most-once coordination keyed by [`IdempotencyKey`], backed by an
/// in-process map (`RwLock<HashMap<_>>` for shared, concurrent-readable
/// state, the same primitive the teacher's in-memory store used).
pub struct IdempotencyStore<T: Clone> {
    records: RwLock<HashMap<IdempotencyKey, Record<T>>>,
    capacity: usize,
    default_ttl: Duration,
}

/// Result of [`IdempotencyStore::handle`].
pub struct HandleResult<T> {
    pub is_replay: bool,
    pub data: T,
    pub original_timestamp_unix_ms: u64,
}

impl<T: Clone> IdempotencyStore<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            capacity: DEFAULT_CAPACITY,
            default_ttl: DEFAULT_TTL,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinate at-most-once execution of `op` under `key`. If a
    /// non-expired record already exists, returns it without running
    /// `op`. Expired records are swept lazily on the probe that finds
    /// them (spec §4.7).
    pub fn handle<F>(&self, key: IdempotencyKey, now_unix_ms: u64, op: F) -> Result<HandleResult<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(replay) = self.get_if_fresh(key) {
            return Ok(replay);
        }

        let data = op()?;
        self.store(key, data.clone(), now_unix_ms);
        Ok(HandleResult { is_replay: false, data, original_timestamp_unix_ms: now_unix_ms })
    }

    /// Probe for a non-expired record without running any work — the
    /// half of [`Self::handle`] that's safe to call ahead of async work
    /// the store itself can't await (spec §4.7; callers orchestrating
    /// async stages use this plus [`Self::store`] instead of `handle`).
    pub fn get_if_fresh(&self, key: IdempotencyKey) -> Option<HandleResult<T>> {
        let mut records = self.records.write().unwrap();
        if let Some(record) = records.get_mut(&key) {
            if !record.is_expired() {
                record.last_touched = Instant::now();
                return Some(HandleResult {
                    is_replay: true,
                    data: record.data.clone(),
                    original_timestamp_unix_ms: record.created_at_unix_ms,
                });
            }
            records.remove(&key);
        }
        None
    }

    /// Store a freshly computed result under `key`, sweeping expired
    /// entries and evicting the LRU entry if at capacity.
    pub fn store(&self, key: IdempotencyKey, data: T, now_unix_ms: u64) {
        let now = Instant::now();
        let mut records = self.records.write().unwrap();
        sweep_expired(&mut records);
        if records.len() >= self.capacity {
            evict_lru(&mut records);
        }
        records.insert(
            key,
            Record { data, created_at: now, created_at_unix_ms: now_unix_ms, last_touched: now, ttl: self.default_ttl },
        );
    }
}

impl<T: Clone> Default for IdempotencyStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn sweep_expired<T>(records: &mut HashMap<IdempotencyKey, Record<T>>) {
    records.retain(|_, record| !record.is_expired());
}

fn evict_lru<T>(records: &mut HashMap<IdempotencyKey, Record<T>>) {
    if let Some(oldest_key) = records
        .iter()
        .min_by_key(|(_, record)| record.last_touched)
        .map(|(key, _)| *key)
    {
        records.remove(&oldest_key);
    }
}

/// The kind of content a fingerprint was computed over; ancillary
/// metadata that does not affect the hash itself (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Html,
    Json,
    Text,
    Binary,
}

pub fn detect_content_type(raw: &str) -> ContentType {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('<') {
        ContentType::Html
    } else if trimmed.starts_with('{') || trimmed.starts_with('[') {
        ContentType::Json
    } else if raw.bytes().any(|b| b == 0) {
        ContentType::Binary
    } else {
        ContentType::Text
    }
}

pub fn fingerprint_of(normalized: &str) -> ContentFingerprint {
    ContentFingerprint::of_normalized(normalized)
}

pub fn key_for(url: &str, query: &str, fingerprint: &ContentFingerprint) -> Result<IdempotencyKey> {
    if url.trim().is_empty() {
        return Err(ExtractionError::MalformedInput { reason: "empty URL for idempotency key".to_string() });
    }
    Ok(IdempotencyKey::compute(url, query, *fingerprint))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_executes_op_second_call_replays() {
        let store: IdempotencyStore<u32> = IdempotencyStore::new();
        let fp = fingerprint_of("normalized content");
        let key = key_for("https://example.com", "query", &fp).unwrap();

        let mut call_count = 0;
        let first = store
            .handle(key, 1000, || {
                call_count += 1;
                Ok(42)
            })
            .unwrap();
        assert!(!first.is_replay);
        assert_eq!(first.data, 42);

        let second = store
            .handle(key, 2000, || {
                call_count += 1;
                Ok(99)
            })
            .unwrap();
        assert!(second.is_replay);
        assert_eq!(second.data, 42);
        assert_eq!(second.original_timestamp_unix_ms, 1000);
        assert_eq!(call_count, 1);
    }

    #[test]
    fn expired_record_allows_reexecution() {
        let store: IdempotencyStore<u32> = IdempotencyStore::new().with_default_ttl(Duration::from_millis(1));
        let fp = fingerprint_of("content");
        let key = key_for("https://example.com", "q", &fp).unwrap();

        store.handle(key, 0, || Ok(1)).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        let result = store.handle(key, 1, || Ok(2)).unwrap();
        assert!(!result.is_replay);
        assert_eq!(result.data, 2);
    }

    #[test]
    fn distinct_triples_never_collide() {
        let fp = fingerprint_of("content");
        let a = key_for("https://a.example.com", "q", &fp).unwrap();
        let b = key_for("https://b.example.com", "q", &fp).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn capacity_eviction_keeps_store_bounded() {
        let store: IdempotencyStore<u32> = IdempotencyStore::new().with_capacity(2);
        for i in 0..5u32 {
            let fp = fingerprint_of(&format!("content-{i}"));
            let key = key_for("https://example.com", &format!("q{i}"), &fp).unwrap();
            store.handle(key, i as u64, || Ok(i)).unwrap();
        }
        assert!(store.len() <= 2);
    }

    #[test]
    fn detects_html_json_and_text() {
        assert_eq!(detect_content_type("<html></html>"), ContentType::Html);
        assert_eq!(detect_content_type(r#"{"a":1}"#), ContentType::Json);
        assert_eq!(detect_content_type("plain text"), ContentType::Text);
    }

    #[test]
    fn empty_url_rejected() {
        let fp = fingerprint_of("content");
        assert!(key_for("", "q", &fp).is_err());
    }
}
