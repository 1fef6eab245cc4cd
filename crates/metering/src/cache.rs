//! Identity-independent response cache with read-time TTL.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::clock::SharedClock;

struct CacheEntry {
    payload: String,
    written_at: DateTime<Utc>,
}

/// Scope-keyed payload cache.
///
/// Entries older than the TTL read as absent even while they still sit in
/// the map; [`ResponseCache::purge_expired`] reclaims them.  Concurrent
/// writers to the same key race and the last `put` wins.
pub struct ResponseCache {
    ttl: chrono::Duration,
    clock: SharedClock,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(ttl: chrono::Duration, clock: SharedClock) -> Self {
        Self {
            ttl,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, scope_key: &str) -> Option<String> {
        let now = self.clock.now();
        let entries = self.entries.read();
        let entry = entries.get(scope_key)?;
        (now - entry.written_at < self.ttl).then(|| entry.payload.clone())
    }

    pub fn put(&self, scope_key: impl Into<String>, payload: impl Into<String>) {
        let entry = CacheEntry {
            payload: payload.into(),
            written_at: self.clock.now(),
        };
        self.entries.write().insert(scope_key.into(), entry);
    }

    /// Physically remove expired entries; returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| now - e.written_at < self.ttl);
        before - entries.len()
    }

    /// Physically stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Cache scope for a zone and calendar month, e.g. `7b:2026-03`.
pub fn scope_key(zone: &str, year: i32, month: u32) -> String {
    format!("{zone}:{year:04}-{month:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn cache(ttl_secs: i64) -> (ResponseCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 5, 8, 0, 0).unwrap(),
        ));
        (
            ResponseCache::new(chrono::Duration::seconds(ttl_secs), clock.clone()),
            clock,
        )
    }

    #[test]
    fn put_then_get_returns_payload() {
        let (cache, _) = cache(60);
        cache.put("7b:2026-03", "plant peas");
        assert_eq!(cache.get("7b:2026-03").as_deref(), Some("plant peas"));
        assert!(cache.get("8a:2026-03").is_none());
    }

    #[test]
    fn expired_entry_reads_as_absent_but_is_still_stored() {
        let (cache, clock) = cache(60);
        cache.put("7b:2026-03", "plant peas");

        clock.advance(chrono::Duration::seconds(59));
        assert!(cache.get("7b:2026-03").is_some());

        clock.advance(chrono::Duration::seconds(1));
        assert!(cache.get("7b:2026-03").is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn put_overwrites_and_refreshes_timestamp() {
        let (cache, clock) = cache(60);
        cache.put("k", "first");
        clock.advance(chrono::Duration::seconds(50));
        cache.put("k", "second");
        clock.advance(chrono::Duration::seconds(50));
        assert_eq!(cache.get("k").as_deref(), Some("second"));
    }

    #[test]
    fn purge_drops_only_expired() {
        let (cache, clock) = cache(60);
        cache.put("old", "a");
        clock.advance(chrono::Duration::seconds(61));
        cache.put("new", "b");

        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("new").is_some());
    }

    #[test]
    fn scope_key_pads_month() {
        assert_eq!(scope_key("7b", 2026, 3), "7b:2026-03");
        assert_eq!(scope_key("10a", 2026, 12), "10a:2026-12");
    }
}
