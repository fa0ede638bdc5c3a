//! Time-boxed memoization shared by every provider adapter.
//!
//! Entries are never evicted; a stale entry is simply ignored and later
//! overwritten by the next successful fetch for the same key. Key cardinality
//! is bounded by the distinct locations a session visits.

use std::{borrow::Borrow, collections::HashMap, fmt, hash::Hash, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Weather data goes stale after ten minutes.
pub const WEATHER_TTL_SECS: i64 = 10 * 60;
/// Satellite imagery and asset listings are kept for a day.
pub const IMAGERY_TTL_SECS: i64 = 24 * 60 * 60;

/// Time source for cache freshness and "today".
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub data: V,
    pub timestamp: DateTime<Utc>,
}

/// Expiring key-value store. Last writer wins.
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> fmt::Debug for TtlCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("len", &self.entries.lock().len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn with_ttl_secs(ttl_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self::new(Duration::seconds(ttl_secs), clock)
    }

    /// Fresh value for `key`, if any. An entry is stale once `now - timestamp >= ttl`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now();
        let entries = self.entries.lock();
        entries
            .get(key)
            .filter(|entry| now - entry.timestamp < self.ttl)
            .map(|entry| entry.data.clone())
    }

    pub fn insert(&self, key: K, data: V) {
        let entry = CacheEntry {
            data,
            timestamp: self.clock.now(),
        };
        self.entries.lock().insert(key, entry);
    }

    /// Number of stored entries, stale ones included.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> Arc<ManualClock> {
        let start = Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap();
        Arc::new(ManualClock::new(start))
    }

    #[test]
    fn returns_fresh_entries() {
        let clock = clock();
        let cache: TtlCache<String, u32> = TtlCache::with_ttl_secs(WEATHER_TTL_SECS, clock.clone());

        cache.insert("nasa-current-1-2".into(), 7);
        clock.advance(Duration::minutes(9));

        assert_eq!(cache.get("nasa-current-1-2"), Some(7));
        assert_eq!(cache.get("nasa-current-3-4"), None);
    }

    #[test]
    fn entry_expires_exactly_at_ttl() {
        let clock = clock();
        let cache: TtlCache<String, u32> = TtlCache::with_ttl_secs(WEATHER_TTL_SECS, clock.clone());

        cache.insert("k".into(), 1);
        clock.advance(Duration::seconds(WEATHER_TTL_SECS - 1));
        assert_eq!(cache.get("k"), Some(1));

        clock.advance(Duration::seconds(1));
        assert_eq!(cache.get("k"), None);
        // stale entries linger until overwritten
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn overwrite_refreshes_timestamp() {
        let clock = clock();
        let cache: TtlCache<String, u32> = TtlCache::with_ttl_secs(IMAGERY_TTL_SECS, clock.clone());

        cache.insert("k".into(), 1);
        clock.advance(Duration::hours(25));
        assert!(cache.get("k").is_none());

        cache.insert("k".into(), 2);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }
}
