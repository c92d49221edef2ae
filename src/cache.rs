use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::models::{Dataset, Metadata, SourceKind};

/// Default time-to-live for acquired datasets.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Time source for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut offset) = self.offset.lock() {
            *offset += by;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().map(|o| *o).unwrap_or_default();
        self.base + offset
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub dataset: Dataset,
    /// Where the cached dataset was produced: the network or the embedded provider.
    pub origin: SourceKind,
    /// False when the embedded provider substituted its canonical pair.
    pub exact: bool,
    pub fetched_at: Instant,
}

impl CacheEntry {
    pub fn metadata(&self) -> &Metadata {
        &self.dataset.metadata
    }

    fn is_valid(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) <= ttl
    }
}

/// In-memory dataset cache keyed by `language:rankingType`.
///
/// Expired entries are never evicted; a read past the TTL is simply a miss.
pub struct DatasetCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl DatasetCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;
        if entry.is_valid(now, self.ttl) {
            Some(entry.clone())
        } else {
            tracing::debug!(key, "cache entry expired");
            None
        }
    }

    /// Stores `dataset` under `key`, replacing whatever was there.
    pub fn put(&self, key: &str, dataset: Dataset, origin: SourceKind, exact: bool) {
        let fetched_at = self.clock.now();
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.to_string(),
                CacheEntry {
                    key: key.to_string(),
                    dataset,
                    origin,
                    exact,
                    fetched_at,
                },
            );
        }
    }

    /// Age of the entry for `key`, expired or not.
    pub fn age(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now();
        let entries = self.entries.lock().ok()?;
        entries
            .get(key)
            .map(|entry| now.saturating_duration_since(entry.fetched_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metadata, RankingType};
    use chrono::Utc;

    fn dataset(names: &[&str]) -> Dataset {
        let records = names
            .iter()
            .enumerate()
            .map(|(i, name)| crate::models::ToolRecord {
                id: i.to_string(),
                rank: (i + 1) as u32,
                name: name.to_string(),
                ..Default::default()
            })
            .collect::<Vec<_>>();
        Dataset {
            metadata: Metadata {
                last_updated: Utc::now(),
                ranking_type: RankingType::Monthly,
                language: "en".to_string(),
                total_items: records.len(),
            },
            records,
        }
    }

    #[test]
    fn entry_expires_after_ttl() {
        let clock = Arc::new(ManualClock::new());
        let cache = DatasetCache::new(Duration::from_secs(300), clock.clone());
        cache.put("en:monthly_rank", dataset(&["a"]), SourceKind::Network, true);

        clock.advance(Duration::from_secs(300));
        assert!(cache.get("en:monthly_rank").is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get("en:monthly_rank").is_none());
        // lazily expired, still physically present
        assert_eq!(cache.age("en:monthly_rank"), Some(Duration::from_secs(301)));
    }

    #[test]
    fn put_replaces_wholesale() {
        let clock = Arc::new(ManualClock::new());
        let cache = DatasetCache::new(DEFAULT_TTL, clock.clone());
        cache.put("en:total_rank", dataset(&["a", "b", "c"]), SourceKind::Network, true);
        clock.advance(Duration::from_secs(200));
        cache.put("en:total_rank", dataset(&["z"]), SourceKind::Network, true);

        let entry = cache.get("en:total_rank").unwrap();
        assert_eq!(entry.dataset.len(), 1);
        assert_eq!(entry.dataset.records[0].name, "z");
        assert_eq!(cache.age("en:total_rank"), Some(Duration::ZERO));
    }

    #[test]
    fn keys_are_independent() {
        let cache = DatasetCache::with_system_clock(DEFAULT_TTL);
        cache.put("en:total_rank", dataset(&["a"]), SourceKind::Network, true);
        assert!(cache.get("zh:total_rank").is_none());
        assert_eq!(cache.get("en:total_rank").unwrap().key, "en:total_rank");
    }

    #[test]
    fn entry_remembers_where_data_came_from() {
        let cache = DatasetCache::with_system_clock(DEFAULT_TTL);
        cache.put("ko:income_rank", dataset(&["a"]), SourceKind::Embedded, false);

        let entry = cache.get("ko:income_rank").unwrap();
        assert_eq!(entry.origin, SourceKind::Embedded);
        assert!(!entry.exact);
    }
}
