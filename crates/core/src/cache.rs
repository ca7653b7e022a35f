use crate::domain::snapshot::AssetSnapshot;
use std::collections::HashMap;
use std::sync::Arc;

pub const DEFAULT_CAPACITY: usize = 100;

/// Snapshot lookup cache keyed by normalized ticker.
#[async_trait::async_trait]
pub trait SnapshotCache: Send + Sync {
    async fn get(&self, ticker: &str) -> Option<Arc<AssetSnapshot>>;

    async fn insert(&self, ticker: String, snapshot: Arc<AssetSnapshot>);

    async fn len(&self) -> usize;
}

/// In-process cache with least-recently-used eviction. Capacity 0 disables it.
#[derive(Debug)]
pub struct LruSnapshotCache {
    capacity: usize,
    inner: tokio::sync::Mutex<LruState>,
}

#[derive(Debug, Default)]
struct LruState {
    clock: u64,
    entries: HashMap<String, Entry>,
}

#[derive(Debug)]
struct Entry {
    snapshot: Arc<AssetSnapshot>,
    last_used: u64,
}

impl LruSnapshotCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: tokio::sync::Mutex::new(LruState::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for LruSnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LruState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Linear scan for the oldest entry. Fine for the small capacities this
    /// cache is configured with.
    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_used)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
            tracing::debug!(ticker = %key, "evicted snapshot from lookup cache");
        }
    }
}

#[async_trait::async_trait]
impl SnapshotCache for LruSnapshotCache {
    async fn get(&self, ticker: &str) -> Option<Arc<AssetSnapshot>> {
        let mut guard = self.inner.lock().await;
        let now = guard.tick();
        let entry = guard.entries.get_mut(ticker)?;
        entry.last_used = now;
        Some(entry.snapshot.clone())
    }

    async fn insert(&self, ticker: String, snapshot: Arc<AssetSnapshot>) {
        if self.capacity == 0 {
            return;
        }

        let mut guard = self.inner.lock().await;
        let now = guard.tick();
        if !guard.entries.contains_key(&ticker) && guard.entries.len() >= self.capacity {
            guard.evict_lru();
        }
        guard.entries.insert(
            ticker,
            Entry {
                snapshot,
                last_used: now,
            },
        );
    }

    async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::TickerRecord;

    fn snap(ticker: &str) -> Arc<AssetSnapshot> {
        Arc::new(AssetSnapshot::from_record(ticker, &TickerRecord::default()))
    }

    #[tokio::test]
    async fn returns_the_same_arc() {
        let cache = LruSnapshotCache::new(2);
        let s = snap("AAPL");
        cache.insert("AAPL".to_string(), s.clone()).await;
        let hit = cache.get("AAPL").await.unwrap();
        assert!(Arc::ptr_eq(&s, &hit));
        assert!(cache.get("MSFT").await.is_none());
    }

    #[tokio::test]
    async fn evicts_least_recently_used() {
        let cache = LruSnapshotCache::new(2);
        cache.insert("A".to_string(), snap("A")).await;
        cache.insert("B".to_string(), snap("B")).await;
        // Touch A so B becomes the eviction candidate.
        assert!(cache.get("A").await.is_some());
        cache.insert("C".to_string(), snap("C")).await;

        assert_eq!(cache.len().await, 2);
        assert!(cache.get("A").await.is_some());
        assert!(cache.get("B").await.is_none());
        assert!(cache.get("C").await.is_some());
    }

    #[tokio::test]
    async fn replacing_a_key_does_not_evict() {
        let cache = LruSnapshotCache::new(2);
        cache.insert("A".to_string(), snap("A")).await;
        cache.insert("B".to_string(), snap("B")).await;
        let fresh = snap("A");
        cache.insert("A".to_string(), fresh.clone()).await;

        assert_eq!(cache.len().await, 2);
        assert!(Arc::ptr_eq(&cache.get("A").await.unwrap(), &fresh));
        assert!(cache.get("B").await.is_some());
    }

    #[tokio::test]
    async fn zero_capacity_never_stores() {
        let cache = LruSnapshotCache::new(0);
        cache.insert("A".to_string(), snap("A")).await;
        assert_eq!(cache.len().await, 0);
        assert!(cache.get("A").await.is_none());
    }
}
