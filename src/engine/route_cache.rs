use crate::{
    db::DynStore,
    entities::{CacheEntry, PathGeometry},
};

/// Resolved path geometry keyed by route id.
#[derive(Clone)]
pub struct RouteCache {
    store: DynStore,
}

impl RouteCache {
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    pub fn key(route_id: &str) -> String {
        format!("path-{}", route_id)
    }

    /// Unreadable or corrupt entries count as a miss.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, route_id: &str) -> Option<PathGeometry> {
        let key = Self::key(route_id);

        let bytes = match self.store.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!("route cache read failed: {}", err);
                return None;
            }
        };

        match serde_json::from_slice::<CacheEntry>(&bytes) {
            Ok(entry) if entry.key == key => Some(entry.geometry),
            Ok(entry) => {
                tracing::warn!("route cache entry {} stored under {}", entry.key, key);
                None
            }
            Err(err) => {
                tracing::warn!("discarding corrupt route cache entry {}: {}", key, err);
                None
            }
        }
    }

    /// Best effort; a failed write is logged and dropped.
    #[tracing::instrument(skip(self, geometry))]
    pub async fn put(&self, route_id: &str, geometry: PathGeometry) {
        let entry = CacheEntry::new(Self::key(route_id), geometry);

        let result = match serde_json::to_vec(&entry) {
            Ok(bytes) => self.store.put(&entry.key, bytes).await,
            Err(err) => Err(err.into()),
        };

        if let Err(err) = result {
            tracing::warn!("route cache write failed: {}", err);
        }
    }
}

#[test]
fn route_cache_roundtrip_test() {
    use crate::db::MemoryStore;
    use crate::entities::Point;
    use std::sync::Arc;
    use tokio_test::block_on;

    let cache = RouteCache::new(Arc::new(MemoryStore::new()));
    let geometry = PathGeometry::new(vec![Point::new(49.84, 24.03), Point::new(49.85, 24.04)]);

    assert_eq!(block_on(cache.get("7")), None);

    block_on(cache.put("7", geometry.clone()));
    assert_eq!(block_on(cache.get("7")), Some(geometry.clone()));

    let shorter = geometry.slice_from(1);
    block_on(cache.put("7", shorter.clone()));
    assert_eq!(block_on(cache.get("7")), Some(shorter));
}

#[test]
fn route_cache_corrupt_entry_test() {
    use crate::db::{MemoryStore, Store};
    use std::sync::Arc;
    use tokio_test::block_on;

    let store = Arc::new(MemoryStore::new());
    let cache = RouteCache::new(store.clone());

    block_on(store.put(&RouteCache::key("7"), b"{not json".to_vec())).unwrap();
    assert_eq!(block_on(cache.get("7")), None);
}

#[test]
fn route_cache_failing_store_test() {
    use crate::entities::Point;
    use crate::testing::FailingStore;
    use std::sync::Arc;
    use tokio_test::block_on;

    let cache = RouteCache::new(Arc::new(FailingStore));

    block_on(cache.put("7", PathGeometry::new(vec![Point::new(0.0, 0.0)])));
    assert_eq!(block_on(cache.get("7")), None);
}
