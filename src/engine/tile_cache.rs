use crate::{
    db::DynStore,
    entities::{TileCoordinate, TileRecord},
    error::Error,
};

/// Downloaded tile images keyed by `{zoom}/{x}/{y}`.
#[derive(Clone)]
pub struct TileCache {
    store: DynStore,
}

impl TileCache {
    pub fn new(store: DynStore) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn has(&self, tile: &TileCoordinate) -> bool {
        match self.store.get(&tile.key()).await {
            Ok(entry) => entry.is_some(),
            Err(err) => {
                tracing::warn!("tile cache read failed: {}", err);
                false
            }
        }
    }

    pub async fn get(&self, tile: &TileCoordinate) -> Option<TileRecord> {
        match self.store.get(&tile.key()).await {
            Ok(Some(image)) => Some(TileRecord {
                coordinate: *tile,
                image,
            }),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!("tile cache read failed: {}", err);
                None
            }
        }
    }

    #[tracing::instrument(skip(self, record), fields(tile = %record.coordinate))]
    pub async fn put(&self, record: TileRecord) -> Result<(), Error> {
        self.store.put(&record.coordinate.key(), record.image).await
    }

    pub async fn count(&self) -> Result<u64, Error> {
        self.store.count().await
    }
}

#[test]
fn tile_cache_test() {
    use crate::db::MemoryStore;
    use std::sync::Arc;
    use tokio_test::block_on;

    let cache = TileCache::new(Arc::new(MemoryStore::new()));
    let tile = TileCoordinate::new(13, 4600, 2800);

    assert!(!block_on(cache.has(&tile)));
    assert_eq!(block_on(cache.count()).unwrap(), 0);

    block_on(cache.put(TileRecord {
        coordinate: tile,
        image: vec![0x89, 0x50],
    }))
    .unwrap();
    block_on(cache.put(TileRecord {
        coordinate: tile,
        image: vec![0x89, 0x50, 0x4e],
    }))
    .unwrap();

    assert!(block_on(cache.has(&tile)));
    assert!(!block_on(cache.has(&TileCoordinate::new(12, 4600, 2800))));
    assert_eq!(block_on(cache.count()).unwrap(), 1);
    assert_eq!(block_on(cache.get(&tile)).unwrap().image, vec![0x89, 0x50, 0x4e]);
}
