use std::sync::{Mutex, PoisonError};

use futures::stream::{FuturesUnordered, StreamExt};

use crate::{
    config::DEFAULT_BATCH_SIZE,
    engine::TileCache,
    entities::{BoundingBox, DownloadJob, DownloadStatus, DownloadSummary, TileCoordinate, TileRecord},
    external::DynTiles,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Upper bound on tiles fetched at once.
    pub batch_size: usize,
    /// Count tiles already in the cache as done instead of fetching them again.
    pub skip_existing: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            skip_existing: false,
        }
    }
}

enum Outcome {
    Fetched,
    AlreadyCached,
    Failed,
}

pub struct OfflineDownloader {
    tiles: DynTiles,
    cache: TileCache,
    options: DownloadOptions,
    status: Mutex<DownloadStatus>,
}

/// Settles the job status when `download_region` returns or is dropped
/// mid-flight. An abandoned job goes back to `Idle`.
struct StatusGuard<'a> {
    status: &'a Mutex<DownloadStatus>,
    next: DownloadStatus,
}

impl<'a> StatusGuard<'a> {
    fn start(status: &'a Mutex<DownloadStatus>) -> Self {
        *status.lock().unwrap_or_else(PoisonError::into_inner) = DownloadStatus::Downloading;

        Self {
            status,
            next: DownloadStatus::Idle,
        }
    }

    fn finish(mut self) {
        self.next = DownloadStatus::Done;
    }
}

impl Drop for StatusGuard<'_> {
    fn drop(&mut self) {
        if self.next == DownloadStatus::Idle {
            tracing::info!("offline download abandoned");
        }

        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = self.next;
    }
}

impl OfflineDownloader {
    pub fn new(tiles: DynTiles, cache: TileCache, options: DownloadOptions) -> Self {
        Self {
            tiles,
            cache,
            options,
            status: Mutex::new(DownloadStatus::Idle),
        }
    }

    /// Stored tiles from an earlier run count as a finished download.
    pub async fn status(&self) -> DownloadStatus {
        let status = *self.status.lock().unwrap_or_else(PoisonError::into_inner);

        if status != DownloadStatus::Idle {
            return status;
        }

        match self.cache.count().await {
            Ok(count) if count > 0 => DownloadStatus::Done,
            Ok(_) => status,
            Err(err) => {
                tracing::warn!("could not count stored tiles: {}", err);
                status
            }
        }
    }

    /// Fetches every tile covering `bounds` at each zoom level, one batch
    /// at a time. Failed tiles are skipped and only show up in the summary.
    #[tracing::instrument(skip(self, on_progress))]
    pub async fn download_region(
        &self,
        bounds: &BoundingBox,
        zooms: &[u8],
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> DownloadSummary {
        let tiles = bounds.tiles_for_zooms(zooms);
        let mut job = DownloadJob::new(&tiles);
        let mut summary = DownloadSummary {
            total: tiles.len(),
            ..DownloadSummary::default()
        };

        let guard = StatusGuard::start(&self.status);
        tracing::info!("downloading {} tiles", summary.total);

        for batch in tiles.chunks(self.options.batch_size.max(1)) {
            let mut settled: FuturesUnordered<_> =
                batch.iter().map(|tile| self.download_tile(*tile)).collect();

            while let Some((tile, outcome)) = settled.next().await {
                match outcome {
                    Outcome::Fetched => summary.succeeded += 1,
                    Outcome::AlreadyCached => {
                        summary.succeeded += 1;
                        summary.already_cached += 1;
                    }
                    Outcome::Failed => summary.failed += 1,
                }

                on_progress(job.settle(&tile));
            }

            tracing::debug!(
                "{} of {} tiles settled, {} pending",
                job.completed(),
                job.total(),
                job.pending()
            );
        }

        if summary.total == 0 {
            on_progress(job.percent());
        }

        guard.finish();
        tracing::info!(
            "offline download finished: {} stored, {} failed",
            summary.succeeded,
            summary.failed
        );

        summary
    }

    async fn download_tile(&self, tile: TileCoordinate) -> (TileCoordinate, Outcome) {
        if self.options.skip_existing && self.cache.has(&tile).await {
            return (tile, Outcome::AlreadyCached);
        }

        let image = match self.tiles.fetch_tile(tile).await {
            Ok(image) => image,
            Err(err) => {
                tracing::debug!("skipping tile {}: {}", tile, err);
                return (tile, Outcome::Failed);
            }
        };

        let record = TileRecord {
            coordinate: tile,
            image,
        };

        match self.cache.put(record).await {
            Ok(()) => (tile, Outcome::Fetched),
            Err(err) => {
                tracing::warn!("could not store tile {}: {}", tile, err);
                (tile, Outcome::Failed)
            }
        }
    }
}

#[cfg(test)]
fn corner_bounds() -> BoundingBox {
    // four tiles meet here at zoom 12 and above
    let corner = TileCoordinate::new(12, 2300, 1400).north_west();

    BoundingBox::new(
        corner.latitude + 0.001,
        corner.longitude + 0.001,
        corner.latitude - 0.001,
        corner.longitude - 0.001,
    )
    .unwrap()
}

#[test]
fn single_batch_download_test() {
    use crate::db::MemoryStore;
    use crate::testing::MockTiles;
    use std::sync::Arc;
    use tokio_test::block_on;

    let tiles = Arc::new(MockTiles::new(vec![]));
    let cache = TileCache::new(Arc::new(MemoryStore::new()));
    let downloader = OfflineDownloader::new(tiles.clone(), cache.clone(), DownloadOptions::default());

    let mut progress = vec![];
    let summary = block_on(downloader.download_region(&corner_bounds(), &[12, 13], &mut |p| {
        progress.push(p)
    }));

    assert_eq!(summary.total, 8);
    assert_eq!(summary.succeeded, 8);
    assert_eq!(summary.failed, 0);
    assert_eq!(tiles.max_in_flight(), 8);
    assert_eq!(progress.len(), 8);
    assert_eq!(progress.last(), Some(&100));
    assert_eq!(block_on(cache.count()).unwrap(), 8);
    assert!(block_on(cache.has(&TileCoordinate::new(13, 4600, 2800))));
}

#[test]
fn partial_failure_download_test() {
    use crate::db::MemoryStore;
    use crate::testing::MockTiles;
    use std::sync::Arc;
    use tokio_test::block_on;

    let bounds = BoundingBox::new(49.90, 24.15, 49.77, 23.92).unwrap();
    let zooms = [12, 13, 14];
    let all = bounds.tiles_for_zooms(&zooms);
    let failing = vec![all[0], all[all.len() / 2], all[all.len() - 1]];

    let tiles = Arc::new(MockTiles::new(failing));
    let cache = TileCache::new(Arc::new(MemoryStore::new()));
    let downloader = OfflineDownloader::new(tiles.clone(), cache.clone(), DownloadOptions::default());

    let mut progress = vec![];
    let summary = block_on(downloader.download_region(&bounds, &zooms, &mut |p| progress.push(p)));

    assert!(all.len() > 10);
    assert_eq!(summary.total, all.len());
    assert_eq!(summary.failed, 3);
    assert_eq!(summary.succeeded, all.len() - 3);
    assert_eq!(progress.len(), all.len());
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last(), Some(&100));
    assert_eq!(block_on(cache.count()).unwrap() as usize, all.len() - 3);

    // never more than one batch in flight
    assert!(tiles.max_in_flight() <= 10);
    assert_eq!(tiles.fetched().len(), all.len());
}

#[test]
fn batches_run_in_order_test() {
    use crate::db::MemoryStore;
    use crate::testing::MockTiles;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio_test::block_on;

    let bounds = BoundingBox::new(49.90, 24.15, 49.77, 23.92).unwrap();
    let all = bounds.tiles_for_zooms(&[13, 14]);

    let tiles = Arc::new(MockTiles::new(vec![]));
    let options = DownloadOptions {
        batch_size: 3,
        ..DownloadOptions::default()
    };
    let downloader =
        OfflineDownloader::new(tiles.clone(), TileCache::new(Arc::new(MemoryStore::new())), options);

    block_on(downloader.download_region(&bounds, &[13, 14], &mut |_| {}));

    assert!(tiles.max_in_flight() <= 3);

    let fetched = tiles.fetched();
    for (done, expected) in fetched.chunks(3).zip(all.chunks(3)) {
        let done: HashSet<_> = done.iter().collect();
        let expected: HashSet<_> = expected.iter().collect();
        assert_eq!(done, expected);
    }
}

#[test]
fn skip_existing_tiles_test() {
    use crate::db::MemoryStore;
    use crate::testing::MockTiles;
    use std::sync::Arc;
    use tokio_test::block_on;

    let tiles = Arc::new(MockTiles::new(vec![]));
    let cache = TileCache::new(Arc::new(MemoryStore::new()));
    let stored = TileCoordinate::new(12, 2300, 1400);

    block_on(cache.put(TileRecord {
        coordinate: stored,
        image: vec![1],
    }))
    .unwrap();

    let options = DownloadOptions {
        skip_existing: true,
        ..DownloadOptions::default()
    };
    let downloader = OfflineDownloader::new(tiles.clone(), cache.clone(), options);

    let summary = block_on(downloader.download_region(&corner_bounds(), &[12], &mut |_| {}));

    assert_eq!(summary.total, 4);
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.already_cached, 1);
    assert!(!tiles.fetched().contains(&stored));
    assert_eq!(block_on(cache.get(&stored)).unwrap().image, vec![1]);
}

#[test]
fn failed_writes_count_as_failures_test() {
    use crate::testing::{FailingStore, MockTiles};
    use std::sync::Arc;
    use tokio_test::block_on;

    let tiles = Arc::new(MockTiles::new(vec![]));
    let downloader = OfflineDownloader::new(
        tiles,
        TileCache::new(Arc::new(FailingStore)),
        DownloadOptions::default(),
    );

    let mut last = 0;
    let summary = block_on(downloader.download_region(&corner_bounds(), &[12], &mut |p| last = p));

    assert_eq!(summary.failed, 4);
    assert_eq!(summary.succeeded, 0);
    assert_eq!(last, 100);
    assert_eq!(block_on(downloader.status()), DownloadStatus::Done);
}

#[test]
fn abandoned_download_resets_status_test() {
    use crate::db::MemoryStore;
    use crate::testing::MockTiles;
    use futures::FutureExt;
    use std::sync::Arc;
    use tokio_test::block_on;

    let tiles = Arc::new(MockTiles::new(vec![]));
    let downloader = OfflineDownloader::new(
        tiles.clone(),
        TileCache::new(Arc::new(MemoryStore::new())),
        DownloadOptions::default(),
    );

    // the first batch is still in flight after one poll
    let mut on_progress = |_: u8| {};
    let bounds = corner_bounds();
    let download = downloader.download_region(&bounds, &[12], &mut on_progress);
    assert!(download.now_or_never().is_none());

    assert_eq!(block_on(downloader.status()), DownloadStatus::Idle);

    // the next job runs to completion
    let summary = block_on(downloader.download_region(&corner_bounds(), &[12], &mut |_| {}));
    assert_eq!(summary.succeeded, 4);
    assert_eq!(block_on(downloader.status()), DownloadStatus::Done);
}

#[test]
fn download_status_test() {
    use crate::db::MemoryStore;
    use crate::testing::MockTiles;
    use std::sync::Arc;
    use tokio_test::block_on;

    let store = Arc::new(MemoryStore::new());
    let downloader = OfflineDownloader::new(
        Arc::new(MockTiles::new(vec![])),
        TileCache::new(store.clone()),
        DownloadOptions::default(),
    );

    assert_eq!(block_on(downloader.status()), DownloadStatus::Idle);

    let mut calls = vec![];
    let summary = block_on(downloader.download_region(&corner_bounds(), &[], &mut |p| calls.push(p)));

    assert_eq!(summary, DownloadSummary::default());
    assert_eq!(calls, vec![100]);
    assert_eq!(block_on(downloader.status()), DownloadStatus::Done);

    // a fresh downloader over a populated store starts out done
    block_on(downloader.download_region(&corner_bounds(), &[12], &mut |_| {}));
    let restarted = OfflineDownloader::new(
        Arc::new(MockTiles::new(vec![])),
        TileCache::new(store),
        DownloadOptions::default(),
    );
    assert_eq!(block_on(restarted.status()), DownloadStatus::Done);
}
