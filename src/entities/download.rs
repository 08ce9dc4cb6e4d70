use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::entities::TileCoordinate;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    #[default]
    Idle,
    Downloading,
    Done,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Tiles counted as succeeded because they were already stored.
    pub already_cached: usize,
}

/// Book-keeping for a single offline-save operation.
#[derive(Debug)]
pub struct DownloadJob {
    pending: HashSet<TileCoordinate>,
    completed: usize,
    total: usize,
}

impl DownloadJob {
    pub fn new(tiles: &[TileCoordinate]) -> Self {
        Self {
            pending: tiles.iter().copied().collect(),
            completed: 0,
            total: tiles.len(),
        }
    }

    /// Marks one tile as settled and returns the progress percentage.
    pub fn settle(&mut self, tile: &TileCoordinate) -> u8 {
        self.pending.remove(tile);
        self.completed = (self.completed + 1).min(self.total);

        self.percent()
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }

        (self.completed as f64 / self.total as f64 * 100.0).round() as u8
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[test]
fn download_job_progress_test() {
    let tiles = vec![
        TileCoordinate::new(12, 1, 1),
        TileCoordinate::new(12, 2, 1),
        TileCoordinate::new(12, 3, 1),
    ];
    let mut job = DownloadJob::new(&tiles);

    assert_eq!(job.percent(), 0);
    assert_eq!(job.settle(&tiles[1]), 33);
    assert_eq!(job.settle(&tiles[0]), 67);
    assert_eq!(job.pending(), 1);
    assert_eq!(job.settle(&tiles[2]), 100);
    assert_eq!(job.pending(), 0);
    assert_eq!(job.completed(), job.total());
}

#[test]
fn empty_download_job_test() {
    let job = DownloadJob::new(&[]);

    assert_eq!(job.completed(), job.total());
    assert_eq!(job.percent(), 100);
}
