use super::Engine;

use async_trait::async_trait;

use crate::{
    api::OfflineAPI,
    entities::{BoundingBox, DownloadStatus, DownloadSummary},
};

#[async_trait]
impl OfflineAPI for Engine {
    async fn download_region(
        &self,
        bounds: &BoundingBox,
        zooms: &[u8],
        on_progress: &mut (dyn FnMut(u8) + Send),
    ) -> DownloadSummary {
        self.downloader.download_region(bounds, zooms, on_progress).await
    }

    async fn offline_status(&self) -> DownloadStatus {
        self.downloader.status().await
    }
}

#[test]
fn offline_api_test() {
    use crate::testing::MockRouting;
    use std::sync::Arc;
    use tokio_test::block_on;

    let engine = super::test_engine(vec![], Arc::new(MockRouting::working()));
    let bounds = BoundingBox::new(49.843, 24.033, 49.84, 24.03).unwrap();

    assert_eq!(block_on(engine.offline_status()), DownloadStatus::Idle);

    let mut last = 0;
    let summary = block_on(engine.download_region(&bounds, &[12], &mut |p| last = p));

    assert!(summary.total >= 1);
    assert_eq!(summary.succeeded, summary.total);
    assert_eq!(last, 100);
    assert_eq!(block_on(engine.offline_status()), DownloadStatus::Done);
}
