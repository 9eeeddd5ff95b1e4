// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::change_record::ChangeRecord;
use crate::domain::models::fetch_result::FetchResult;
use crate::domain::models::snapshot::{MonitoredPage, PageSnapshot};
use crate::domain::repositories::snapshot_repository::SnapshotRepository;
use crate::domain::services::change_detection_service::{ChangeDetectionService, DetectionError};
use crate::engines::fetcher::Fetcher;
use std::sync::Arc;
use tracing::{info, warn};

/// 一次页面检查的结果
#[derive(Debug, Clone)]
pub struct PageCheckOutcome {
    /// 已持久化的快照
    pub snapshot: PageSnapshot,
    /// 变更记录，首次抓取或抓取失败时为空
    pub record: Option<ChangeRecord>,
}

/// 监控服务
///
/// 串联一次页面检查：抓取 -> 保存快照 -> 变更检测
pub struct MonitoringService {
    fetcher: Arc<Fetcher>,
    snapshot_repository: Arc<dyn SnapshotRepository>,
    detector: Arc<ChangeDetectionService>,
}

impl MonitoringService {
    pub fn new(
        fetcher: Arc<Fetcher>,
        snapshot_repository: Arc<dyn SnapshotRepository>,
        detector: Arc<ChangeDetectionService>,
    ) -> Self {
        Self {
            fetcher,
            snapshot_repository,
            detector,
        }
    }

    /// 检查一个被监控页面
    ///
    /// URL 校验失败会生成一个失败快照；快照保存失败与变更记录持久化失败会向上传播
    pub async fn check_page(&self, page: &MonitoredPage) -> Result<PageCheckOutcome, DetectionError> {
        info!("Checking page: {}", page.url);

        let fetch = match self.fetcher.fetch(&page.url).await {
            Ok(fetch) => fetch,
            Err(e) => {
                warn!("Rejected URL for page {}: {}", page.id, e);
                FetchResult::failed(page.url.as_str(), e.to_string(), 0, 0)
            }
        };

        let snapshot = self
            .snapshot_repository
            .save_snapshot(PageSnapshot::from_fetch(page.id, &fetch))
            .await?;
        info!("Snapshot created: ID={}, Success={}", snapshot.id, snapshot.success);

        let record = self.detector.detect_and_analyze_changes(&snapshot, page).await?;

        Ok(PageCheckOutcome { snapshot, record })
    }
}
