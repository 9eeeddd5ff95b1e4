// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::snapshot::PageSnapshot;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;

/// 快照仓库特质
///
/// 由外部存储协作方实现，检测流水线只依赖这里定义的两个操作。
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// 查找基线快照
    ///
    /// # 参数
    ///
    /// * `page_id` - 被监控页面ID
    /// * `before_snapshot_id` - 当前快照ID，只返回早于它的快照
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(PageSnapshot))` - 最近一次成功的快照
    /// * `Ok(None)` - 不存在历史快照（首次抓取）
    /// * `Err(RepositoryError)` - 查询失败
    async fn get_previous_snapshot(
        &self,
        page_id: i64,
        before_snapshot_id: i64,
    ) -> Result<Option<PageSnapshot>, RepositoryError>;

    /// 保存快照
    ///
    /// # 返回值
    ///
    /// * `Ok(PageSnapshot)` - 已分配ID的快照
    /// * `Err(RepositoryError)` - 保存失败
    async fn save_snapshot(&self, snapshot: PageSnapshot) -> Result<PageSnapshot, RepositoryError>;
}
