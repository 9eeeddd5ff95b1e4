// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::change_record::ChangeRecord;
use crate::utils::errors::RepositoryError;
use async_trait::async_trait;

/// 变更记录仓库特质
#[async_trait]
pub trait ChangeRecordRepository: Send + Sync {
    /// 持久化最终的变更记录
    ///
    /// 这是一次检测中唯一允许向调用方传播失败的步骤
    async fn save(&self, record: ChangeRecord) -> Result<ChangeRecord, RepositoryError>;
}
