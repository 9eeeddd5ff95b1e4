// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 快照与变更记录存储的错误
///
/// 具体存储由宿主实现，这里只约定错误形态
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 存储后端不可用或写入失败
    #[error("Storage backend error: {0}")]
    DatabaseError(String),

    /// 被引用的页面或快照不存在
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal repository error: {0}")]
    InternalError(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(e: serde_json::Error) -> Self {
        RepositoryError::InternalError(format!("serialization failed: {}", e))
    }
}
