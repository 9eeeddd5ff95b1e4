// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 具体实现由外部存储协作方提供，测试中使用内存实现。
///
/// 包含的仓库接口：
/// - 变更记录仓库（change_record_repository）：持久化检测结果
/// - 快照仓库（snapshot_repository）：基线查询与快照保存
pub mod change_record_repository;
pub mod snapshot_repository;
