// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：抓取结果、快照、结构化提取、差异与变更记录
/// - 仓库接口（repositories）：快照与变更记录的持久化抽象
/// - 服务（services）：提取、差异、路由、语义合并与检测编排
///
/// 领域层只依赖抽象接口，存储与语义后端由外部注入。
pub mod models;
pub mod repositories;
pub mod services;
