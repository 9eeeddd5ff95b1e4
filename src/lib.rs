// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、检测流水线服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 实现页面抓取引擎、URL 安全校验与有界并发抓取器
pub mod engines;

/// 基础设施模块
///
/// 提供语义后端客户端与指标定义
pub mod infrastructure;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
