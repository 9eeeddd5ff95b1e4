// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含变更检测流水线的核心业务逻辑。
///
/// 包含的服务：
/// - 变更检测服务（change_detection_service）：编排一次页面检查的各个阶段
/// - 差异引擎（diff_engine）：比较两次结构化提取结果
/// - 提取器（extractor）：从HTML中确定性地提取价格、标题、功能和表格
/// - 合并（merge）：语义结果与确定性结果的字段级合并
/// - 监控服务（monitoring_service）：抓取、保存快照并触发检测
/// - 路由器（router）：决定是否需要语义分析
/// - 语义能力（semantic）：快速层与深度层分析器的抽象
/// - 严重度覆盖（severity_overrides）：金额、百分比与法务页面的规则层
///
/// 除编排服务外，提取、差异、路由与合并都是不依赖网络的纯函数。
pub mod change_detection_service;
pub mod diff_engine;
pub mod extractor;
pub mod merge;
pub mod monitoring_service;
pub mod router;
pub mod semantic;
pub mod severity_overrides;
