// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了变更检测流水线的核心实体，包括：
/// - 抓取结果（fetch_result）：一次抓取的归一化结果
/// - 快照（snapshot）：被监控页面及其某次抓取的持久化形态
/// - 结构化提取（extraction）：价格、标题、功能列表、表格与清洗文本
/// - 差异（diff）：确定性差异结果与路由决策
/// - 语义分析（analysis）：快速层与深度层的分析结果
/// - 变更记录（change_record）：流水线的最终输出
/// - 严重程度（severity）：严重程度与变更类型及其线上字符串映射
///
/// 所有实体都只在一次页面检查内创建和使用，只有变更记录会
/// 交给存储协作方持久化。
pub mod analysis;
pub mod change_record;
pub mod diff;
pub mod extraction;
pub mod fetch_result;
pub mod severity;
pub mod snapshot;
