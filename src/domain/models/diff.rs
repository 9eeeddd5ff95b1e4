// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::extraction::PricingSignal;
use crate::domain::models::severity::Severity;
use serde::{Deserialize, Serialize};

/// 同一价格上下文下的价格变化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingChange {
    pub previous: PricingSignal,
    pub current: PricingSignal,
    pub delta: f64,
    /// 比例形式，0.2069 表示上涨 20.69%
    pub percent_change: f64,
}

/// 标题列表变化
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingChange {
    pub previous: Vec<String>,
    pub current: Vec<String>,
}

/// 功能列表变化（已去重并排序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureChange {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// 表格变化，只报告数量
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableChange {
    pub previous_count: usize,
    pub current_count: usize,
}

/// 结构化变化集合
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredChanges {
    pub pricing_changes: Vec<PricingChange>,
    pub new_plans: Vec<PricingSignal>,
    pub removed_plans: Vec<PricingSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_changes: Option<HeadingChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_changes: Option<FeatureChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_changes: Option<TableChange>,
}

impl StructuredChanges {
    /// 是否存在任何价格相关的变化
    pub fn has_pricing_signal_changes(&self) -> bool {
        !self.pricing_changes.is_empty() || !self.new_plans.is_empty() || !self.removed_plans.is_empty()
    }

    pub fn has_plan_changes(&self) -> bool {
        !self.new_plans.is_empty() || !self.removed_plans.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_pricing_signal_changes()
            && self.heading_changes.is_none()
            && self.feature_changes.is_none()
            && self.table_changes.is_none()
    }
}

/// 确定性差异结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    pub change_detected: bool,
    /// 始终为 false，是否调用语言模型由路由器决定
    pub requires_llm: bool,
    pub confidence: f64,
    pub structured_changes: StructuredChanges,
    pub severity: Severity,
}

/// 路由决策
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterDecision {
    pub requires_llm: bool,
    pub reason: String,
}
