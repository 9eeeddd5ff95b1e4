// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::severity::{ChangeType, Severity};
use serde::{Deserialize, Serialize};

/// 快速层语义分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticAnalysis {
    pub change_detected: bool,
    pub change_type: ChangeType,
    pub severity: Severity,
    pub business_impact: String,
    pub recommended_action: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// 深度回退层分析结果
///
/// 所有字段都是可选的，缺失或为空的字段不会覆盖已有结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepAnalysis {
    pub summary: Option<String>,
    pub change_type: Option<ChangeType>,
    pub severity: Option<Severity>,
    pub business_impact: Option<String>,
    pub recommended_action: Option<String>,
    pub human_readable_comparison: Option<String>,
}
