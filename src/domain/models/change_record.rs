// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::diff::StructuredChanges;
use crate::domain::models::severity::{ChangeType, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 变更记录
///
/// 检测流水线的唯一输出，之后由存储协作方持久化并用于告警决策
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// 关联的被监控页面ID
    pub page_id: i64,
    /// 触发本次检测的快照ID
    pub snapshot_id: i64,
    pub change_detected: bool,
    pub summary: String,
    pub change_type: ChangeType,
    pub severity: Severity,
    /// 严重程度数值分数 (1-4)
    pub severity_score: u8,
    pub business_impact: String,
    pub recommended_action: String,
    /// 确定性结构化差异
    pub structured_diff: StructuredChanges,
    /// 快速层原始JSON
    pub llm_analysis: Option<serde_json::Value>,
    /// 深度层生成的叙述性对比
    pub human_readable_comparison: Option<String>,
    pub requires_llm: bool,
    pub confidence: f64,
    pub diff_preview: String,
    pub detected_at: DateTime<Utc>,
}

impl ChangeRecord {
    /// 内容指纹一致时输出的“无变化”记录
    pub fn unchanged(page_id: i64, snapshot_id: i64) -> Self {
        Self {
            page_id,
            snapshot_id,
            change_detected: false,
            summary: "No changes detected".to_string(),
            change_type: ChangeType::Other,
            severity: Severity::Low,
            severity_score: Severity::Low.score(),
            business_impact: String::new(),
            recommended_action: String::new(),
            structured_diff: StructuredChanges::default(),
            llm_analysis: None,
            human_readable_comparison: None,
            requires_llm: false,
            confidence: 0.9,
            diff_preview: String::new(),
            detected_at: Utc::now(),
        }
    }

    /// 设置严重程度并同步数值分数
    pub fn set_severity(&mut self, severity: Severity) {
        self.severity = severity;
        self.severity_score = severity.score();
    }

    /// 影响或建议字段是否仍然信息不足
    pub fn is_impact_thin(&self, min_chars: usize) -> bool {
        self.business_impact.trim().chars().count() < min_chars
            || self.recommended_action.trim().chars().count() < min_chars
    }

    /// 是否应该触发告警：检测到变化且严重程度不低于 MEDIUM
    pub fn should_alert(&self) -> bool {
        self.change_detected && self.severity >= Severity::Medium
    }
}
