// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::analysis::{DeepAnalysis, SemanticAnalysis};
use crate::domain::models::change_record::ChangeRecord;

/// 用覆盖值替换基础值，仅当覆盖值存在且满足存在性判断时生效
///
/// 返回是否发生了替换
pub fn overlay_field<T>(base: &mut T, overlay: Option<T>, is_present: impl Fn(&T) -> bool) -> bool {
    match overlay {
        Some(value) if is_present(&value) => {
            *base = value;
            true
        }
        _ => false,
    }
}

/// 文本字段的存在性判断：非空白
pub fn non_blank(value: &String) -> bool {
    !value.trim().is_empty()
}

fn always<T>(_: &T) -> bool {
    true
}

/// 快速层结果整体替换确定性分类
///
/// 快速层未给出摘要时保留现有的规则摘要
pub fn apply_fast_tier(record: &mut ChangeRecord, analysis: &SemanticAnalysis) {
    record.change_detected = analysis.change_detected;
    overlay_field(&mut record.summary, analysis.summary.clone(), non_blank);
    record.change_type = analysis.change_type;
    record.set_severity(analysis.severity);
    record.business_impact = analysis.business_impact.clone();
    record.recommended_action = analysis.recommended_action.clone();
    record.confidence = analysis.confidence;
    record.llm_analysis = serde_json::to_value(analysis).ok();
}

/// 深度层结果的非破坏性覆盖：缺失或为空的字段不会覆盖已有值
pub fn apply_deep_analysis(record: &mut ChangeRecord, analysis: DeepAnalysis) {
    overlay_field(&mut record.summary, analysis.summary, non_blank);
    overlay_field(&mut record.change_type, analysis.change_type, always);
    if let Some(severity) = analysis.severity {
        record.set_severity(severity);
    }
    overlay_field(&mut record.business_impact, analysis.business_impact, non_blank);
    overlay_field(&mut record.recommended_action, analysis.recommended_action, non_blank);

    if let Some(comparison) = analysis.human_readable_comparison.filter(non_blank) {
        record.human_readable_comparison = Some(comparison);
    }
}
