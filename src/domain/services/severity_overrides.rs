// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DetectionSettings;
use crate::domain::models::change_record::ChangeRecord;
use crate::domain::models::severity::Severity;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::info;

static CURRENCY_AMOUNT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\$€£¥]\s*\d+(?:[.,]\d{2})?|\d+(?:[.,]\d{2})?\s*[\$€£¥]")
        .expect("valid currency amount pattern")
});
static PERCENTAGE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("valid percentage pattern"));

const LEGAL_PAGE_TYPES: [&str; 5] = ["terms", "compliance", "legal", "privacy", "policy"];
const LEGAL_OVERRIDE_NOTE: &str = " [Auto-elevated: Legal/compliance page change]";
const PRICE_OVERRIDE_NOTE: &str = " [Auto-elevated: Price changes detected]";

/// 规则层严重度覆盖
///
/// 在所有语义结果合并之后执行，依次为：
/// 1. 金额变化：LOW 提升为 MEDIUM
/// 2. 百分比变化超过阈值：LOW/MEDIUM 提升为 HIGH
/// 3. 法务与合规类页面：提升为 HIGH
///
/// 每条规则都可以通过 `DetectionSettings` 单独关闭，
/// 只作用于已检测到变化的记录
pub fn apply_severity_overrides(
    record: &mut ChangeRecord,
    previous_text: &str,
    current_text: &str,
    page_type: Option<&str>,
    settings: &DetectionSettings,
) {
    if settings.apply_price_overrides {
        apply_price_override(record, previous_text, current_text);
    }
    if settings.apply_percentage_overrides {
        apply_percentage_override(
            record,
            previous_text,
            current_text,
            settings.percentage_override_points,
        );
    }
    if settings.apply_page_type_overrides {
        apply_page_type_overrides(record, page_type);
    }
}

/// 两侧都出现金额且金额集合不同时，LOW 至少提升为 MEDIUM
pub fn apply_price_override(record: &mut ChangeRecord, previous_text: &str, current_text: &str) {
    if !record.change_detected || record.severity != Severity::Low {
        return;
    }
    if !currency_amounts_changed(previous_text, current_text) {
        return;
    }

    record.set_severity(Severity::Medium);
    record.business_impact.push_str(PRICE_OVERRIDE_NOTE);
    info!("Severity elevated to medium due to price changes");
}

/// 百分比最大变化幅度超过 `threshold_points` 个百分点时提升为 HIGH
pub fn apply_percentage_override(
    record: &mut ChangeRecord,
    previous_text: &str,
    current_text: &str,
    threshold_points: f64,
) {
    if !record.change_detected || record.severity > Severity::Medium {
        return;
    }
    let Some(change) = largest_percentage_change(previous_text, current_text) else {
        return;
    };
    if change <= threshold_points {
        return;
    }

    record.set_severity(Severity::High);
    record
        .business_impact
        .push_str(&format!(" [Auto-elevated: {:.1}% change detected]", change));
    info!("Severity elevated to high due to {:.1}% change", change);
}

/// 法务与合规类页面的变化至少为 HIGH
pub fn apply_page_type_overrides(record: &mut ChangeRecord, page_type: Option<&str>) {
    let Some(page_type) = page_type else {
        return;
    };
    let page_type = page_type.trim().to_lowercase();
    if !LEGAL_PAGE_TYPES.contains(&page_type.as_str()) {
        return;
    }

    if record.change_detected && record.severity != Severity::Critical {
        record.set_severity(Severity::High);
        record.business_impact.push_str(LEGAL_OVERRIDE_NOTE);
        info!("Severity elevated to high due to legal page change");
    }
}

/// 比较两侧带货币符号的金额文本集合
fn currency_amounts_changed(previous_text: &str, current_text: &str) -> bool {
    let previous = currency_amounts(previous_text);
    let current = currency_amounts(current_text);

    !previous.is_empty() && !current.is_empty() && previous != current
}

fn currency_amounts(text: &str) -> HashSet<&str> {
    CURRENCY_AMOUNT_REGEX
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}

/// 两侧任意一对百分比之间的最大差值，没有差异时返回 None
fn largest_percentage_change(previous_text: &str, current_text: &str) -> Option<f64> {
    let previous = percentages(previous_text);
    let current = percentages(current_text);

    let largest = current
        .iter()
        .flat_map(|curr| previous.iter().map(move |prev| (curr - prev).abs()))
        .fold(0.0_f64, f64::max);

    (largest > 0.0).then_some(largest)
}

fn percentages(text: &str) -> Vec<f64> {
    PERCENTAGE_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse().ok())
        .collect()
}
