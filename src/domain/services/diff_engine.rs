// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::DiffSettings;
use crate::domain::models::diff::{
    DiffResult, FeatureChange, HeadingChange, PricingChange, StructuredChanges, TableChange,
};
use crate::domain::models::extraction::{PricingSignal, StructuredExtraction};
use crate::domain::models::severity::Severity;
use std::collections::{BTreeSet, HashMap};

const PRICING_KEY_CHARS: usize = 100;
const BASE_CONFIDENCE: f64 = 0.8;
const NO_CHANGE_CONFIDENCE: f64 = 0.6;
const SIGNIFICANT_INCREASE_CONFIDENCE: f64 = 0.9;
const MINOR_CHANGE_CONFIDENCE: f64 = 0.75;

/// 使用默认阈值比较两次结构化提取结果
pub fn diff(previous: &StructuredExtraction, current: &StructuredExtraction) -> DiffResult {
    diff_with(previous, current, &DiffSettings::default())
}

/// 比较两次结构化提取结果
///
/// 纯函数：只读取输入，不产生副作用。价格信号是本阶段唯一能自动提升严重程度的途径。
///
/// # 参数
///
/// * `previous` - 基线提取结果
/// * `current` - 当前提取结果
/// * `settings` - 价格变化阈值
pub fn diff_with(
    previous: &StructuredExtraction,
    current: &StructuredExtraction,
    settings: &DiffSettings,
) -> DiffResult {
    let mut changes = StructuredChanges::default();
    let mut severity = Severity::Low;
    let mut confidence = BASE_CONFIDENCE;

    let previous_index = PricingIndex::build(&previous.pricing);
    let current_index = PricingIndex::build(&current.pricing);

    for (key, prev_signal) in &previous_index.entries {
        let Some(curr_signal) = current_index.get(key) else {
            changes.removed_plans.push((*prev_signal).clone());
            severity = severity.escalate_to(Severity::Medium);
            continue;
        };

        let (Some(prev_price), Some(curr_price)) = (
            normalize_price(&prev_signal.raw),
            normalize_price(&curr_signal.raw),
        ) else {
            continue;
        };
        if prev_price <= 0.0 {
            continue;
        }

        let delta = curr_price - prev_price;
        let percent_change = delta / prev_price;
        if percent_change.abs() <= settings.noise_floor_ratio {
            continue;
        }

        changes.pricing_changes.push(PricingChange {
            previous: (*prev_signal).clone(),
            current: curr_signal.clone(),
            delta,
            percent_change,
        });

        if percent_change > settings.significant_increase_ratio {
            severity = severity.escalate_to(Severity::High);
            confidence = confidence.max(SIGNIFICANT_INCREASE_CONFIDENCE);
        }
    }

    for (key, curr_signal) in &current_index.entries {
        if previous_index.get(key).is_none() {
            changes.new_plans.push((*curr_signal).clone());
            severity = severity.escalate_to(Severity::Medium);
        }
    }

    let previous_headings = heading_texts(previous);
    let current_headings = heading_texts(current);
    if previous_headings != current_headings {
        changes.heading_changes = Some(HeadingChange {
            previous: previous_headings,
            current: current_headings,
        });
    }

    let previous_features = flatten_features(previous);
    let current_features = flatten_features(current);
    let added: Vec<String> = current_features
        .difference(&previous_features)
        .map(|item| item.to_string())
        .collect();
    let removed: Vec<String> = previous_features
        .difference(&current_features)
        .map(|item| item.to_string())
        .collect();
    if !added.is_empty() || !removed.is_empty() {
        changes.feature_changes = Some(FeatureChange { added, removed });
    }

    if previous.tables != current.tables {
        changes.table_changes = Some(TableChange {
            previous_count: previous.tables.len(),
            current_count: current.tables.len(),
        });
    }

    let change_detected = !changes.is_empty();
    if !change_detected {
        confidence = NO_CHANGE_CONFIDENCE;
    }

    // Heading or feature churn alone never escalates
    if !changes.has_pricing_signal_changes()
        && (changes.heading_changes.is_some() || changes.feature_changes.is_some())
    {
        severity = Severity::Low;
        confidence = confidence.max(MINOR_CHANGE_CONFIDENCE);
    }

    DiffResult {
        change_detected,
        requires_llm: false,
        confidence,
        structured_changes: changes,
        severity,
    }
}

/// 价格信号索引，键为上下文前100个字符的小写形式，同键保留首次出现
struct PricingIndex<'a> {
    entries: Vec<(String, &'a PricingSignal)>,
    lookup: HashMap<String, &'a PricingSignal>,
}

impl<'a> PricingIndex<'a> {
    fn build(signals: &'a [PricingSignal]) -> Self {
        let mut entries = Vec::new();
        let mut lookup = HashMap::new();

        for signal in signals {
            let key = pricing_key(&signal.context);
            if lookup.contains_key(&key) {
                continue;
            }
            lookup.insert(key.clone(), signal);
            entries.push((key, signal));
        }

        Self { entries, lookup }
    }

    fn get(&self, key: &str) -> Option<&'a PricingSignal> {
        self.lookup.get(key).copied()
    }
}

fn pricing_key(context: &str) -> String {
    context
        .chars()
        .take(PRICING_KEY_CHARS)
        .collect::<String>()
        .to_lowercase()
}

/// 去掉千分位和美元符号后解析价格
fn normalize_price(raw: &str) -> Option<f64> {
    raw.replace([',', '$'], "").trim().parse().ok()
}

fn heading_texts(extraction: &StructuredExtraction) -> Vec<String> {
    extraction
        .headings
        .iter()
        .map(|heading| heading.text.clone())
        .collect()
}

fn flatten_features(extraction: &StructuredExtraction) -> BTreeSet<&str> {
    extraction
        .features
        .iter()
        .flatten()
        .map(String::as_str)
        .collect()
}
