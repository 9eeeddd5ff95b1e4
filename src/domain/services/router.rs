// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::RouterSettings;
use crate::domain::models::diff::RouterDecision;
use crate::domain::models::extraction::StructuredExtraction;
use strsim::levenshtein;
use tracing::debug;

/// 决定是否需要升级到语义分析
///
/// 按顺序匹配，首个命中的规则生效：
/// 1. 两侧都没有价格信号且文本差异率超过阈值
/// 2. 确定性置信度低于下限
/// 3. 否则不升级
///
/// # 参数
///
/// * `previous` / `current` - 两次结构化提取结果
/// * `previous_text` / `current_text` - 两次清洗文本
/// * `deterministic_confidence` - 差异引擎给出的置信度
/// * `settings` - 阈值，缺省使用 0.30 / 0.70
pub fn route(
    previous: &StructuredExtraction,
    current: &StructuredExtraction,
    previous_text: &str,
    current_text: &str,
    deterministic_confidence: f64,
    settings: Option<&RouterSettings>,
) -> RouterDecision {
    let settings = settings.copied().unwrap_or_default();

    let decision = if !previous.has_pricing() && !current.has_pricing() {
        let ratio = content_diff_ratio(previous_text, current_text);
        if ratio > settings.diff_ratio_threshold {
            Some(format!("large_text_diff_no_pricing (ratio={:.2})", ratio))
        } else {
            None
        }
    } else {
        None
    }
    .or_else(|| {
        (deterministic_confidence < settings.confidence_threshold)
            .then(|| format!("low_confidence ({:.2})", deterministic_confidence))
    })
    .map(|reason| RouterDecision {
        requires_llm: true,
        reason,
    })
    .unwrap_or_else(|| RouterDecision {
        requires_llm: false,
        reason: "deterministic_confident".to_string(),
    });

    debug!(
        "Router decision: requires_llm={}, reason={}",
        decision.requires_llm, decision.reason
    );
    decision
}

/// 文本差异率：1 减去归一化的字符序列相似度
///
/// 在原始字符串上按字符计算编辑距离，再除以较长一侧的字符数。
/// 一侧为空时，两侧相同返回 0.0，否则返回 1.0。
pub fn content_diff_ratio(previous: &str, current: &str) -> f64 {
    if previous.is_empty() || current.is_empty() {
        return if previous == current { 0.0 } else { 1.0 };
    }

    let previous: Vec<char> = previous.chars().collect();
    let current: Vec<char> = current.chars().collect();
    let longest = previous.len().max(current.len());

    // The shared prefix and suffix never contribute edits
    let prefix = previous
        .iter()
        .zip(&current)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = previous[prefix..]
        .iter()
        .rev()
        .zip(current[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let previous: String = previous[prefix..previous.len() - suffix].iter().collect();
    let current: String = current[prefix..current.len() - suffix].iter().collect();

    levenshtein(&previous, &current) as f64 / longest as f64
}
