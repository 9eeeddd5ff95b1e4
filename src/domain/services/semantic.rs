// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::analysis::{DeepAnalysis, SemanticAnalysis};
use crate::infrastructure::llm::SemanticError;
use async_trait::async_trait;
use std::sync::Arc;

const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

/// 快速层请求
///
/// 只包含缩减后的结构化片段，从不携带完整HTML
#[derive(Debug, Clone, PartialEq)]
pub struct FastTierRequest {
    /// 基线提取结果的JSON片段
    pub previous_structured: String,
    /// 当前提取结果的JSON片段
    pub current_structured: String,
    /// 变化文本片段
    pub changed_fragments: String,
}

/// 深度回退层请求
#[derive(Debug, Clone, PartialEq)]
pub struct DeepAnalysisRequest {
    pub url: String,
    pub title: Option<String>,
    pub page_type: Option<String>,
    /// 合并到目前为止的摘要
    pub current_summary: String,
    /// 已按上限截断的基线文本
    pub previous_text: String,
    /// 已按上限截断的当前文本
    pub current_text: String,
}

/// 快速层语义分析能力
///
/// 任何失败都以 `None` 表示“无结果”，不会中断检测
#[async_trait]
pub trait FastTierAnalyzer: Send + Sync {
    async fn analyze(&self, request: &FastTierRequest) -> Option<SemanticAnalysis>;

    fn name(&self) -> &'static str;
}

/// 深度回退层语义分析能力
#[async_trait]
pub trait DeepAnalyzer: Send + Sync {
    async fn analyze(&self, request: &DeepAnalysisRequest) -> Result<DeepAnalysis, SemanticError>;

    fn name(&self) -> &'static str;
}

/// 语义后端的可用性
///
/// 未配置凭据时为 `Disabled`，调用方总是得到一致的可选结果
pub enum SemanticTier<T: ?Sized> {
    Enabled(Arc<T>),
    Disabled { reason: String },
}

impl<T: ?Sized> SemanticTier<T> {
    pub fn enabled(analyzer: Arc<T>) -> Self {
        SemanticTier::Enabled(analyzer)
    }

    pub fn disabled(reason: impl Into<String>) -> Self {
        SemanticTier::Disabled {
            reason: reason.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, SemanticTier::Enabled(_))
    }

    pub fn analyzer(&self) -> Option<&Arc<T>> {
        match self {
            SemanticTier::Enabled(analyzer) => Some(analyzer),
            SemanticTier::Disabled { .. } => None,
        }
    }
}

impl<T: ?Sized> Clone for SemanticTier<T> {
    fn clone(&self) -> Self {
        match self {
            SemanticTier::Enabled(analyzer) => SemanticTier::Enabled(Arc::clone(analyzer)),
            SemanticTier::Disabled { reason } => SemanticTier::Disabled {
                reason: reason.clone(),
            },
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for SemanticTier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SemanticTier::Enabled(_) => f.write_str("Enabled"),
            SemanticTier::Disabled { reason } => {
                f.debug_struct("Disabled").field("reason", reason).finish()
            }
        }
    }
}

/// 按字符数截断
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// 截断送入深度层的文本，超长时追加截断标记
pub fn truncate_for_prompt(text: &str, max_chars: usize) -> String {
    let truncated = truncate_chars(text, max_chars);
    if truncated.len() < text.len() {
        format!("{}{}", truncated, TRUNCATION_MARKER)
    } else {
        text.to_string()
    }
}
