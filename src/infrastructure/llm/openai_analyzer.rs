// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::chat_completions::ChatCompletionsClient;
use super::SemanticError;
use crate::config::settings::OpenAiSettings;
use crate::domain::models::analysis::DeepAnalysis;
use crate::domain::models::severity::{ChangeType, Severity};
use crate::domain::services::semantic::{DeepAnalysisRequest, DeepAnalyzer, SemanticTier};
use crate::infrastructure::observability::metrics::{SEMANTIC_CALLS_TOTAL, SEMANTIC_FAILURES_TOTAL};
use async_trait::async_trait;
use metrics::counter;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const TIER: &str = "deep";

const SYSTEM_PROMPT: &str = "You are an expert business analyst specializing in competitive intelligence. \
Your task is to analyze changes on competitor websites and assess their business impact.";

/// 深度回退层分析器
///
/// 基于完整（已截断）的清洗文本给出更详细的分析与叙述性对比
pub struct OpenAiAnalyzer {
    client: ChatCompletionsClient,
}

impl OpenAiAnalyzer {
    /// 创建分析器，未配置 API 密钥时返回 `NotConfigured`
    pub fn new(settings: &OpenAiSettings) -> Result<Self, SemanticError> {
        let api_key = match settings.api_key.as_deref() {
            Some(key) if settings.has_credentials() => key,
            _ => {
                return Err(SemanticError::NotConfigured(
                    "OPENAI_API_KEY not configured".to_string(),
                ))
            }
        };

        let client = ChatCompletionsClient::new(
            api_key,
            settings.model.as_str(),
            settings.temperature,
            settings.base_url.as_str(),
            Duration::from_secs(settings.timeout_secs),
        )?;

        Ok(Self { client })
    }

    /// 根据配置构建深度层，缺少凭据时返回禁用状态
    pub fn tier(settings: &OpenAiSettings) -> SemanticTier<dyn DeepAnalyzer> {
        match Self::new(settings) {
            Ok(analyzer) => {
                info!("Deep semantic tier enabled with model {}", analyzer.client.model());
                SemanticTier::enabled(Arc::new(analyzer))
            }
            Err(e) => {
                warn!("Deep semantic tier disabled: {}", e);
                SemanticTier::disabled(e.to_string())
            }
        }
    }

    fn build_prompt(request: &DeepAnalysisRequest) -> String {
        let mut context = format!("URL: {}", request.url);
        if let Some(title) = request.title.as_deref().filter(|t| !t.is_empty()) {
            context.push_str(&format!("\nTitle: {}", title));
        }
        if let Some(page_type) = request.page_type.as_deref().filter(|t| !t.is_empty()) {
            context.push_str(&format!("\nPage Type: {}", page_type));
        }
        if !request.current_summary.is_empty() {
            context.push_str(&format!("\nCurrent assessment: {}", request.current_summary));
        }

        format!(
            r#"Analyze the changes between two versions of a competitor's web page and provide a detailed assessment.

{context}

PREVIOUS VERSION:
{previous}

CURRENT VERSION:
{current}

Your task is to:
1. Determine if there are any meaningful changes (ignore minor formatting/whitespace)
2. Classify the type of change
3. Assess the severity and business impact
4. Recommend actions to take
5. Describe the differences in plain language

Respond ONLY with valid JSON in this exact format:
{{
    "summary": "Brief 1-2 sentence summary of what changed",
    "change_type": "pricing|features|policy|content|layout|other",
    "severity": "low|medium|high|critical",
    "business_impact": "Detailed explanation of how this change affects our business",
    "recommended_action": "Specific action we should take in response",
    "human_readable_comparison": "Side-by-side narrative of what was there before and what is there now"
}}

Guidelines for severity:
- low: Minor content updates, cosmetic changes
- medium: Feature updates, content additions/removals
- high: Pricing changes, new major features, policy updates
- critical: Major pricing drops, legal/compliance changes, competitive threats

Be objective and focus on business implications."#,
            context = context,
            previous = request.previous_text,
            current = request.current_text,
        )
    }
}

/// 解析深度层回复，空字符串与无效枚举值都视为缺失
pub fn parse_deep_analysis(data: &Map<String, Value>) -> DeepAnalysis {
    let text = |key: &str| {
        data.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    DeepAnalysis {
        summary: text("summary"),
        change_type: text("change_type").and_then(|value| ChangeType::parse(&value)),
        severity: text("severity").and_then(|value| Severity::parse(&value)),
        business_impact: text("business_impact"),
        recommended_action: text("recommended_action"),
        human_readable_comparison: text("human_readable_comparison"),
    }
}

#[async_trait]
impl DeepAnalyzer for OpenAiAnalyzer {
    async fn analyze(&self, request: &DeepAnalysisRequest) -> Result<DeepAnalysis, SemanticError> {
        counter!(SEMANTIC_CALLS_TOTAL, "tier" => TIER).increment(1);

        let result = self
            .client
            .complete_json(SYSTEM_PROMPT, &Self::build_prompt(request))
            .await
            .and_then(|data| {
                data.map(|data| parse_deep_analysis(&data)).ok_or_else(|| {
                    SemanticError::InvalidResponse("response content is not a JSON object".to_string())
                })
            });

        if result.is_err() {
            counter!(SEMANTIC_FAILURES_TOTAL, "tier" => TIER).increment(1);
        }
        result
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
