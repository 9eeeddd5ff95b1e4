// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::chat_completions::ChatCompletionsClient;
use super::SemanticError;
use crate::config::settings::GroqSettings;
use crate::domain::models::analysis::SemanticAnalysis;
use crate::domain::models::severity::{ChangeType, Severity};
use crate::domain::services::semantic::{FastTierAnalyzer, FastTierRequest, SemanticTier};
use crate::infrastructure::observability::metrics::{SEMANTIC_CALLS_TOTAL, SEMANTIC_FAILURES_TOTAL};
use async_trait::async_trait;
use metrics::counter;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const TIER: &str = "fast";

const SYSTEM_PROMPT: &str = "You are a competitive intelligence analyst.\n\
Analyze website change fragments.\n\
Return only valid JSON.\n\
No markdown.\n\
No explanations.\n\
Do not hallucinate.\n\
Base conclusions only on provided content.";

const RESPONSE_FORMAT: &str = r#"{
  "change_detected": true or false,
  "change_type": "pricing|features|policy|content|layout|other",
  "severity": "low|medium|high|critical",
  "business_impact": "How this change affects our business",
  "recommended_action": "What we should do in response",
  "confidence": 0.0 to 1.0
}"#;

/// 快速层分析器
///
/// 通过 Groq 的 OpenAI 兼容接口分析缩减后的结构化片段
pub struct GroqAnalyzer {
    client: ChatCompletionsClient,
}

impl GroqAnalyzer {
    /// 创建分析器，未配置 API 密钥时返回 `NotConfigured`
    pub fn new(settings: &GroqSettings) -> Result<Self, SemanticError> {
        let api_key = match settings.api_key.as_deref() {
            Some(key) if settings.has_credentials() => key,
            _ => {
                return Err(SemanticError::NotConfigured(
                    "GROQ_API_KEY not configured".to_string(),
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

    /// 根据配置构建快速层，缺少凭据时返回禁用状态而不是报错
    pub fn tier(settings: &GroqSettings) -> SemanticTier<dyn FastTierAnalyzer> {
        match Self::new(settings) {
            Ok(analyzer) => {
                info!("Fast semantic tier enabled with model {}", analyzer.client.model());
                SemanticTier::enabled(Arc::new(analyzer))
            }
            Err(e) => {
                warn!("Fast semantic tier disabled: {}", e);
                SemanticTier::disabled(e.to_string())
            }
        }
    }

    fn build_prompt(request: &FastTierRequest) -> String {
        format!(
            "Previous structured summary:\n{}\n\n\
             New structured summary:\n{}\n\n\
             Changed text blocks:\n{}\n\n\
             Return JSON only in this exact format:\n{}",
            request.previous_structured,
            request.current_structured,
            request.changed_fragments,
            RESPONSE_FORMAT
        )
    }
}

/// 归一化快速层回复，未知或缺失的字段取默认值
pub fn normalize_analysis(data: &Map<String, Value>) -> SemanticAnalysis {
    let text = |key: &str| {
        data.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    SemanticAnalysis {
        change_detected: data
            .get("change_detected")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        change_type: data
            .get("change_type")
            .and_then(Value::as_str)
            .and_then(ChangeType::parse)
            .unwrap_or(ChangeType::Other),
        severity: data
            .get("severity")
            .and_then(Value::as_str)
            .and_then(Severity::parse)
            .unwrap_or(Severity::Low),
        business_impact: text("business_impact"),
        recommended_action: text("recommended_action"),
        confidence: data
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0),
        summary: data
            .get("summary")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|summary| !summary.is_empty())
            .map(str::to_string),
    }
}

#[async_trait]
impl FastTierAnalyzer for GroqAnalyzer {
    async fn analyze(&self, request: &FastTierRequest) -> Option<SemanticAnalysis> {
        counter!(SEMANTIC_CALLS_TOTAL, "tier" => TIER).increment(1);

        match self
            .client
            .complete_json(SYSTEM_PROMPT, &Self::build_prompt(request))
            .await
        {
            Ok(Some(data)) => Some(normalize_analysis(&data)),
            Ok(None) => {
                warn!("Fast semantic tier returned no usable JSON");
                counter!(SEMANTIC_FAILURES_TOTAL, "tier" => TIER).increment(1);
                None
            }
            Err(e) => {
                error!("Fast semantic tier analysis failed: {}", e);
                counter!(SEMANTIC_FAILURES_TOTAL, "tier" => TIER).increment(1);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "groq"
    }
}
