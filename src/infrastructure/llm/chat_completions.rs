// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::SemanticError;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::warn;

/// OpenAI 兼容的 chat completions 客户端
///
/// 每次调用都要求 JSON 对象格式的回复，并受客户端超时约束
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f64,
    api_base_url: String,
}

impl ChatCompletionsClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f64,
        api_base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SemanticError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            api_base_url: api_base_url.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 发送一次对话请求并解析回复中的JSON对象
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(Map))` - 回复内容是合法的JSON对象
    /// * `Ok(None)` - 回复为空或不是合法的JSON对象
    /// * `Err(SemanticError)` - 传输错误或非成功状态码
    pub async fn complete_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Option<Map<String, Value>>, SemanticError> {
        let request_body = json!({
            "model": self.model,
            "temperature": self.temperature,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt }
            ]
        });

        let url = format!("{}/chat/completions", self.api_base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SemanticError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SemanticError::InvalidResponse(e.to_string()))?;

        let Some(content) = body["choices"][0]["message"]["content"].as_str() else {
            warn!("Chat completion response has no message content");
            return Ok(None);
        };

        Ok(parse_json_object(content))
    }
}

/// 解析模型回复，容忍 markdown 代码块包裹
pub fn parse_json_object(content: &str) -> Option<Map<String, Value>> {
    let clean_content = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if clean_content.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(clean_content) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            warn!("Chat completion content is JSON but not an object");
            None
        }
        Err(e) => {
            warn!("Failed to parse chat completion content as JSON: {}", e);
            None
        }
    }
}
