// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::engines::traits::{EngineError, PageRequest, PageResponse, ScraperEngine};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::Client;

const MAX_REDIRECTS: usize = 10;

/// HTTP 页面加载引擎，抓取器的主路径
///
/// 持有一个共享的连接池；User-Agent 与超时按请求设置
#[derive(Clone)]
pub struct ReqwestEngine {
    client: Client,
}

impl Default for ReqwestEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestEngine {
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .default_headers(headers)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .cookie_store(true)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self { client }
    }
}

#[async_trait]
impl ScraperEngine for ReqwestEngine {
    /// 发送 GET 请求并读取完整响应体
    ///
    /// # 返回值
    ///
    /// * `Ok(PageResponse)` - 任意状态码的响应
    /// * `Err(EngineError)` - 传输层错误或超时
    async fn load(&self, request: &PageRequest) -> Result<PageResponse, EngineError> {
        let response = self
            .client
            .get(&request.url)
            .header(USER_AGENT, request.user_agent.as_str())
            .timeout(request.timeout)
            .send()
            .await?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await?;

        Ok(PageResponse {
            status_code,
            body,
            final_url,
        })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
