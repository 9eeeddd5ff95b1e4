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

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 传输层失败（连接、TLS、读取响应体）
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 引擎自身的超时
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// 其他错误，如浏览器启动或导航失败
    #[error("{0}")]
    Other(String),
}

impl EngineError {
    pub fn is_timeout(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => e.is_timeout(),
            EngineError::Timeout(_) => true,
            EngineError::Other(_) => false,
        }
    }
}

/// 单次页面加载请求
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub url: String,
    pub user_agent: String,
    /// 单次尝试的超时
    pub timeout: Duration,
}

impl PageRequest {
    pub fn new(url: impl Into<String>, user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            user_agent: user_agent.into(),
            timeout,
        }
    }
}

/// 页面加载结果
///
/// 非2xx状态码同样以响应形式返回
#[derive(Debug, Clone, PartialEq)]
pub struct PageResponse {
    pub status_code: u16,
    /// 响应体或渲染后的HTML
    pub body: String,
    /// 跟随重定向后的最终URL
    pub final_url: String,
}

impl PageResponse {
    /// 状态码在 200..400 之间且内容非空
    pub fn is_usable(&self) -> bool {
        (200..400).contains(&self.status_code) && !self.body.trim().is_empty()
    }
}

/// 页面加载引擎
///
/// 引擎只负责取回内容，状态码是否可接受由抓取器判断
#[async_trait]
pub trait ScraperEngine: Send + Sync {
    async fn load(&self, request: &PageRequest) -> Result<PageResponse, EngineError>;

    fn name(&self) -> &'static str;
}
