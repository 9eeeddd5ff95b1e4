// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 抓取结果实体
///
/// 一次完整抓取（含重试与回退）的归一化结果，创建后不可变。
/// 不变量：`success == true` 时 `html` 非空且 `error` 为空。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    /// 请求的URL
    pub url: String,
    /// 是否成功
    pub success: bool,
    /// 最后一次响应的HTTP状态码
    pub status_code: Option<u16>,
    /// 页面内容
    pub html: Option<String>,
    /// 最终URL
    pub final_url: Option<String>,
    /// 人类可读的错误信息
    pub error: Option<String>,
    /// 是否使用了浏览器渲染回退
    pub used_fallback_renderer: bool,
    /// 尝试次数
    pub attempt_count: u32,
    /// 总耗时（毫秒）
    pub elapsed_ms: u64,
}

impl FetchResult {
    /// 创建成功结果
    ///
    /// 内容为空时降级为失败结果，以保证不变量
    pub fn succeeded(
        url: impl Into<String>,
        status_code: u16,
        html: String,
        final_url: impl Into<String>,
        attempt_count: u32,
        elapsed_ms: u64,
    ) -> Self {
        let url = url.into();
        if html.trim().is_empty() {
            return Self {
                status_code: Some(status_code),
                final_url: Some(final_url.into()),
                ..Self::failed(url, "Empty response body", attempt_count, elapsed_ms)
            };
        }

        Self {
            url,
            success: true,
            status_code: Some(status_code),
            html: Some(html),
            final_url: Some(final_url.into()),
            error: None,
            used_fallback_renderer: false,
            attempt_count,
            elapsed_ms,
        }
    }

    /// 创建失败结果
    pub fn failed(
        url: impl Into<String>,
        error: impl Into<String>,
        attempt_count: u32,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            url: url.into(),
            success: false,
            status_code: None,
            html: None,
            final_url: None,
            error: Some(error.into()),
            used_fallback_renderer: false,
            attempt_count,
            elapsed_ms,
        }
    }

    /// 标记为回退渲染的结果
    pub fn from_fallback(mut self, attempt_count: u32) -> Self {
        self.used_fallback_renderer = true;
        self.attempt_count = attempt_count;
        self
    }

    /// 成功时返回页面内容
    pub fn content(&self) -> Option<&str> {
        if self.success {
            self.html.as_deref()
        } else {
            None
        }
    }
}
