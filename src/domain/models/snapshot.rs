// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::fetch_result::FetchResult;
use crate::domain::services::extractor;
use crate::utils::fingerprint::content_fingerprint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 被监控页面
///
/// 由外部存储协作方提供，这里只保留检测流水线需要的字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredPage {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    /// 页面类别，如 pricing、features、terms
    pub page_type: Option<String>,
}

impl MonitoredPage {
    pub fn new(id: i64, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            title: None,
            page_type: None,
        }
    }
}

/// 页面快照
///
/// 一次抓取的持久化形态。`id` 由存储协作方分配，保存前为 0。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub id: i64,
    pub page_id: i64,
    pub success: bool,
    pub raw_html: Option<String>,
    pub cleaned_text: Option<String>,
    /// 清洗文本的 SHA-256 指纹
    pub content_hash: Option<String>,
    pub page_title: Option<String>,
    pub http_status_code: Option<u16>,
    pub error_message: Option<String>,
    pub load_time_ms: u64,
    pub used_fallback_renderer: bool,
    pub captured_at: DateTime<Utc>,
}

impl PageSnapshot {
    /// 根据抓取结果构建快照
    pub fn from_fetch(page_id: i64, fetch: &FetchResult) -> Self {
        let (cleaned_text, page_title) = match fetch.content() {
            Some(html) => (
                Some(extractor::visible_text(html)).filter(|text| !text.is_empty()),
                extractor::page_title(html),
            ),
            None => (None, None),
        };
        let content_hash = cleaned_text.as_deref().map(content_fingerprint);

        Self {
            id: 0,
            page_id,
            success: fetch.success,
            raw_html: fetch.html.clone(),
            cleaned_text,
            content_hash,
            page_title,
            http_status_code: fetch.status_code,
            error_message: fetch.error.clone(),
            load_time_ms: fetch.elapsed_ms,
            used_fallback_renderer: fetch.used_fallback_renderer,
            captured_at: Utc::now(),
        }
    }

    /// 由已清洗文本直接构建成功快照
    pub fn from_text(page_id: i64, raw_html: Option<String>, cleaned_text: impl Into<String>) -> Self {
        let cleaned_text = cleaned_text.into();
        Self {
            id: 0,
            page_id,
            success: true,
            raw_html,
            content_hash: Some(content_fingerprint(&cleaned_text)),
            cleaned_text: Some(cleaned_text),
            page_title: None,
            http_status_code: Some(200),
            error_message: None,
            load_time_ms: 0,
            used_fallback_renderer: false,
            captured_at: Utc::now(),
        }
    }

    /// 是否包含可分析的文本
    pub fn has_content(&self) -> bool {
        self.success
            && self
                .cleaned_text
                .as_deref()
                .map(|text| !text.trim().is_empty())
                .unwrap_or(false)
    }

    /// 内容指纹，缺失时根据清洗文本即时计算
    pub fn fingerprint(&self) -> Option<String> {
        self.content_hash
            .clone()
            .or_else(|| self.cleaned_text.as_deref().map(content_fingerprint))
    }

    /// 提取阶段的输入：优先原始HTML，其次清洗文本
    pub fn extraction_input(&self) -> &str {
        self.raw_html
            .as_deref()
            .filter(|html| !html.is_empty())
            .or(self.cleaned_text.as_deref())
            .unwrap_or("")
    }

    pub fn text(&self) -> &str {
        self.cleaned_text.as_deref().unwrap_or("")
    }
}
