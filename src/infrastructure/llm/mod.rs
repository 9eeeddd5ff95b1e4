// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 语言模型模块
///
/// - chat_completions：OpenAI 兼容的 chat completions 客户端
/// - groq_analyzer：快速层分析器（Groq）
/// - openai_analyzer：深度回退层分析器（OpenAI）
pub mod chat_completions;
pub mod groq_analyzer;
pub mod openai_analyzer;

use thiserror::Error;

/// 语义后端错误类型
#[derive(Error, Debug)]
pub enum SemanticError {
    /// 未配置凭据
    #[error("Semantic backend not configured: {0}")]
    NotConfigured(String),
    /// 传输层错误
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// 非成功状态码
    #[error("Backend returned error: {status} - {body}")]
    Status { status: u16, body: String },
    /// 响应格式无效
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
