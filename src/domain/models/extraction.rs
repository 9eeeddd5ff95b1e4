// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 价格信号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSignal {
    /// 匹配到的价格文本，如 "$29"
    pub raw: String,
    /// 同一文本节点中出现的货币符号
    pub currency: Option<String>,
    /// 是否同时出现百分号
    pub has_percent: bool,
    /// 计费周期，如 "per month"
    pub billing_term: Option<String>,
    /// 上下文：文本本身加上最近的前置标题，最多300字符
    pub context: String,
}

/// 标题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// 标题级别 (1-4)
    pub level: u8,
    pub text: String,
}

/// 结构化提取结果
///
/// 由页面HTML确定性地生成，创建后不再修改
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredExtraction {
    pub pricing: Vec<PricingSignal>,
    pub headings: Vec<Heading>,
    /// 每个无序列表一个块
    pub features: Vec<Vec<String>>,
    /// 表格 -> 行 -> 单元格
    pub tables: Vec<Vec<Vec<String>>>,
    pub clean_text: String,
}

impl StructuredExtraction {
    pub fn is_empty(&self) -> bool {
        self.pricing.is_empty()
            && self.headings.is_empty()
            && self.features.is_empty()
            && self.tables.is_empty()
            && self.clean_text.is_empty()
    }

    pub fn has_pricing(&self) -> bool {
        !self.pricing.is_empty()
    }

    /// 序列化为JSON字符串，用于向语义后端提供缩减片段
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
