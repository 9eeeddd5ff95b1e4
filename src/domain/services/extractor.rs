// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::extraction::{Heading, PricingSignal, StructuredExtraction};
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;
use tracing::error;

static PRICE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$?\d+(?:,\d{3})*(?:\.\d{2})?").expect("valid price pattern"));
static CURRENCY_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\$€£¥]").expect("valid currency pattern"));
static PERCENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+%").expect("valid percent pattern"));
static BILLING_TERM_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(per\s+(month|year|yr|week|day)|monthly|annually|yearly)")
        .expect("valid billing term pattern")
});

/// 结构化提取前移除的非内容节点
const CONTENT_NOISE: &str = "script, style, nav, footer, noscript, meta, link";
/// 生成快照清洗文本时移除的节点
const CAPTURE_NOISE: &str = "script, style, noscript, meta, link";
const HEADING_TAGS: [&str; 4] = ["h1", "h2", "h3", "h4"];
const MAX_CONTEXT_CHARS: usize = 300;

/// 结构化提取器特质
///
/// 编排器通过该特质调用提取阶段，便于替换实现
pub trait StructuredExtractor: Send + Sync {
    /// 从HTML或纯文本中提取结构化信号
    fn extract(&self, input: &str) -> StructuredExtraction;
}

/// 基于 scraper 的确定性提取器
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl StructuredExtractor for HtmlExtractor {
    fn extract(&self, input: &str) -> StructuredExtraction {
        extract_structured(input)
    }
}

/// 确定性提取结构化信号
///
/// 对残缺的标记保持容忍，内部出错时返回全空结果而不是向上传播
pub fn extract_structured(input: &str) -> StructuredExtraction {
    if input.trim().is_empty() {
        return StructuredExtraction::default();
    }

    match try_extract(input) {
        Ok(extraction) => extraction,
        Err(e) => {
            error!("Error in deterministic extraction: {}", e);
            StructuredExtraction::default()
        }
    }
}

/// 提取页面可见文本，空白压缩为单个空格
pub fn visible_text(html: &str) -> String {
    match clean_document(html, CAPTURE_NOISE) {
        Ok(document) => collect_text(&document),
        Err(e) => {
            error!("Error extracting visible text: {}", e);
            String::new()
        }
    }
}

/// 提取页面标题
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title = selector("title").ok()?;
    document
        .select(&title)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn try_extract(input: &str) -> Result<StructuredExtraction> {
    let document = clean_document(input, CONTENT_NOISE)?;

    Ok(StructuredExtraction {
        pricing: extract_pricing(&document),
        headings: extract_headings(&document)?,
        features: extract_features(&document)?,
        tables: extract_tables(&document)?,
        clean_text: collect_text(&document),
    })
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid selector '{}': {}", css, e))
}

fn clean_document(input: &str, noise: &str) -> Result<Html> {
    let mut document = Html::parse_document(input);
    let noise = selector(noise)?;

    let ids: Vec<_> = document.select(&noise).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    Ok(document)
}

fn collect_text(document: &Html) -> String {
    document
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// 去除首尾空白后直接拼接所有文本片段
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect::<String>()
}

/// 以空格连接所有非空文本片段
fn spaced_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_heading(element: ElementRef<'_>) -> bool {
    HEADING_TAGS.contains(&element.value().name())
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn extract_pricing(document: &Html) -> Vec<PricingSignal> {
    let mut results = Vec::new();
    // Document-order position of every element seen so far
    let mut order = HashMap::new();
    let mut headings: Vec<(usize, String)> = Vec::new();

    for (position, node) in document.root_element().descendants().enumerate() {
        match node.value() {
            Node::Element(_) => {
                order.insert(node.id(), position);
                if let Some(element) = ElementRef::wrap(node) {
                    if is_heading(element) {
                        headings.push((position, stripped_text(element)));
                    }
                }
            }
            Node::Text(raw) => {
                let text = raw.trim();
                if text.is_empty() {
                    continue;
                }
                let Some(price) = PRICE_REGEX.find(text) else {
                    continue;
                };

                // Nearest heading that starts before the text node's parent
                let parent_position = node
                    .parent()
                    .and_then(|parent| order.get(&parent.id()).copied())
                    .unwrap_or(position);
                let heading = headings
                    .iter()
                    .rev()
                    .find(|(heading_position, _)| *heading_position < parent_position)
                    .map(|(_, heading_text)| heading_text.as_str())
                    .filter(|heading_text| !heading_text.is_empty());

                let context = match heading {
                    Some(heading_text) => format!("{} | {}", text, heading_text),
                    None => text.to_string(),
                };

                results.push(PricingSignal {
                    raw: price.as_str().to_string(),
                    currency: CURRENCY_REGEX.find(text).map(|m| m.as_str().to_string()),
                    has_percent: PERCENT_REGEX.is_match(text),
                    billing_term: BILLING_TERM_REGEX
                        .find(text)
                        .map(|m| m.as_str().to_string()),
                    context: truncate_chars(&context, MAX_CONTEXT_CHARS),
                });
            }
            _ => {}
        }
    }

    results
}

fn extract_headings(document: &Html) -> Result<Vec<Heading>> {
    let headings = selector(&HEADING_TAGS.join(", "))?;

    Ok(document
        .select(&headings)
        .filter_map(|el| {
            let text = stripped_text(el);
            if text.is_empty() {
                return None;
            }
            let level = el.value().name()[1..].parse().unwrap_or(1);
            Some(Heading { level, text })
        })
        .collect())
}

fn extract_features(document: &Html) -> Result<Vec<Vec<String>>> {
    let lists = selector("ul")?;
    let items = selector("li")?;

    Ok(document
        .select(&lists)
        .map(|ul| {
            ul.select(&items)
                .map(spaced_text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|block| !block.is_empty())
        .collect())
}

fn extract_tables(document: &Html) -> Result<Vec<Vec<Vec<String>>>> {
    let tables = selector("table")?;
    let rows = selector("tr")?;
    let cells = selector("th, td")?;

    Ok(document
        .select(&tables)
        .map(|table| {
            table
                .select(&rows)
                .map(|row| row.select(&cells).map(spaced_text).collect::<Vec<_>>())
                .filter(|row| !row.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|table| !table.is_empty())
        .collect())
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;
