// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{DetectionSettings, DiffSettings, RouterSettings, Settings};
use crate::domain::models::change_record::ChangeRecord;
use crate::domain::models::diff::DiffResult;
use crate::domain::models::severity::ChangeType;
use crate::domain::models::snapshot::{MonitoredPage, PageSnapshot};
use crate::domain::repositories::change_record_repository::ChangeRecordRepository;
use crate::domain::repositories::snapshot_repository::SnapshotRepository;
use crate::domain::services::diff_engine::diff_with;
use crate::domain::services::extractor::{HtmlExtractor, StructuredExtractor};
use crate::domain::services::merge::{apply_deep_analysis, apply_fast_tier};
use crate::domain::services::router::route;
use crate::domain::services::semantic::{
    truncate_chars, truncate_for_prompt, DeepAnalysisRequest, DeepAnalyzer, FastTierAnalyzer,
    FastTierRequest, SemanticTier,
};
use crate::domain::services::severity_overrides::apply_severity_overrides;
use crate::infrastructure::llm::groq_analyzer::GroqAnalyzer;
use crate::infrastructure::llm::openai_analyzer::OpenAiAnalyzer;
use crate::infrastructure::observability::metrics::FAST_PATH_HITS_TOTAL;
use crate::utils::errors::RepositoryError;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// 变更检测错误
///
/// 只有最终持久化失败会向调用方传播
#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Failed to persist change record: {0}")]
    Persistence(#[from] RepositoryError),
}

/// 变更检测服务
///
/// 一次页面检查内各阶段严格按顺序执行：
/// 前置检查 -> 基线查询 -> 指纹快速路径 -> 提取 -> 差异 -> 路由
/// -> 快速层（可选） -> 深度层（可选） -> 规则覆盖 -> 持久化
pub struct ChangeDetectionService {
    snapshot_repository: Arc<dyn SnapshotRepository>,
    change_record_repository: Arc<dyn ChangeRecordRepository>,
    extractor: Arc<dyn StructuredExtractor>,
    fast_tier: SemanticTier<dyn FastTierAnalyzer>,
    deep_tier: SemanticTier<dyn DeepAnalyzer>,
    router_settings: RouterSettings,
    diff_settings: DiffSettings,
    detection_settings: DetectionSettings,
}

impl ChangeDetectionService {
    /// 创建服务，语义后端根据凭据配置自动启用或禁用
    pub fn new(
        snapshot_repository: Arc<dyn SnapshotRepository>,
        change_record_repository: Arc<dyn ChangeRecordRepository>,
        settings: &Settings,
    ) -> Self {
        Self {
            snapshot_repository,
            change_record_repository,
            extractor: Arc::new(HtmlExtractor),
            fast_tier: GroqAnalyzer::tier(&settings.groq),
            deep_tier: OpenAiAnalyzer::tier(&settings.openai),
            router_settings: settings.router,
            diff_settings: settings.diff,
            detection_settings: settings.detection,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn StructuredExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_fast_tier(mut self, fast_tier: SemanticTier<dyn FastTierAnalyzer>) -> Self {
        self.fast_tier = fast_tier;
        self
    }

    pub fn with_deep_tier(mut self, deep_tier: SemanticTier<dyn DeepAnalyzer>) -> Self {
        self.deep_tier = deep_tier;
        self
    }

    /// 检测并分析当前快照相对基线的变化
    ///
    /// # 参数
    ///
    /// * `current` - 当前快照（已持久化）
    /// * `page` - 被监控页面
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(ChangeRecord))` - 已持久化的变更记录
    /// * `Ok(None)` - 当前快照不可分析，或这是首次抓取
    /// * `Err(DetectionError)` - 变更记录持久化失败
    pub async fn detect_and_analyze_changes(
        &self,
        current: &PageSnapshot,
        page: &MonitoredPage,
    ) -> Result<Option<ChangeRecord>, DetectionError> {
        if !current.has_content() {
            warn!("Snapshot {} failed or has no content", current.id);
            return Ok(None);
        }

        let previous = match self
            .snapshot_repository
            .get_previous_snapshot(page.id, current.id)
            .await
        {
            Ok(Some(previous)) => previous,
            Ok(None) => {
                info!("No previous snapshot for page {}, skipping comparison", page.id);
                return Ok(None);
            }
            Err(e) => {
                error!("Failed to load previous snapshot for page {}: {}", page.id, e);
                return Ok(None);
            }
        };

        let record = if previous.fingerprint().is_some() && previous.fingerprint() == current.fingerprint() {
            info!("Content hash unchanged for page {}", page.id);
            counter!(FAST_PATH_HITS_TOTAL).increment(1);
            ChangeRecord::unchanged(page.id, current.id)
        } else {
            info!("Content changed for page {}, running hybrid engine", page.id);
            self.analyze(&previous, current, page).await
        };

        self.commit(record).await.map(Some)
    }

    async fn analyze(
        &self,
        previous: &PageSnapshot,
        current: &PageSnapshot,
        page: &MonitoredPage,
    ) -> ChangeRecord {
        let previous_text = previous.text();
        let current_text = current.text();

        let previous_structured = self.extractor.extract(previous.extraction_input());
        let current_structured = self.extractor.extract(current.extraction_input());

        let diff = diff_with(&previous_structured, &current_structured, &self.diff_settings);
        let decision = route(
            &previous_structured,
            &current_structured,
            previous_text,
            current_text,
            diff.confidence,
            Some(&self.router_settings),
        );

        let diff_preview = generate_diff_preview(
            previous_text,
            current_text,
            self.detection_settings.diff_preview_chars,
        );
        let mut record = deterministic_record(page.id, current.id, diff, diff_preview);
        record.requires_llm = decision.requires_llm && self.fast_tier.is_enabled();

        if let (true, Some(analyzer)) = (decision.requires_llm, self.fast_tier.analyzer()) {
            let fragment_chars = self.detection_settings.fast_tier_fragment_chars;
            let request = FastTierRequest {
                previous_structured: truncate_chars(&previous_structured.to_json_string(), fragment_chars)
                    .to_string(),
                current_structured: truncate_chars(&current_structured.to_json_string(), fragment_chars)
                    .to_string(),
                changed_fragments: truncate_chars(
                    &generate_diff_preview(previous_text, current_text, fragment_chars),
                    fragment_chars,
                )
                .to_string(),
            };

            match analyzer.analyze(&request).await {
                Some(analysis) => apply_fast_tier(&mut record, &analysis),
                None => debug!("Fast tier returned no result, keeping deterministic classification"),
            }
        }

        if record.change_detected
            && record.is_impact_thin(self.detection_settings.min_informative_chars)
        {
            if let Some(analyzer) = self.deep_tier.analyzer() {
                let content_chars = self.detection_settings.deep_tier_content_chars;
                let request = DeepAnalysisRequest {
                    url: page.url.clone(),
                    title: page.title.clone().or_else(|| current.page_title.clone()),
                    page_type: page.page_type.clone(),
                    current_summary: record.summary.clone(),
                    previous_text: truncate_for_prompt(previous_text, content_chars),
                    current_text: truncate_for_prompt(current_text, content_chars),
                };

                match analyzer.analyze(&request).await {
                    Ok(analysis) => apply_deep_analysis(&mut record, analysis),
                    Err(e) => error!("Deep semantic analysis failed for page {}: {}", page.id, e),
                }
            }
        }

        apply_severity_overrides(
            &mut record,
            previous_text,
            current_text,
            page.page_type.as_deref(),
            &self.detection_settings,
        );

        record
    }

    async fn commit(&self, record: ChangeRecord) -> Result<ChangeRecord, DetectionError> {
        let saved = self
            .change_record_repository
            .save(record)
            .await
            .map_err(|e| {
                error!("Error creating change record: {}", e);
                DetectionError::Persistence(e)
            })?;

        info!(
            "Change record created: page={}, detected={}, severity={}",
            saved.page_id, saved.change_detected, saved.severity
        );
        Ok(saved)
    }
}

/// 确定性路径的摘要与变更类型
///
/// 优先级：价格 > 套餐 > 功能 > 标题 > 其他内容
pub fn rule_based_classification(diff: &DiffResult) -> (&'static str, ChangeType) {
    let changes = &diff.structured_changes;

    if !diff.change_detected {
        ("No significant changes detected", ChangeType::Other)
    } else if !changes.pricing_changes.is_empty() {
        ("Pricing changes detected", ChangeType::Pricing)
    } else if changes.has_plan_changes() {
        ("Plan changes detected", ChangeType::Pricing)
    } else if changes.feature_changes.is_some() {
        ("Feature changes detected", ChangeType::Features)
    } else if changes.heading_changes.is_some() {
        ("Heading changes detected", ChangeType::Content)
    } else {
        ("Content changes detected", ChangeType::Content)
    }
}

fn deterministic_record(
    page_id: i64,
    snapshot_id: i64,
    diff: DiffResult,
    diff_preview: String,
) -> ChangeRecord {
    let (summary, change_type) = rule_based_classification(&diff);

    ChangeRecord {
        page_id,
        snapshot_id,
        change_detected: diff.change_detected,
        summary: summary.to_string(),
        change_type,
        severity: diff.severity,
        severity_score: diff.severity.score(),
        business_impact: String::new(),
        recommended_action: String::new(),
        structured_diff: diff.structured_changes,
        llm_analysis: None,
        human_readable_comparison: None,
        requires_llm: false,
        confidence: diff.confidence,
        diff_preview,
        detected_at: Utc::now(),
    }
}

/// 生成差异预览
///
/// 两侧分别截断到 `max_length` 个字符，被截断的一侧追加 "..."
pub fn generate_diff_preview(previous: &str, current: &str, max_length: usize) -> String {
    let preview = |content: &str| {
        let truncated = truncate_chars(content, max_length);
        if truncated.len() < content.len() {
            format!("{}...", truncated)
        } else {
            content.to_string()
        }
    };

    format!("BEFORE:\n{}\n\nAFTER:\n{}", preview(previous), preview(current))
}
