// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    disabled, html_snapshot, Harness, InMemoryChangeRecordRepository, MockDeepTier, MockFastTier,
};
use changesignal::config::settings::Settings;
use changesignal::domain::models::analysis::{DeepAnalysis, SemanticAnalysis};
use changesignal::domain::models::extraction::{PricingSignal, StructuredExtraction};
use changesignal::domain::models::severity::{ChangeType, Severity};
use changesignal::domain::models::snapshot::{MonitoredPage, PageSnapshot};
use changesignal::domain::services::change_detection_service::{
    ChangeDetectionService, DetectionError,
};
use changesignal::domain::services::extractor::StructuredExtractor;
use changesignal::domain::services::semantic::SemanticTier;
use std::collections::HashMap;
use std::sync::Arc;

const PRODUCT_PAGE: &str = r#"<html><head><title>Acme Product</title></head><body>
    <h1>Product</h1>
    <ul><li>Single sign on</li><li>API access</li><li>Custom roles</li></ul>
    <p>Everything you need to run a modern team in one place today</p>
</body></html>"#;

const PRODUCT_PAGE_WITH_AUDIT_LOG: &str = r#"<html><head><title>Acme Product</title></head><body>
    <h1>Product</h1>
    <ul><li>Single sign on</li><li>API access</li><li>Custom roles</li><li>Audit log</li></ul>
    <p>Everything you need to run a modern team in one place today</p>
</body></html>"#;

const PRICING_PAGE: &str = r#"<html><head><title>Acme Pricing</title></head><body>
    <h2>Pro</h2>
    <p>$29 per month</p>
    <p>Billed monthly for growing teams</p>
</body></html>"#;

const PRICING_PAGE_RAISED: &str = r#"<html><head><title>Acme Pricing</title></head><body>
    <h2>Pro</h2>
    <p>$35 per month</p>
    <p>Billed monthly for growing teams</p>
</body></html>"#;

const ABOUT_PAGE: &str =
    "<html><body><h1>About</h1><p>alpha beta gamma delta epsilon zeta eta theta iota kappa</p></body></html>";

const ABOUT_PAGE_REWRITTEN: &str =
    "<html><body><h1>About</h1><p>omicron pi rho sigma tau upsilon phi chi psi omega</p></body></html>";

fn page() -> MonitoredPage {
    MonitoredPage {
        id: 42,
        url: "https://acme.io/product".to_string(),
        title: Some("Acme Product".to_string()),
        page_type: Some("features".to_string()),
    }
}

fn fast_analysis(business_impact: &str, recommended_action: &str) -> SemanticAnalysis {
    SemanticAnalysis {
        change_detected: true,
        change_type: ChangeType::Content,
        severity: Severity::Medium,
        business_impact: business_impact.to_string(),
        recommended_action: recommended_action.to_string(),
        confidence: 0.85,
        summary: Some("Messaging rewritten".to_string()),
    }
}

/// 按输入文本返回预设提取结果的提取器
///
/// 真实 HTML 中价格上下文包含价格本身，同一套餐改价会变成一删一增；
/// 这里固定上下文，才能走到逐项价格比较
struct FixedExtractor {
    extractions: HashMap<String, StructuredExtraction>,
}

impl StructuredExtractor for FixedExtractor {
    fn extract(&self, input: &str) -> StructuredExtraction {
        self.extractions.get(input).cloned().unwrap_or_default()
    }
}

fn pro_plan(raw: &str) -> StructuredExtraction {
    StructuredExtraction {
        pricing: vec![PricingSignal {
            raw: raw.to_string(),
            currency: Some("$".to_string()),
            has_percent: false,
            billing_term: Some("per month".to_string()),
            context: "Pro plan".to_string(),
        }],
        clean_text: format!("Pro plan {} per month", raw),
        ..Default::default()
    }
}

fn quiet_copy_edit() -> SemanticAnalysis {
    SemanticAnalysis {
        severity: Severity::Low,
        summary: Some("Plan copy edited".to_string()),
        ..fast_analysis(
            "Minor wording change on the plans page",
            "No action needed beyond a quick read",
        )
    }
}

/// 提取器不给出价格信号，文本变化交给快速层判断
fn text_only_service(harness: &Harness, fast: Arc<MockFastTier>) -> ChangeDetectionService {
    let mut settings = Settings::default();
    settings.router.diff_ratio_threshold = 0.01;

    ChangeDetectionService::new(harness.snapshots.clone(), harness.records.clone(), &settings)
        .with_extractor(Arc::new(FixedExtractor {
            extractions: HashMap::new(),
        }))
        .with_fast_tier(SemanticTier::enabled(fast))
        .with_deep_tier(disabled())
}

#[tokio::test]
async fn test_price_increase_is_classified_deterministically() {
    // Stubbed extraction keeps the plan context stable across both captures
    let fast = MockFastTier::new(None);
    let deep = MockDeepTier::new(Ok(DeepAnalysis::default()));
    let harness = Harness::new(SemanticTier::enabled(fast.clone()), SemanticTier::enabled(deep.clone()));

    let extractor = FixedExtractor {
        extractions: HashMap::from([
            ("Pro plan $29 per month".to_string(), pro_plan("$29")),
            ("Pro plan $35 per month".to_string(), pro_plan("$35")),
        ]),
    };
    let service = ChangeDetectionService::new(
        harness.snapshots.clone(),
        harness.records.clone(),
        &Settings::default(),
    )
    .with_extractor(Arc::new(extractor))
    .with_fast_tier(SemanticTier::enabled(fast.clone()))
    .with_deep_tier(disabled());

    let page = page();
    harness
        .snapshots
        .insert(PageSnapshot::from_text(page.id, None, "Pro plan $29 per month"));
    let current = harness
        .snapshots
        .insert(PageSnapshot::from_text(page.id, None, "Pro plan $35 per month"));

    let record = service
        .detect_and_analyze_changes(&current, &page)
        .await
        .unwrap()
        .expect("a change record");

    assert!(record.change_detected);
    assert_eq!(record.summary, "Pricing changes detected");
    assert_eq!(record.change_type, ChangeType::Pricing);
    assert_eq!(record.severity, Severity::High);
    assert_eq!(record.severity_score, 3);
    assert!(record.confidence >= 0.9);
    assert!(!record.requires_llm);

    let changes = &record.structured_diff.pricing_changes;
    assert_eq!(changes.len(), 1);
    assert!((changes[0].percent_change - 0.2069).abs() < 1e-3);
    assert_eq!(fast.calls(), 0);
    assert_eq!(deep.calls(), 0);
}

#[tokio::test]
async fn test_price_edit_in_real_html_swaps_plans() {
    let fast = MockFastTier::new(None);
    let harness = Harness::new(SemanticTier::enabled(fast.clone()), disabled());
    let page = page();
    let current = harness.store_pair(&page, PRICING_PAGE, PRICING_PAGE_RAISED);

    let record = harness
        .service
        .detect_and_analyze_changes(&current, &page)
        .await
        .unwrap()
        .unwrap();

    let changes = &record.structured_diff;
    assert!(changes.pricing_changes.is_empty());
    assert_eq!(changes.removed_plans.len(), 1);
    assert_eq!(changes.removed_plans[0].raw, "$29");
    assert_eq!(changes.removed_plans[0].context, "$29 per month | Pro");
    assert_eq!(changes.new_plans.len(), 1);
    assert_eq!(changes.new_plans[0].raw, "$35");

    assert!(record.change_detected);
    assert_eq!(record.summary, "Plan changes detected");
    assert_eq!(record.change_type, ChangeType::Pricing);
    assert_eq!(record.severity, Severity::Medium);
    assert!(!record.requires_llm);
    assert_eq!(fast.calls(), 0);
}

#[tokio::test]
async fn test_fast_tier_low_severity_is_raised_for_price_change() {
    let fast = MockFastTier::new(Some(quiet_copy_edit()));
    let harness = Harness::new(disabled(), disabled());
    let service = text_only_service(&harness, fast.clone());
    let page = page();
    harness
        .snapshots
        .insert(PageSnapshot::from_text(page.id, None, "Starter €9 per seat, billed yearly"));
    let current = harness
        .snapshots
        .insert(PageSnapshot::from_text(page.id, None, "Starter €12 per seat, billed yearly"));

    let record = service
        .detect_and_analyze_changes(&current, &page)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(fast.calls(), 1);
    assert!(record.requires_llm);
    assert_eq!(record.summary, "Plan copy edited");
    assert_eq!(record.severity, Severity::Medium);
    assert_eq!(record.severity_score, 2);
    assert_eq!(
        record.business_impact,
        "Minor wording change on the plans page [Auto-elevated: Price changes detected]"
    );
    assert!(record.should_alert());
}

#[tokio::test]
async fn test_large_percentage_swing_is_raised_to_high() {
    let fast = MockFastTier::new(Some(quiet_copy_edit()));
    let harness = Harness::new(disabled(), disabled());
    let service = text_only_service(&harness, fast.clone());
    let page = page();
    harness
        .snapshots
        .insert(PageSnapshot::from_text(page.id, None, "Annual plans save 5% with $49 seats"));
    let current = harness
        .snapshots
        .insert(PageSnapshot::from_text(page.id, None, "Annual plans save 20% with $39 seats"));

    let record = service
        .detect_and_analyze_changes(&current, &page)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.severity, Severity::High);
    assert_eq!(record.severity_score, 3);
    assert!(record.business_impact.ends_with(
        "[Auto-elevated: Price changes detected] [Auto-elevated: 15.0% change detected]"
    ));
    assert_eq!(harness.records.records().len(), 1);
}

#[tokio::test]
async fn test_identical_content_takes_fast_path() {
    let fast = MockFastTier::new(None);
    let deep = MockDeepTier::new(Ok(DeepAnalysis::default()));
    let harness = Harness::new(SemanticTier::enabled(fast.clone()), SemanticTier::enabled(deep.clone()));
    let page = page();
    let current = harness.store_pair(&page, PRODUCT_PAGE, PRODUCT_PAGE);

    let record = harness
        .service
        .detect_and_analyze_changes(&current, &page)
        .await
        .unwrap()
        .expect("a change record");

    assert!(!record.change_detected);
    assert_eq!(record.severity, Severity::Low);
    assert_eq!(record.confidence, 0.9);
    assert_eq!(record.snapshot_id, current.id);
    assert_eq!(harness.extractor.calls(), 0);
    assert_eq!(fast.calls(), 0);
    assert_eq!(deep.calls(), 0);
    assert_eq!(harness.records.records().len(), 1);
}

#[tokio::test]
async fn test_large_text_rewrite_escalates_to_fast_tier() {
    let fast = MockFastTier::new(Some(fast_analysis(
        "Positioning now targets enterprise buyers",
        "Review our enterprise landing page copy",
    )));
    let deep = MockDeepTier::new(Ok(DeepAnalysis::default()));
    let harness = Harness::new(SemanticTier::enabled(fast.clone()), SemanticTier::enabled(deep.clone()));
    let page = page();
    let current = harness.store_pair(&page, ABOUT_PAGE, ABOUT_PAGE_REWRITTEN);

    let record = harness
        .service
        .detect_and_analyze_changes(&current, &page)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(harness.extractor.calls(), 2);
    assert_eq!(fast.calls(), 1);
    assert!(record.requires_llm);
    assert!(record.change_detected);
    assert_eq!(record.summary, "Messaging rewritten");
    assert_eq!(record.change_type, ChangeType::Content);
    assert_eq!(record.severity, Severity::Medium);
    assert_eq!(record.confidence, 0.85);
    assert!(record.llm_analysis.is_some());
    assert!(record.diff_preview.starts_with("BEFORE:\nAbout alpha"));
    // Impact fields are informative, so no deep call
    assert_eq!(deep.calls(), 0);
}

#[tokio::test]
async fn test_text_rewrite_without_fast_tier_stays_deterministic() {
    let harness = Harness::new(disabled(), disabled());
    let page = page();
    let current = harness.store_pair(&page, ABOUT_PAGE, ABOUT_PAGE_REWRITTEN);

    let record = harness
        .service
        .detect_and_analyze_changes(&current, &page)
        .await
        .unwrap()
        .unwrap();

    assert!(!record.requires_llm);
    assert!(!record.change_detected);
    assert_eq!(record.summary, "No significant changes detected");
    assert_eq!(record.change_type, ChangeType::Other);
    assert!(record.llm_analysis.is_none());
}

#[tokio::test]
async fn test_feature_addition_is_low_severity() {
    let fast = MockFastTier::new(Some(fast_analysis("unused", "unused")));
    let harness = Harness::new(SemanticTier::enabled(fast.clone()), disabled());
    let page = page();
    let current = harness.store_pair(&page, PRODUCT_PAGE, PRODUCT_PAGE_WITH_AUDIT_LOG);

    let record = harness
        .service
        .detect_and_analyze_changes(&current, &page)
        .await
        .unwrap()
        .unwrap();

    assert!(record.change_detected);
    assert!(!record.requires_llm);
    assert_eq!(fast.calls(), 0);
    assert_eq!(record.summary, "Feature changes detected");
    assert_eq!(record.change_type, ChangeType::Features);
    assert_eq!(record.severity, Severity::Low);
    assert_eq!(record.severity_score, 1);

    let features = record.structured_diff.feature_changes.as_ref().unwrap();
    assert_eq!(features.added, vec!["Audit log".to_string()]);
    assert!(features.removed.is_empty());
}

#[tokio::test]
async fn test_deep_tier_fills_thin_fields_without_erasing() {
    let fast = MockFastTier::new(Some(fast_analysis("Minor", "")));
    let deep = MockDeepTier::new(Ok(DeepAnalysis {
        summary: Some("About page now leads with enterprise messaging".to_string()),
        change_type: None,
        severity: None,
        business_impact: Some("Signals a move upmarket into our core segment".to_string()),
        recommended_action: Some(String::new()),
        human_readable_comparison: Some("Before: generic copy. After: enterprise copy.".to_string()),
    }));
    let harness = Harness::new(SemanticTier::enabled(fast.clone()), SemanticTier::enabled(deep.clone()));
    let page = page();
    let current = harness.store_pair(&page, ABOUT_PAGE, ABOUT_PAGE_REWRITTEN);

    let record = harness
        .service
        .detect_and_analyze_changes(&current, &page)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(fast.calls(), 1);
    assert_eq!(deep.calls(), 1);
    assert_eq!(record.summary, "About page now leads with enterprise messaging");
    assert_eq!(record.business_impact, "Signals a move upmarket into our core segment");
    assert_eq!(record.recommended_action, "");
    assert_eq!(record.change_type, ChangeType::Content);
    assert_eq!(record.severity, Severity::Medium);
    assert_eq!(
        record.human_readable_comparison.as_deref(),
        Some("Before: generic copy. After: enterprise copy.")
    );

    let request = deep.last_request().unwrap();
    assert_eq!(request.url, "https://acme.io/product");
    assert_eq!(request.title.as_deref(), Some("Acme Product"));
    assert_eq!(request.page_type.as_deref(), Some("features"));
    assert_eq!(request.current_summary, "Messaging rewritten");
    assert!(request.current_text.contains("omicron"));
}

#[tokio::test]
async fn test_deep_tier_failure_keeps_fast_tier_result() {
    let fast = MockFastTier::new(Some(fast_analysis("Minor", "")));
    let deep = MockDeepTier::new(Err("model overloaded".to_string()));
    let harness = Harness::new(SemanticTier::enabled(fast), SemanticTier::enabled(deep.clone()));
    let page = page();
    let current = harness.store_pair(&page, ABOUT_PAGE, ABOUT_PAGE_REWRITTEN);

    let record = harness
        .service
        .detect_and_analyze_changes(&current, &page)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(deep.calls(), 1);
    assert_eq!(record.summary, "Messaging rewritten");
    assert_eq!(record.business_impact, "Minor");
    assert_eq!(harness.records.records().len(), 1);
}

#[tokio::test]
async fn test_legal_page_change_is_elevated() {
    let harness = Harness::new(disabled(), disabled());
    let page = MonitoredPage {
        page_type: Some("Terms".to_string()),
        ..page()
    };
    let current = harness.store_pair(&page, PRODUCT_PAGE, PRODUCT_PAGE_WITH_AUDIT_LOG);

    let record = harness
        .service
        .detect_and_analyze_changes(&current, &page)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(record.severity, Severity::High);
    assert_eq!(record.severity_score, 3);
    assert!(record
        .business_impact
        .ends_with("[Auto-elevated: Legal/compliance page change]"));
    assert!(record.should_alert());
}

#[tokio::test]
async fn test_first_capture_has_no_baseline() {
    let harness = Harness::new(disabled(), disabled());
    let page = page();
    let current = harness.snapshots.insert(html_snapshot(page.id, PRODUCT_PAGE));

    let outcome = harness.service.detect_and_analyze_changes(&current, &page).await.unwrap();

    assert!(outcome.is_none());
    assert!(harness.records.records().is_empty());
}

#[tokio::test]
async fn test_baseline_lookup_failure_skips_comparison() {
    let harness = Harness::new(disabled(), disabled());
    let page = page();
    let current = harness.store_pair(&page, PRODUCT_PAGE, PRODUCT_PAGE_WITH_AUDIT_LOG);
    harness.snapshots.fail_lookups();

    let outcome = harness.service.detect_and_analyze_changes(&current, &page).await.unwrap();

    assert!(outcome.is_none());
    assert!(harness.records.records().is_empty());
}

#[tokio::test]
async fn test_failed_snapshot_is_not_analyzed() {
    let harness = Harness::new(disabled(), disabled());
    let page = page();
    harness.snapshots.insert(html_snapshot(page.id, PRODUCT_PAGE));
    let mut failed = html_snapshot(page.id, PRODUCT_PAGE_WITH_AUDIT_LOG);
    failed.success = false;
    let failed = harness.snapshots.insert(failed);

    let outcome = harness.service.detect_and_analyze_changes(&failed, &page).await.unwrap();

    assert!(outcome.is_none());
    assert_eq!(harness.extractor.calls(), 0);
}

#[tokio::test]
async fn test_failed_baseline_is_skipped() {
    let harness = Harness::new(disabled(), disabled());
    let page = page();
    harness.snapshots.insert(html_snapshot(page.id, PRODUCT_PAGE));
    let mut failed = html_snapshot(page.id, "<html><body>Service unavailable</body></html>");
    failed.success = false;
    harness.snapshots.insert(failed);
    let current = harness.snapshots.insert(html_snapshot(page.id, PRODUCT_PAGE));

    let record = harness
        .service
        .detect_and_analyze_changes(&current, &page)
        .await
        .unwrap()
        .unwrap();

    assert!(!record.change_detected);
    assert_eq!(harness.extractor.calls(), 0);
}

#[tokio::test]
async fn test_persistence_failure_propagates() {
    let harness = Harness::with_records(
        disabled(),
        disabled(),
        InMemoryChangeRecordRepository::failing(),
    );
    let page = page();
    let current = harness.store_pair(&page, PRODUCT_PAGE, PRODUCT_PAGE_WITH_AUDIT_LOG);

    let result = harness.service.detect_and_analyze_changes(&current, &page).await;

    assert!(matches!(result, Err(DetectionError::Persistence(_))));
}
