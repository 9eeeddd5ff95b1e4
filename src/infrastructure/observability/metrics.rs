// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_histogram, Unit};

pub const FETCH_ATTEMPTS_TOTAL: &str = "changesignal_fetch_attempts_total";
pub const FETCH_FAILURES_TOTAL: &str = "changesignal_fetch_failures_total";
pub const FETCH_DURATION_MS: &str = "changesignal_fetch_duration_ms";
pub const FALLBACK_RENDERS_TOTAL: &str = "changesignal_fallback_renders_total";
pub const FAST_PATH_HITS_TOTAL: &str = "changesignal_fast_path_hits_total";
pub const SEMANTIC_CALLS_TOTAL: &str = "changesignal_semantic_calls_total";
pub const SEMANTIC_FAILURES_TOTAL: &str = "changesignal_semantic_failures_total";

/// 注册指标描述
///
/// 只登记描述信息，导出器由宿主程序安装
pub fn describe_metrics() {
    describe_counter!(FETCH_ATTEMPTS_TOTAL, "Total number of fetch attempts, retries included");
    describe_counter!(
        FETCH_FAILURES_TOTAL,
        "Total number of fetches that failed after all retries"
    );
    describe_histogram!(
        FETCH_DURATION_MS,
        Unit::Milliseconds,
        "Duration of complete fetches in milliseconds"
    );
    describe_counter!(
        FALLBACK_RENDERS_TOTAL,
        "Total number of fetches delegated to the fallback renderer"
    );
    describe_counter!(
        FAST_PATH_HITS_TOTAL,
        "Total number of checks short-circuited by an unchanged fingerprint"
    );
    describe_counter!(
        SEMANTIC_CALLS_TOTAL,
        "Total number of semantic backend calls, labelled by tier"
    );
    describe_counter!(
        SEMANTIC_FAILURES_TOTAL,
        "Total number of failed semantic backend calls, labelled by tier"
    );
}
