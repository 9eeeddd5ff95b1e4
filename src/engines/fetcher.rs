// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::FetcherSettings;
use crate::domain::models::fetch_result::FetchResult;
use crate::engines::playwright_engine::PlaywrightEngine;
use crate::engines::reqwest_engine::ReqwestEngine;
use crate::engines::traits::{PageRequest, PageResponse, ScraperEngine};
use crate::engines::validators::{validate_domain_blacklist, validate_url, ValidationError};
use crate::infrastructure::observability::metrics::{
    FALLBACK_RENDERS_TOTAL, FETCH_ATTEMPTS_TOTAL, FETCH_DURATION_MS, FETCH_FAILURES_TOTAL,
};
use crate::utils::retry_policy::RetryPolicy;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use metrics::{counter, histogram};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 单次尝试的失败信息
#[derive(Debug)]
struct AttemptFailure {
    status_code: Option<u16>,
    body: Option<String>,
    error: String,
}

/// 抓取器
///
/// 有界并发的页面抓取组件：
/// - 并发槽位由自身持有的信号量控制，许可在所有退出路径上自动释放
/// - 每次尝试都受超时约束，失败后按指数退避重试
/// - 主引擎全部失败后可选地交给回退渲染引擎
pub struct Fetcher {
    primary: Arc<dyn ScraperEngine>,
    fallback: Option<Arc<dyn ScraperEngine>>,
    settings: FetcherSettings,
    retry_policy: RetryPolicy,
    slots: Arc<Semaphore>,
}

impl Fetcher {
    /// 创建抓取器
    ///
    /// # 参数
    ///
    /// * `primary` - 主抓取引擎
    /// * `fallback` - 可选的回退渲染引擎
    /// * `settings` - 抓取配置
    pub fn new(
        primary: Arc<dyn ScraperEngine>,
        fallback: Option<Arc<dyn ScraperEngine>>,
        settings: FetcherSettings,
    ) -> Self {
        let retry_policy = RetryPolicy::from_settings(&settings);
        let slots = Arc::new(Semaphore::new(settings.max_concurrent_requests.max(1)));

        Self {
            primary,
            fallback,
            settings,
            retry_policy,
            slots,
        }
    }

    /// 使用 reqwest 主引擎与浏览器回退引擎创建抓取器
    pub fn from_settings(settings: FetcherSettings) -> Self {
        Self::new(
            Arc::new(ReqwestEngine::new()),
            Some(Arc::new(PlaywrightEngine::new())),
            settings,
        )
    }

    /// 当前空闲的并发槽位数
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }

    /// 按配置的回退策略抓取单个页面
    pub async fn fetch(&self, url: &str) -> Result<FetchResult, ValidationError> {
        self.fetch_with(url, self.settings.use_fallback_renderer).await
    }

    /// 抓取单个页面
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    /// * `use_fallback_renderer` - 主引擎失败后是否尝试回退渲染
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchResult)` - 抓取结果，网络错误与非成功状态都体现为失败结果
    /// * `Err(ValidationError)` - URL 校验失败或域名在黑名单中，不占用任何资源
    pub async fn fetch_with(
        &self,
        url: &str,
        use_fallback_renderer: bool,
    ) -> Result<FetchResult, ValidationError> {
        let parsed = validate_url(url, self.settings.allow_private_hosts)?;
        validate_domain_blacklist(&parsed, &self.settings.domain_blacklist)?;

        let Ok(_permit) = self.slots.acquire().await else {
            return Ok(FetchResult::failed(url, "Fetch slot pool is closed", 0, 0));
        };

        let start = Instant::now();
        let request = PageRequest::new(url, self.settings.user_agent.as_str(), self.settings.timeout());
        let max_attempts = self.retry_policy.max_attempts();

        let mut attempt = 0;
        let mut last_failure = None;
        while attempt < max_attempts {
            attempt += 1;

            match self.attempt(self.primary.as_ref(), &request).await {
                Ok(response) => {
                    let elapsed = start.elapsed().as_millis() as u64;
                    info!(
                        "Fetched {} via {} (status={}, attempt={}, elapsed={}ms)",
                        url,
                        self.primary.name(),
                        response.status_code,
                        attempt,
                        elapsed
                    );
                    histogram!(FETCH_DURATION_MS).record(elapsed as f64);
                    return Ok(FetchResult::succeeded(
                        url,
                        response.status_code,
                        response.body,
                        response.final_url,
                        attempt,
                        elapsed,
                    ));
                }
                Err(failure) => {
                    if self.retry_policy.has_attempts_left(attempt) {
                        let backoff = self.retry_policy.delay_after(attempt);
                        warn!(
                            "Fetch failed for {} (attempt {}/{}): {}. Backing off {:.1}s.",
                            url,
                            attempt,
                            max_attempts,
                            failure.error,
                            backoff.as_secs_f64()
                        );
                        tokio::time::sleep(backoff).await;
                    }
                    last_failure = Some(failure);
                }
            }
        }

        if use_fallback_renderer {
            if let Some(fallback) = &self.fallback {
                info!(
                    "HTTP fetch failed for {}; trying fallback renderer {}",
                    url,
                    fallback.name()
                );
                counter!(FALLBACK_RENDERS_TOTAL).increment(1);

                let outcome = self.attempt(fallback.as_ref(), &request).await;
                let elapsed = start.elapsed().as_millis() as u64;
                histogram!(FETCH_DURATION_MS).record(elapsed as f64);

                let result = match outcome {
                    Ok(response) => FetchResult::succeeded(
                        url,
                        response.status_code,
                        response.body,
                        response.final_url,
                        attempt,
                        elapsed,
                    ),
                    Err(failure) => {
                        error!("Fallback renderer failed for {}: {}", url, failure.error);
                        failed_result(url, failure, attempt, elapsed)
                    }
                };
                if !result.success {
                    counter!(FETCH_FAILURES_TOTAL).increment(1);
                }
                return Ok(result.from_fallback(attempt + 1));
            }
            warn!("Fallback renderer requested for {} but none is configured", url);
        }

        let elapsed = start.elapsed().as_millis() as u64;
        histogram!(FETCH_DURATION_MS).record(elapsed as f64);
        counter!(FETCH_FAILURES_TOTAL).increment(1);

        let failure = last_failure.unwrap_or(AttemptFailure {
            status_code: None,
            body: None,
            error: "Failed to fetch page".to_string(),
        });
        error!(
            "Failed to fetch {} after {} attempts. Last status={:?}, error={}",
            url, attempt, failure.status_code, failure.error
        );
        Ok(failed_result(url, failure, attempt, elapsed))
    }

    /// 并发抓取多个URL
    ///
    /// 返回结果与输入顺序一致，重复的URL各自得到独立的结果。
    /// URL 校验失败或任务内部异常都转换为失败结果。
    pub async fn batch_fetch<I, S>(&self, urls: I) -> Vec<FetchResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();

        let mut pending: FuturesUnordered<_> = urls
            .iter()
            .enumerate()
            .map(|(index, url)| async move {
                let outcome = AssertUnwindSafe(self.fetch(url)).catch_unwind().await;
                (index, outcome)
            })
            .collect();

        let mut results: Vec<Option<FetchResult>> = vec![None; urls.len()];
        while let Some((index, outcome)) = pending.next().await {
            let url = &urls[index];
            results[index] = Some(match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(e)) => {
                    warn!("Skipping invalid URL {}: {}", url, e);
                    FetchResult::failed(url.as_str(), e.to_string(), 0, 0)
                }
                Err(_) => {
                    error!("Unexpected panic while fetching {}", url);
                    FetchResult::failed(url.as_str(), "No result (internal error in batch fetch)", 0, 0)
                }
            });
        }
        drop(pending);

        results
            .into_iter()
            .zip(urls)
            .map(|(result, url)| {
                result.unwrap_or_else(|| {
                    FetchResult::failed(url, "No result (internal error in batch fetch)", 0, 0)
                })
            })
            .collect()
    }

    /// 执行一次受超时约束的尝试
    ///
    /// 状态码在 200..400 之间且内容非空才算成功，见 [`PageResponse::is_usable`]
    async fn attempt(
        &self,
        engine: &dyn ScraperEngine,
        request: &PageRequest,
    ) -> Result<PageResponse, AttemptFailure> {
        counter!(FETCH_ATTEMPTS_TOTAL, "engine" => engine.name()).increment(1);

        let timed_out = || AttemptFailure {
            status_code: None,
            body: None,
            error: format!("Request timed out after {}s", self.settings.timeout_secs),
        };

        match tokio::time::timeout(request.timeout, engine.load(request)).await {
            Err(_) => Err(timed_out()),
            Ok(Err(e)) if e.is_timeout() => Err(timed_out()),
            Ok(Err(e)) => Err(AttemptFailure {
                status_code: None,
                body: None,
                error: e.to_string(),
            }),
            Ok(Ok(response)) if response.is_usable() => Ok(response),
            Ok(Ok(response)) => Err(AttemptFailure {
                status_code: Some(response.status_code),
                error: format!("Unexpected status code: {}", response.status_code),
                body: Some(response.body).filter(|body| !body.is_empty()),
            }),
        }
    }
}

fn failed_result(url: &str, failure: AttemptFailure, attempt_count: u32, elapsed_ms: u64) -> FetchResult {
    FetchResult {
        status_code: failure.status_code,
        html: failure.body,
        final_url: Some(url.to_string()),
        ..FetchResult::failed(url, failure.error, attempt_count, elapsed_ms)
    }
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod tests;
