// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::FetcherSettings;
use std::time::Duration;

const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// 抓取重试策略
///
/// 第 n 次失败后等待 `base_delay * 2^(n-1)`，上限为 `max_delay`。
/// `max_attempts` 包含首次请求。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    /// 抖动比例 (0.0-1.0)，0 表示不抖动
    jitter: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: 0.0,
        }
    }

    pub fn from_settings(settings: &FetcherSettings) -> Self {
        Self::new(settings.max_retries, settings.backoff_base())
            .with_max_delay(settings.max_backoff())
            .with_jitter(settings.backoff_jitter)
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter.clamp(0.0, 1.0);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 第 `attempt` 次尝试失败后是否还能继续
    pub fn has_attempts_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// 第 `attempt` 次失败后的等待时间
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31) as i32;
        let delay = (self.base_delay.as_secs_f64() * 2f64.powi(exponent))
            .min(self.max_delay.as_secs_f64());

        let spread = delay * self.jitter;
        if spread > 0.0 {
            Duration::from_secs_f64((delay + rand::random_range(-spread..spread)).max(0.0))
        } else {
            Duration::from_secs_f64(delay)
        }
    }
}
