// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use validator::Validate;

/// 默认的抓取 User-Agent
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36 ChangeSignalBot/1.0";

/// 应用程序配置设置
///
/// 包含抓取、路由、差异比较、变更检测和两个语义分析后端的配置项
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct Settings {
    /// 抓取配置
    #[serde(default)]
    #[validate(nested)]
    pub fetcher: FetcherSettings,
    /// 路由配置
    #[serde(default)]
    #[validate(nested)]
    pub router: RouterSettings,
    /// 差异引擎配置
    #[serde(default)]
    #[validate(nested)]
    pub diff: DiffSettings,
    /// 变更检测配置
    #[serde(default)]
    #[validate(nested)]
    pub detection: DetectionSettings,
    /// 快速层 (Groq) 配置
    #[serde(default)]
    #[validate(nested)]
    pub groq: GroqSettings,
    /// 深度回退层 (OpenAI) 配置
    #[serde(default)]
    #[validate(nested)]
    pub openai: OpenAiSettings,
}

/// 抓取配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct FetcherSettings {
    /// 全局并发上限
    #[validate(range(min = 1))]
    pub max_concurrent_requests: usize,
    /// 单次请求超时时间（秒）
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
    /// 最大尝试次数
    #[validate(range(min = 1))]
    pub max_retries: u32,
    /// 退避基准时间（毫秒）
    pub backoff_base_ms: u64,
    /// 单次退避的上限（毫秒）
    #[validate(range(min = 1))]
    pub max_backoff_ms: u64,
    /// 退避抖动比例，0 表示不抖动
    #[validate(range(min = 0.0, max = 1.0))]
    pub backoff_jitter: f64,
    /// 请求使用的 User-Agent
    #[validate(length(min = 1))]
    pub user_agent: String,
    /// 主路径失败后是否使用浏览器渲染回退
    pub use_fallback_renderer: bool,
    /// 是否允许访问私有地址（仅用于测试）
    pub allow_private_hosts: bool,
    /// 禁止抓取的域名，同时匹配其子域名
    pub domain_blacklist: Vec<String>,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 15,
            timeout_secs: 10,
            max_retries: 3,
            backoff_base_ms: 500,
            max_backoff_ms: 30_000,
            backoff_jitter: 0.0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            use_fallback_renderer: false,
            allow_private_hosts: false,
            domain_blacklist: Vec::new(),
        }
    }
}

impl FetcherSettings {
    /// 单次请求超时
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 退避基准时间
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// 路由配置设置
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[serde(default)]
pub struct RouterSettings {
    /// 文本差异比例阈值
    #[validate(range(min = 0.0, max = 1.0))]
    pub diff_ratio_threshold: f64,
    /// 确定性置信度下限
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence_threshold: f64,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            diff_ratio_threshold: 0.30,
            confidence_threshold: 0.70,
        }
    }
}

/// 差异引擎配置设置
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[serde(default)]
pub struct DiffSettings {
    /// 价格涨幅超过该比例时升级为 HIGH
    #[validate(range(min = 0.0))]
    pub significant_increase_ratio: f64,
    /// 价格变化低于该比例时视为噪声
    #[validate(range(min = 0.0))]
    pub noise_floor_ratio: f64,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            significant_increase_ratio: 0.10,
            noise_floor_ratio: 0.001,
        }
    }
}

/// 变更检测配置设置
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[serde(default)]
pub struct DetectionSettings {
    /// 影响/建议字段的最小信息量（字符数）
    pub min_informative_chars: usize,
    /// 快速层片段长度上限
    #[validate(range(min = 1))]
    pub fast_tier_fragment_chars: usize,
    /// 深度层单侧文本长度上限
    #[validate(range(min = 1))]
    pub deep_tier_content_chars: usize,
    /// 记录中差异预览的长度上限
    #[validate(range(min = 1))]
    pub diff_preview_chars: usize,
    /// 是否对法务类页面应用严重度覆盖
    pub apply_page_type_overrides: bool,
    /// 金额变化时是否将 LOW 提升为 MEDIUM
    pub apply_price_overrides: bool,
    /// 百分比大幅变化时是否提升为 HIGH
    pub apply_percentage_overrides: bool,
    /// 触发百分比覆盖的最小变化幅度（百分点）
    #[validate(range(min = 0.0))]
    pub percentage_override_points: f64,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            min_informative_chars: 20,
            fast_tier_fragment_chars: 800,
            deep_tier_content_chars: 8000,
            diff_preview_chars: 500,
            apply_page_type_overrides: true,
            apply_price_overrides: true,
            apply_percentage_overrides: true,
            percentage_override_points: 10.0,
        }
    }
}

/// 快速层 (Groq) 配置设置
///
/// Groq 暴露 OpenAI 兼容的 chat completions 接口
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct GroqSettings {
    /// API密钥，未配置时快速层被禁用
    pub api_key: Option<String>,
    /// 模型名称
    #[validate(length(min = 1))]
    pub model: String,
    /// 采样温度
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f64,
    /// API基础URL
    #[validate(url)]
    pub base_url: String,
    /// 请求超时时间（秒）
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for GroqSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "llama3-8b-8192".to_string(),
            temperature: 0.1,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

/// 深度回退层 (OpenAI) 配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct OpenAiSettings {
    /// API密钥，未配置时深度层被禁用
    pub api_key: Option<String>,
    /// 模型名称
    #[validate(length(min = 1))]
    pub model: String,
    /// 采样温度
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f64,
    /// API基础URL
    #[validate(url)]
    pub base_url: String,
    /// 请求超时时间（秒）
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4-turbo-preview".to_string(),
            temperature: 0.2,
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 60,
        }
    }
}

/// 判断密钥是否可用
fn has_credentials(api_key: Option<&str>) -> bool {
    api_key.map(|key| !key.trim().is_empty()).unwrap_or(false)
}

impl GroqSettings {
    /// 是否配置了可用的凭据
    pub fn has_credentials(&self) -> bool {
        has_credentials(self.api_key.as_deref())
    }
}

impl OpenAiSettings {
    /// 是否配置了可用的凭据
    pub fn has_credentials(&self) -> bool {
        has_credentials(self.api_key.as_deref())
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次加载默认值、`config/default`、`config/{APP_ENVIRONMENT}` 以及
    /// `CHANGESIGNAL__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载并通过校验的配置
    /// * `Err(ConfigError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("CHANGESIGNAL").separator("__"));

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(settings)
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
