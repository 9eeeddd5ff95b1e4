// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,changesignal=debug";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 人类可读的文本格式
    #[default]
    Pretty,
    /// 每行一个JSON对象，便于日志采集
    Json,
}

impl LogFormat {
    /// 解析格式名称，无法识别时回退到文本格式
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// 安装全局日志订阅器
///
/// 过滤规则取自 `RUST_LOG`，缺省为 `info,changesignal=debug`。
/// 已经安装过订阅器时返回错误。
pub fn try_init_telemetry(format: LogFormat) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    }
}

/// 初始化日志订阅器
///
/// 库代码本身不会安装订阅器，由宿主进程在启动时调用
pub fn init_telemetry() {
    if let Err(e) = try_init_telemetry(LogFormat::Pretty) {
        eprintln!("Telemetry already initialized: {}", e);
    }
}
