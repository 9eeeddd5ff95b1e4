// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{EngineError, PageRequest, PageResponse, ScraperEngine};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

const REMOTE_DEBUGGING_ENV: &str = "CHROMIUM_REMOTE_DEBUGGING_URL";

/// 回退渲染引擎
///
/// 基于 chromiumoxide 驱动无头 Chrome 执行页面脚本后再取 HTML。
/// 浏览器在第一次渲染时才启动（或连接远程实例），之后复用。
pub struct PlaywrightEngine {
    browser: OnceCell<Browser>,
    remote_url: Option<String>,
}

impl Default for PlaywrightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaywrightEngine {
    /// 创建引擎，设置了 `CHROMIUM_REMOTE_DEBUGGING_URL` 时连接远程 Chrome
    pub fn new() -> Self {
        Self {
            browser: OnceCell::new(),
            remote_url: std::env::var(REMOTE_DEBUGGING_ENV).ok(),
        }
    }

    pub fn with_remote(url: impl Into<String>) -> Self {
        Self {
            browser: OnceCell::new(),
            remote_url: Some(url.into()),
        }
    }

    async fn browser(&self) -> Result<&Browser, EngineError> {
        self.browser
            .get_or_try_init(|| start_browser(self.remote_url.as_deref()))
            .await
    }

    async fn render(&self, request: &PageRequest) -> Result<PageResponse, EngineError> {
        let browser = self.browser().await?;
        let page = browser.new_page("about:blank").await.map_err(browser_error)?;

        let rendered = render_on(&page, request).await;
        if let Err(e) = page.close().await {
            debug!("Failed to close rendered page: {}", e);
        }
        rendered
    }
}

async fn start_browser(remote_url: Option<&str>) -> Result<Browser, EngineError> {
    let (browser, mut handler) = match remote_url {
        Some(url) => {
            info!("Connecting to remote Chrome at {}", url);
            Browser::connect(url)
                .await
                .map_err(|e| EngineError::Other(format!("Failed to connect to remote Chrome: {}", e)))?
        }
        None => {
            let config = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(Duration::from_secs(30))
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage")
                .build()
                .map_err(EngineError::Other)?;
            info!("Launching headless Chrome for fallback rendering");
            Browser::launch(config).await.map_err(browser_error)?
        }
    };

    // The handler stream must be polled for the browser to make progress
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    Ok(browser)
}

async fn render_on(page: &Page, request: &PageRequest) -> Result<PageResponse, EngineError> {
    page.set_user_agent(request.user_agent.as_str())
        .await
        .map_err(browser_error)?;
    // goto resolves after the load event
    page.goto(request.url.as_str()).await.map_err(browser_error)?;

    let body = page.content().await.map_err(browser_error)?;
    let final_url = page
        .url()
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| request.url.clone());

    // The navigation status is not exposed by Page; a rendered document counts as 200
    Ok(PageResponse {
        status_code: 200,
        body,
        final_url,
    })
}

fn browser_error(e: chromiumoxide::error::CdpError) -> EngineError {
    EngineError::Other(format!("Browser error: {}", e))
}

#[async_trait]
impl ScraperEngine for PlaywrightEngine {
    async fn load(&self, request: &PageRequest) -> Result<PageResponse, EngineError> {
        tokio::time::timeout(request.timeout, self.render(request))
            .await
            .map_err(|_| EngineError::Timeout(request.timeout))?
    }

    fn name(&self) -> &'static str {
        "playwright"
    }
}
