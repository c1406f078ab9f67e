//! Headless Chromium rendering
//!
//! Used for storefronts that only insert listings as the viewport scrolls.

use crate::config::RenderConfig;
use crate::crawler::page::RenderablePage;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

fn browser_error(err: impl std::fmt::Display) -> HarvestError {
    HarvestError::Browser(err.to_string())
}

/// A single Chromium tab reused for every page of the crawl
pub struct ChromiumPage {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    scroll_step: u32,
    scroll_pause_ms: u64,
    navigation_timeout: Duration,
}

impl ChromiumPage {
    /// Launches a headless browser and opens a blank tab
    pub async fn launch(config: &RenderConfig) -> Result<Self> {
        let browser_config = BrowserConfig::builder().build().map_err(browser_error)?;
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(browser_error)?;

        // The CDP event loop must be polled for the browser to make progress
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(browser_error)?;

        Ok(Self {
            browser,
            page,
            handler,
            scroll_step: config.scroll_step,
            scroll_pause_ms: config.scroll_pause_ms,
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        })
    }

    fn scroll_script(&self) -> String {
        format!(
            r#"async () => {{
                const step = {step};
                for (let pos = 0; pos < document.body.scrollHeight; pos += step) {{
                    window.scrollTo(0, pos);
                    await new Promise(r => setTimeout(r, {pause}));
                }}
            }}"#,
            step = self.scroll_step,
            pause = self.scroll_pause_ms
        )
    }
}

#[async_trait]
impl RenderablePage for ChromiumPage {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(browser_error(format!("navigation to {} failed: {}", url, e))),
            Err(_) => Err(browser_error(format!(
                "navigation to {} timed out after {:?}",
                url, self.navigation_timeout
            ))),
        }
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        let script = self.scroll_script();
        self.page
            .evaluate_function(script)
            .await
            .map_err(browser_error)?;
        Ok(())
    }

    async fn rendered_markup(&mut self) -> Result<String> {
        self.page.content().await.map_err(browser_error)
    }

    async fn close(&mut self) -> Result<()> {
        let closed = self.browser.close().await.map_err(browser_error);
        self.handler.abort();
        closed.map(|_| ())
    }
}
