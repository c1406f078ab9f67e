//! Renderable page abstraction
//!
//! The crawler never talks to a browser or HTTP client directly. It drives a
//! [`RenderablePage`], which can be a static HTTP fetch, a headless browser,
//! or a fixture in tests.

use crate::crawler::fetcher::fetch_page;
use crate::{HarvestError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// A page that can be loaded, scrolled until lazy content has rendered, and read back
#[async_trait]
pub trait RenderablePage: Send {
    /// Loads `url`, replacing whatever was loaded before
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Scrolls through the full height of the page so lazily loaded content renders
    async fn scroll_to_bottom(&mut self) -> Result<()>;

    /// Returns the markup of the page as currently rendered
    async fn rendered_markup(&mut self) -> Result<String>;

    /// Ends the browsing session
    async fn close(&mut self) -> Result<()>;
}

/// Static page rendering over plain HTTP
///
/// The server-rendered markup is the final markup, so scrolling is a no-op.
pub struct HttpPage {
    client: Client,
    body: Option<String>,
}

impl HttpPage {
    pub fn new(client: Client) -> Self {
        Self { client, body: None }
    }
}

#[async_trait]
impl RenderablePage for HttpPage {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.body = None;
        let body = fetch_page(&self.client, url).await?;
        tracing::debug!("Fetched {} ({} bytes)", url, body.len());
        self.body = Some(body);
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        Ok(())
    }

    async fn rendered_markup(&mut self) -> Result<String> {
        self.body.clone().ok_or(HarvestError::NotNavigated)
    }

    async fn close(&mut self) -> Result<()> {
        self.body = None;
        Ok(())
    }
}
