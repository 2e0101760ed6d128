//! Posting detail pages.

use std::sync::Arc;
use std::time::Duration;

use crate::Error;
use crate::browser::{BrowserEngine, BrowserPage};
use crate::config::CrawlConfig;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const ACCEPT_LANGUAGE: &str = "pt-BR,pt;q=0.9,en-US;q=0.8,en;q=0.7";

/// Description containers, highest priority first.
pub const DESCRIPTION_SELECTORS: [&str; 3] = [".show-more-less-html__markup", ".description__text", "#job-details"];

/// Selector group awaited before extraction.
const DESCRIPTION_WAIT_SELECTOR: &str = ".show-more-less-html__markup, .description__text";

/// Reads the description text of one posting in its own page.
pub struct DetailFetcher {
    browser: Arc<dyn BrowserEngine>,
    navigation_timeout: Duration,
    wait_timeout: Duration,
}

impl DetailFetcher {
    pub fn new(browser: Arc<dyn BrowserEngine>, config: &CrawlConfig) -> Self {
        Self {
            browser,
            navigation_timeout: config.navigation_timeout,
            wait_timeout: config.detail_wait_timeout,
        }
    }

    /// Description text of the posting at `url`, or `None` if it could not be read for any reason.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        match self.try_fetch(url).await {
            Ok(text) => Some(text),
            Err(e) if e.is_soft() => {
                tracing::debug!("No description for {}: {}", url, e);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to fetch description for {}: {}", url, e);
                None
            }
        }
    }

    /// Like [`fetch`](Self::fetch), but reports why nothing was read.
    pub async fn try_fetch(&self, url: &str) -> Result<String, Error> {
        let page = self.browser.open_page().await?;
        let text = self.extract(page.as_ref(), url).await;
        if let Err(e) = page.close().await {
            tracing::warn!("Failed to close detail page for {}: {}", url, e);
        }
        text
    }

    async fn extract(&self, page: &dyn BrowserPage, url: &str) -> Result<String, Error> {
        page.set_user_agent(USER_AGENT, ACCEPT_LANGUAGE).await?;
        page.navigate(url, self.navigation_timeout).await?;

        // best effort: a late description is still picked up below
        if let Err(e) = page.wait_for_selector(DESCRIPTION_WAIT_SELECTOR, self.wait_timeout).await {
            tracing::debug!("Description container not ready on {}: {}", url, e);
        }

        for selector in DESCRIPTION_SELECTORS {
            if let Some(text) = page.visible_text(selector).await? {
                // the first container present wins, even if it is empty
                let text = text.trim();
                return if text.is_empty() {
                    Err(Error::SelectorMissing(selector.to_string()))
                } else {
                    Ok(text.to_string())
                };
            }
        }

        Err(Error::SelectorMissing(DESCRIPTION_SELECTORS.join(", ")))
    }
}
