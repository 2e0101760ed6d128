//! Automated browser boundary.
//!
//! A [`BrowserEngine`] is one long-lived browser session shared by the whole process. Every unit
//! of work opens its own [`BrowserPage`] and must close it on every exit path.

pub mod chrome;
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;

use std::time::Duration;

use async_trait::async_trait;

use crate::Error;

pub use chrome::{ChromeOptions, ChromeSession};

/// JavaScript that scrolls one viewport-height past the current document height.
pub const SCROLL_TO_BOTTOM_JS: &str = "window.scrollBy(0, document.body.scrollHeight)";

#[async_trait]
pub trait BrowserEngine: Send + Sync {
    /// Launches the session if needed, or relaunches it if the health check fails.
    async fn ensure_ready(&self) -> Result<(), Error>;

    /// Opens a blank, isolated page in the (healthy) session.
    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, Error>;

    /// Closes the session. A later `ensure_ready` or `open_page` launches a fresh one.
    async fn shutdown(&self) -> Result<(), Error>;
}

#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn set_user_agent(&self, user_agent: &str, accept_language: &str) -> Result<(), Error>;

    /// Fails with [`Error::NavigationTimeout`] if the document does not load in time.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), Error>;

    /// Fails with [`Error::SelectorMissing`] if nothing matches `selector` in time.
    /// `selector` may be a comma-separated selector group.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), Error>;

    async fn scroll_to_bottom(&self) -> Result<(), Error>;

    /// Rendered HTML of the current document.
    async fn content(&self) -> Result<String, Error>;

    /// Visible text of the first element matching `selector`, or `None` if nothing matches.
    async fn visible_text(&self, selector: &str) -> Result<Option<String>, Error>;

    async fn close(&self) -> Result<(), Error>;
}
