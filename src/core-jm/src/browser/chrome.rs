use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{BrowserEngine, BrowserPage, SCROLL_TO_BOTTOM_JS};
use crate::Error;

const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Launch settings for the headless Chrome session.
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    /// Chrome binary; chromiumoxide auto-detects one when unset.
    pub executable: Option<PathBuf>,
    pub window_size: (u32, u32),
    /// Timeout for individual CDP requests.
    pub request_timeout: Duration,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            executable: None,
            window_size: (1280, 800),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ChromeOptions {
    /// Default options, with the binary taken from `CHROME_EXECUTABLE` if set.
    pub fn from_env() -> Self {
        Self {
            executable: std::env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from),
            ..Self::default()
        }
    }
}

/// Browser plus the task draining its CDP event stream.
struct ChromeHandle {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl Drop for ChromeHandle {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// The process-wide Chrome session. Launched lazily, health-checked before every use and
/// relaunched when the previous process died.
pub struct ChromeSession {
    options: ChromeOptions,
    handle: Mutex<Option<ChromeHandle>>,
}

impl ChromeSession {
    pub fn new(options: ChromeOptions) -> Self {
        Self {
            options,
            handle: Mutex::new(None),
        }
    }

    async fn launch(&self) -> Result<ChromeHandle, Error> {
        let (width, height) = self.options.window_size;
        let mut builder = BrowserConfigBuilder::default()
            .request_timeout(self.options.request_timeout)
            .window_size(width, height)
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage");
        if let Some(executable) = &self.options.executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(Error::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {:?}", e);
                }
            }
            tracing::debug!("Browser event handler task completed");
        });

        tracing::info!("Launched headless browser session");
        Ok(ChromeHandle { browser, handler })
    }

    /// Locks the session, making sure it holds a browser that answers CDP requests.
    async fn healthy(&self) -> Result<MutexGuard<'_, Option<ChromeHandle>>, Error> {
        let mut guard = self.handle.lock().await;

        let alive = match guard.as_ref() {
            Some(handle) => match handle.browser.version().await {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!("Browser health check failed: {}. Relaunching.", e);
                    false
                }
            },
            None => false,
        };

        if !alive {
            if let Some(mut crashed) = guard.take() {
                // best effort: the process is most likely gone already
                let _ = crashed.browser.close().await;
                let _ = crashed.browser.wait().await;
            }
            *guard = Some(self.launch().await?);
        }

        Ok(guard)
    }
}

#[async_trait]
impl BrowserEngine for ChromeSession {
    async fn ensure_ready(&self) -> Result<(), Error> {
        self.healthy().await.map(|_| ())
    }

    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, Error> {
        let guard = self.healthy().await?;
        let handle = guard
            .as_ref()
            .ok_or_else(|| Error::Browser("browser session vanished after launch".to_string()))?;
        let page = handle.browser.new_page("about:blank").await?;
        Ok(Box::new(ChromePage { page }))
    }

    async fn shutdown(&self) -> Result<(), Error> {
        let mut guard = self.handle.lock().await;
        if let Some(mut handle) = guard.take() {
            tracing::info!("Closing browser session");
            handle.browser.close().await?;
            handle.browser.wait().await.map_err(|e| Error::Browser(e.to_string()))?;
        }
        Ok(())
    }
}

/// One tab of the shared session.
pub struct ChromePage {
    page: Page,
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn set_user_agent(&self, user_agent: &str, accept_language: &str) -> Result<(), Error> {
        self.page
            .execute(SetUserAgentOverrideParams {
                user_agent: user_agent.to_string(),
                accept_language: Some(accept_language.to_string()),
                platform: None,
                user_agent_metadata: None,
            })
            .await?;
        Ok(())
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), Error> {
        let navigation = async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            Ok::<(), Error>(())
        };
        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(Error::NavigationTimeout {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<(), Error> {
        let start = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(Error::SelectorMissing(selector.to_string()));
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn scroll_to_bottom(&self) -> Result<(), Error> {
        self.page.evaluate(SCROLL_TO_BOTTOM_JS).await?;
        Ok(())
    }

    async fn content(&self) -> Result<String, Error> {
        Ok(self.page.content().await?)
    }

    async fn visible_text(&self, selector: &str) -> Result<Option<String>, Error> {
        match self.page.find_element(selector).await {
            Ok(element) => Ok(element.inner_text().await?),
            Err(_) => Ok(None),
        }
    }

    async fn close(&self) -> Result<(), Error> {
        self.page.clone().close().await?;
        Ok(())
    }
}
