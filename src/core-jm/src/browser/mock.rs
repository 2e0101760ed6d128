//! Scripted in-memory browser for tests.
//!
//! Documents are registered per exact url; navigating anywhere else times out. Selectors are
//! evaluated against the registered HTML with `scraper`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::{BrowserEngine, BrowserPage};
use crate::Error;
use crate::pacer::EventLog;

#[derive(Default)]
struct MockState {
    documents: HashMap<String, String>,
    failing: HashSet<String>,
    navigation_delay: Duration,
    unavailable: bool,
    visits: Mutex<Vec<String>>,
    events: EventLog,
    opened: AtomicUsize,
    closed: AtomicUsize,
    open_now: AtomicUsize,
    max_open: AtomicUsize,
    launches: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct MockBrowser {
    state: Arc<MockState>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut MockState {
        Arc::get_mut(&mut self.state).expect("configure MockBrowser before sharing it")
    }

    pub fn with_document(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.state_mut().documents.insert(url.into(), html.into());
        self
    }

    /// Navigating to `url` always fails.
    pub fn with_failing(mut self, url: impl Into<String>) -> Self {
        self.state_mut().failing.insert(url.into());
        self
    }

    /// Every navigation takes this long, which lets tests observe overlapping pages.
    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.state_mut().navigation_delay = delay;
        self
    }

    /// The session can never be launched.
    pub fn unavailable(mut self) -> Self {
        self.state_mut().unavailable = true;
        self
    }

    /// Navigations are also appended to `events` as `visit:<url>`.
    pub fn sharing(mut self, events: EventLog) -> Self {
        self.state_mut().events = events;
        self
    }

    /// Every url navigated to, in order.
    pub fn visits(&self) -> Vec<String> {
        self.state.visits.lock().unwrap().clone()
    }

    pub fn visited(&self, url: &str) -> bool {
        self.visits().iter().any(|v| v == url)
    }

    pub fn pages_opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub fn pages_closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Highest number of pages that were open at the same time.
    pub fn max_concurrent_pages(&self) -> usize {
        self.state.max_open.load(Ordering::SeqCst)
    }

    pub fn launches(&self) -> usize {
        self.state.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserEngine for MockBrowser {
    async fn ensure_ready(&self) -> Result<(), Error> {
        if self.state.unavailable {
            return Err(Error::Browser("mock browser cannot be launched".to_string()));
        }
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, Error> {
        if self.state.unavailable {
            return Err(Error::Browser("mock browser cannot be launched".to_string()));
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        let open = self.state.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_open.fetch_max(open, Ordering::SeqCst);
        Ok(Box::new(MockPage {
            state: Arc::clone(&self.state),
            current: Mutex::new(None),
            closed: Mutex::new(false),
        }))
    }

    async fn shutdown(&self) -> Result<(), Error> {
        Ok(())
    }
}

struct MockPage {
    state: Arc<MockState>,
    current: Mutex<Option<String>>,
    closed: Mutex<bool>,
}

impl MockPage {
    fn document(&self) -> Option<String> {
        let current = self.current.lock().unwrap();
        current.as_ref().and_then(|url| self.state.documents.get(url).cloned())
    }
}

fn parse_selector(selector: &str) -> Result<Selector, Error> {
    Selector::parse(selector).map_err(|e| Error::ParseFailure(format!("bad selector '{}': {:?}", selector, e)))
}

fn first_text(html: &str, selector: &Selector) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .next()
        .map(|element| element.text().collect::<String>())
}

fn has_match(html: &str, selector: &Selector) -> bool {
    Html::parse_document(html).select(selector).next().is_some()
}

#[async_trait]
impl BrowserPage for MockPage {
    async fn set_user_agent(&self, _user_agent: &str, _accept_language: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), Error> {
        self.state.visits.lock().unwrap().push(url.to_string());
        self.state.events.lock().unwrap().push(format!("visit:{}", url));

        if !self.state.navigation_delay.is_zero() {
            tokio::time::sleep(self.state.navigation_delay).await;
        }

        if self.state.failing.contains(url) || !self.state.documents.contains_key(url) {
            return Err(Error::NavigationTimeout {
                url: url.to_string(),
                timeout,
            });
        }
        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<(), Error> {
        let parsed = parse_selector(selector)?;
        match self.document() {
            Some(html) if has_match(&html, &parsed) => Ok(()),
            _ => Err(Error::SelectorMissing(selector.to_string())),
        }
    }

    async fn scroll_to_bottom(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn content(&self) -> Result<String, Error> {
        Ok(self.document().unwrap_or_default())
    }

    async fn visible_text(&self, selector: &str) -> Result<Option<String>, Error> {
        let parsed = parse_selector(selector)?;
        Ok(self.document().and_then(|html| first_text(&html, &parsed)))
    }

    async fn close(&self) -> Result<(), Error> {
        let mut closed = self.closed.lock().unwrap();
        if !*closed {
            *closed = true;
            self.state.closed.fetch_add(1, Ordering::SeqCst);
            self.state.open_now.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
