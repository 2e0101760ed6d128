//! Search-results crawling: url construction, page rendering, card parsing and pagination.

use std::sync::Arc;

use data_model_jm::models::NewJobPosting;
use futures::Stream;
use futures::stream;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::Error;
use crate::browser::{BrowserEngine, BrowserPage};
use crate::config::{CrawlConfig, DEFAULT_LOCATION};
use crate::ledger::{DedupLedger, normalize_url};
use crate::pacer::{Pacer, PauseKind};

pub const SEARCH_URL: &str = "https://www.linkedin.com/jobs/search";
/// Geographic id of Brazil on the listings site.
pub const GEO_ID: &str = "106057199";
pub const RESULTS_PER_PAGE: usize = 25;

pub const RESULTS_LIST_SELECTOR: &str = "ul.jobs-search__results-list";
const CARD_SELECTOR: &str = "ul.jobs-search__results-list li";
const TITLE_SELECTOR: &str = ".base-search-card__title";
const COMPANY_SELECTOR: &str = ".base-search-card__subtitle";
const LOCATION_SELECTOR: &str = ".job-search-card__location";
const POSTED_SELECTOR: &str = "time";
const LINK_SELECTOR: &str = "a.base-card__full-link";

/// One search to crawl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// May be empty for a broad search.
    pub keyword: String,
    pub location: String,
    /// Only postings published in the last 24 hours.
    pub last_24h: bool,
    pub remote: bool,
}

impl SearchQuery {
    pub fn new(keyword: impl Into<String>, location: impl Into<String>, last_24h: bool, remote: bool) -> Self {
        Self {
            keyword: keyword.into(),
            location: location.into(),
            last_24h,
            remote,
        }
    }

    /// Everything recent and remote in `location`.
    pub fn broad(location: impl Into<String>) -> Self {
        Self::new("", location, true, true)
    }

    /// Same query, with a blank location replaced by `default_location`.
    pub fn with_default_location(&self, default_location: &str) -> Self {
        if !self.location.trim().is_empty() {
            return self.clone();
        }
        Self {
            location: default_location.to_string(),
            ..self.clone()
        }
    }

    /// Same location and flags, different keyword.
    pub fn with_keyword(&self, keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..self.clone()
        }
    }

    /// Short human-readable form for logs.
    pub fn label(&self) -> String {
        let keyword = self.keyword.trim();
        if keyword.is_empty() { "<all>".to_string() } else { keyword.to_string() }
    }

    /// Results url for the zero-based `page`.
    pub fn search_url(&self, page: usize) -> Result<Url, Error> {
        let location = match self.location.trim() {
            "" => DEFAULT_LOCATION,
            location => location,
        };

        let mut url = Url::parse(SEARCH_URL)?;
        {
            let mut params = url.query_pairs_mut();
            params.append_pair("keywords", self.keyword.trim());
            params.append_pair("location", location);
            params.append_pair("geoId", GEO_ID);
            if self.last_24h {
                params.append_pair("f_TPR", "r86400");
            }
            if self.remote {
                params.append_pair("f_WT", "2");
            }
            if page > 0 {
                params.append_pair("start", &(page * RESULTS_PER_PAGE).to_string());
            }
            params.append_pair("origin", "JOB_SEARCH_PAGE_SEARCH_BUTTON");
            params.append_pair("refresh", "true");
        }
        Ok(url)
    }
}

/// A result card that has not been checked against the store yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlCandidate {
    pub title: String,
    pub company: String,
    pub location: String,
    pub posted_date_text: String,
    /// Normalized: no query string, no fragment.
    pub url: String,
}

impl CrawlCandidate {
    pub fn into_new_posting(self, raw_description: Option<String>) -> NewJobPosting {
        NewJobPosting::new(
            self.title,
            self.company,
            self.location,
            self.posted_date_text,
            self.url,
            raw_description,
        )
    }
}

fn selector(css: &str) -> Result<Selector, Error> {
    Selector::parse(css).map_err(|e| Error::ParseFailure(format!("invalid selector '{}': {:?}", css, e)))
}

/// Trimmed text with inner whitespace runs collapsed to one space.
fn collapsed_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

struct CardSelectors {
    title: Selector,
    company: Selector,
    location: Selector,
    posted: Selector,
    link: Selector,
}

impl CardSelectors {
    fn new() -> Result<Self, Error> {
        Ok(Self {
            title: selector(TITLE_SELECTOR)?,
            company: selector(COMPANY_SELECTOR)?,
            location: selector(LOCATION_SELECTOR)?,
            posted: selector(POSTED_SELECTOR)?,
            link: selector(LINK_SELECTOR)?,
        })
    }

    fn text(&self, card: ElementRef<'_>, selector: &Selector) -> String {
        card.select(selector).next().map(collapsed_text).unwrap_or_default()
    }

    fn parse_card(&self, card: ElementRef<'_>) -> Result<CrawlCandidate, Error> {
        let title = self.text(card, &self.title);
        if title.is_empty() {
            return Err(Error::ParseFailure("card without title".to_string()));
        }

        let url = card
            .select(&self.link)
            .next()
            .and_then(|link| link.value().attr("href"))
            .map(normalize_url)
            .unwrap_or_default();
        if url.is_empty() {
            return Err(Error::ParseFailure(format!("card '{}' without link", title)));
        }

        Ok(CrawlCandidate {
            title,
            company: self.text(card, &self.company),
            location: self.text(card, &self.location),
            posted_date_text: self.text(card, &self.posted),
            url,
        })
    }
}

/// Every well-formed result card in `html`, in document order. Malformed cards are dropped.
pub fn parse_cards(html: &str) -> Result<Vec<CrawlCandidate>, Error> {
    let document = Html::parse_document(html);
    let cards = selector(CARD_SELECTOR)?;
    let fields = CardSelectors::new()?;

    let mut candidates = Vec::new();
    for card in document.select(&cards) {
        match fields.parse_card(card) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => tracing::debug!("Dropping result card: {}", e),
        }
    }
    Ok(candidates)
}

/// Outcome of requesting one results page.
#[derive(Debug)]
pub struct ListingPage {
    pub index: usize,
    /// Candidates not seen earlier in this crawl.
    pub candidates: Vec<CrawlCandidate>,
    /// False when the page failed to render; its candidates are then empty.
    pub loaded: bool,
}

struct Paging {
    next_index: usize,
    ledger: DedupLedger,
    exhausted: bool,
}

pub struct ListingCrawler {
    browser: Arc<dyn BrowserEngine>,
    pacer: Arc<dyn Pacer>,
    config: CrawlConfig,
}

impl ListingCrawler {
    pub fn new(browser: Arc<dyn BrowserEngine>, pacer: Arc<dyn Pacer>, config: CrawlConfig) -> Self {
        Self { browser, pacer, config }
    }

    /// Renders page `index` of `query` and returns the candidates `ledger` has not seen yet.
    pub async fn fetch_page(
        &self,
        query: &SearchQuery,
        index: usize,
        ledger: &mut DedupLedger,
    ) -> Result<Vec<CrawlCandidate>, Error> {
        let url = query.search_url(index)?;
        tracing::info!("[crawl: {}] Fetching results page {}: {}", query.label(), index + 1, url);

        let html = self.render(url.as_str()).await?;
        let cards = parse_cards(&html)?;
        let found = cards.len();

        let fresh: Vec<CrawlCandidate> = cards.into_iter().filter(|c| ledger.insert(&c.url)).collect();
        tracing::info!(
            "[crawl: {}] Page {}: {} cards, {} new, {} seen so far",
            query.label(),
            index + 1,
            found,
            fresh.len(),
            ledger.seen_count()
        );
        Ok(fresh)
    }

    async fn render(&self, url: &str) -> Result<String, Error> {
        let page = self.browser.open_page().await?;
        let rendered = self.render_on(page.as_ref(), url).await;
        if let Err(e) = page.close().await {
            tracing::warn!("Failed to close results page: {}", e);
        }
        rendered
    }

    async fn render_on(&self, page: &dyn BrowserPage, url: &str) -> Result<String, Error> {
        page.navigate(url, self.config.navigation_timeout).await?;

        if let Err(e) = page
            .wait_for_selector(RESULTS_LIST_SELECTOR, self.config.results_wait_timeout)
            .await
        {
            tracing::warn!("Results list did not show up, parsing what rendered: {}", e);
        }

        for _ in 0..self.config.scroll_cycles {
            page.scroll_to_bottom().await?;
            self.pacer.pause(PauseKind::Scroll, self.config.scroll_pause).await;
        }

        page.content().await
    }

    /// Lazily crawls the results pages of `query`.
    ///
    /// A page that fails to load is yielded with `loaded == false` and the crawl moves on. The
    /// stream ends after the first loaded page without new candidates, or after `max_pages`
    /// pages. Consecutive pages are separated by the page pause.
    pub fn pages<'a>(&'a self, query: &'a SearchQuery) -> impl Stream<Item = ListingPage> + Send + 'a {
        let start = Paging {
            next_index: 0,
            ledger: DedupLedger::new(),
            exhausted: false,
        };

        stream::unfold(start, move |mut paging| async move {
            if paging.exhausted || paging.next_index >= self.config.max_pages {
                return None;
            }
            let index = paging.next_index;
            paging.next_index += 1;

            if index > 0 {
                self.pacer.pause(PauseKind::Page, self.config.page_pause).await;
            }

            let page = match self.fetch_page(query, index, &mut paging.ledger).await {
                Ok(candidates) => {
                    if candidates.is_empty() {
                        tracing::info!(
                            "[crawl: {}] No new postings on page {}, stopping",
                            query.label(),
                            index + 1
                        );
                        paging.exhausted = true;
                    }
                    ListingPage {
                        index,
                        candidates,
                        loaded: true,
                    }
                }
                Err(e) => {
                    tracing::warn!("[crawl: {}] Failed to load page {}: {}", query.label(), index + 1, e);
                    ListingPage {
                        index,
                        candidates: Vec::new(),
                        loaded: false,
                    }
                }
            };
            Some((page, paging))
        })
    }
}
