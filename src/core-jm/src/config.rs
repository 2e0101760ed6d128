//! Tunables for the crawl pipeline.

use std::time::Duration;

/// Location used when a query does not name one.
pub const DEFAULT_LOCATION: &str = "Brasil";

/// Detail text matching this pattern marks a posting as requiring English.
pub const DEFAULT_EXCLUSION_PATTERN: &str = r"(?i)english|inglês";

/// Limits, timeouts and pacing for one crawl.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum number of result pages visited per query (default: 4)
    pub max_pages: usize,
    /// Candidates beyond this count on a single page are ignored (default: 20)
    pub max_candidates_per_page: usize,
    /// Candidates processed concurrently within one group (default: 3)
    pub group_size: usize,
    /// Timeout for every page navigation (default: 30s)
    pub navigation_timeout: Duration,
    /// How long to wait for the results list before parsing what rendered (default: 10s)
    pub results_wait_timeout: Duration,
    /// How long to wait for a description selector on a detail page (default: 5s)
    pub detail_wait_timeout: Duration,
    /// Scroll-to-bottom cycles used to trigger lazy loading (default: 3)
    pub scroll_cycles: usize,
    pub scroll_pause: Duration,
    pub page_pause: Duration,
    pub batch_pause: Duration,
    pub keyword_pause: Duration,
    pub default_location: String,
    pub exclusion_pattern: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 4,
            max_candidates_per_page: 20,
            group_size: 3,
            navigation_timeout: Duration::from_secs(30),
            results_wait_timeout: Duration::from_secs(10),
            detail_wait_timeout: Duration::from_secs(5),
            scroll_cycles: 3,
            scroll_pause: Duration::from_secs(2),
            page_pause: Duration::from_secs(3),
            batch_pause: Duration::from_secs(3),
            keyword_pause: Duration::from_secs(5),
            default_location: DEFAULT_LOCATION.to_string(),
            exclusion_pattern: DEFAULT_EXCLUSION_PATTERN.to_string(),
        }
    }
}

impl CrawlConfig {
    /// Creates a new builder for CrawlConfig.
    pub fn builder() -> CrawlConfigBuilder {
        CrawlConfigBuilder::default()
    }
}

/// Builder for CrawlConfig. Unset fields keep their defaults.
#[derive(Debug, Clone, Default)]
pub struct CrawlConfigBuilder {
    max_pages: Option<usize>,
    max_candidates_per_page: Option<usize>,
    group_size: Option<usize>,
    navigation_timeout: Option<Duration>,
    results_wait_timeout: Option<Duration>,
    detail_wait_timeout: Option<Duration>,
    scroll_cycles: Option<usize>,
    scroll_pause: Option<Duration>,
    page_pause: Option<Duration>,
    batch_pause: Option<Duration>,
    keyword_pause: Option<Duration>,
    default_location: Option<String>,
    exclusion_pattern: Option<String>,
}

impl CrawlConfigBuilder {
    pub fn max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn max_candidates_per_page(mut self, max: usize) -> Self {
        self.max_candidates_per_page = Some(max);
        self
    }

    /// Sets the group size. Zero is treated as one.
    pub fn group_size(mut self, group_size: usize) -> Self {
        self.group_size = Some(group_size.max(1));
        self
    }

    pub fn navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = Some(timeout);
        self
    }

    pub fn results_wait_timeout(mut self, timeout: Duration) -> Self {
        self.results_wait_timeout = Some(timeout);
        self
    }

    pub fn detail_wait_timeout(mut self, timeout: Duration) -> Self {
        self.detail_wait_timeout = Some(timeout);
        self
    }

    pub fn scroll_cycles(mut self, cycles: usize) -> Self {
        self.scroll_cycles = Some(cycles);
        self
    }

    pub fn scroll_pause(mut self, pause: Duration) -> Self {
        self.scroll_pause = Some(pause);
        self
    }

    pub fn page_pause(mut self, pause: Duration) -> Self {
        self.page_pause = Some(pause);
        self
    }

    pub fn batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = Some(pause);
        self
    }

    pub fn keyword_pause(mut self, pause: Duration) -> Self {
        self.keyword_pause = Some(pause);
        self
    }

    /// Sets every pacing delay at once. Mostly useful to make tests instantaneous.
    pub fn pauses(self, pause: Duration) -> Self {
        self.scroll_pause(pause)
            .page_pause(pause)
            .batch_pause(pause)
            .keyword_pause(pause)
    }

    pub fn default_location(mut self, location: String) -> Self {
        self.default_location = Some(location);
        self
    }

    pub fn exclusion_pattern(mut self, pattern: String) -> Self {
        self.exclusion_pattern = Some(pattern);
        self
    }

    /// Builds the CrawlConfig.
    pub fn build(self) -> CrawlConfig {
        let defaults = CrawlConfig::default();
        CrawlConfig {
            max_pages: self.max_pages.unwrap_or(defaults.max_pages),
            max_candidates_per_page: self.max_candidates_per_page.unwrap_or(defaults.max_candidates_per_page),
            group_size: self.group_size.unwrap_or(defaults.group_size),
            navigation_timeout: self.navigation_timeout.unwrap_or(defaults.navigation_timeout),
            results_wait_timeout: self.results_wait_timeout.unwrap_or(defaults.results_wait_timeout),
            detail_wait_timeout: self.detail_wait_timeout.unwrap_or(defaults.detail_wait_timeout),
            scroll_cycles: self.scroll_cycles.unwrap_or(defaults.scroll_cycles),
            scroll_pause: self.scroll_pause.unwrap_or(defaults.scroll_pause),
            page_pause: self.page_pause.unwrap_or(defaults.page_pause),
            batch_pause: self.batch_pause.unwrap_or(defaults.batch_pause),
            keyword_pause: self.keyword_pause.unwrap_or(defaults.keyword_pause),
            default_location: self.default_location.unwrap_or(defaults.default_location),
            exclusion_pattern: self.exclusion_pattern.unwrap_or(defaults.exclusion_pattern),
        }
    }
}
