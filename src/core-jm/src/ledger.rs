//! Per-query record of posting urls already seen.

use std::collections::HashSet;

/// Canonical form of a posting url: everything from the first `?` or `#` is dropped.
pub fn normalize_url(raw: &str) -> String {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    raw[..end].trim().to_string()
}

/// Urls seen during one query. Lives exactly as long as the query's crawl; never persisted.
#[derive(Debug, Default)]
pub struct DedupLedger {
    seen: HashSet<String>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `url`. Returns `true` if it had not been seen before.
    pub fn insert(&mut self, url: &str) -> bool {
        self.seen.insert(normalize_url(url))
    }

    /// Number of distinct urls recorded so far.
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url_strips_query_and_fragment() {
        assert_eq!(
            normalize_url("https://br.linkedin.com/jobs/view/dev-123?refId=abc&trackingId=x"),
            "https://br.linkedin.com/jobs/view/dev-123"
        );
        assert_eq!(
            normalize_url("https://br.linkedin.com/jobs/view/dev-123#top"),
            "https://br.linkedin.com/jobs/view/dev-123"
        );
        assert_eq!(normalize_url("  https://x/1  "), "https://x/1");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn test_insert_reports_novelty() {
        let mut ledger = DedupLedger::new();
        assert!(ledger.insert("https://x/1?a=1"));
        assert!(!ledger.insert("https://x/1?a=2"));
        assert!(ledger.insert("https://x/2"));
        assert!(!ledger.insert("https://x/1#apply"));
        assert_eq!(ledger.seen_count(), 2);
    }
}
