use std::collections::HashSet;

/// Per-run bookkeeping of page and image outcomes.
///
/// Owned by the pipeline and mutated from a single task only. If image
/// downloads are ever parallelised this must move behind a lock or be fed
/// by a channel back to one owner.
#[derive(Debug, Default)]
pub struct CrawlState {
    crawled_urls: HashSet<String>,
    failed_urls: HashSet<String>,
    downloaded_images: HashSet<String>,
    failed_images: HashSet<String>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a page URL the crawl service reported
    pub fn record_crawled(&mut self, url: &str) {
        self.crawled_urls.insert(url.to_string());
    }

    /// Record a page that could not be saved
    pub fn record_failed_page(&mut self, url: &str) {
        self.failed_urls.insert(url.to_string());
    }

    /// Whether an image URL already has an outcome in this run
    pub fn is_image_seen(&self, url: &str) -> bool {
        self.downloaded_images.contains(url) || self.failed_images.contains(url)
    }

    /// Record a kept image. Returns false if the URL already had an outcome.
    pub fn record_image_downloaded(&mut self, url: &str) -> bool {
        if self.is_image_seen(url) {
            return false;
        }
        self.downloaded_images.insert(url.to_string())
    }

    /// Record a failed image. Returns false if the URL already had an outcome.
    pub fn record_image_failed(&mut self, url: &str) -> bool {
        if self.is_image_seen(url) {
            return false;
        }
        self.failed_images.insert(url.to_string())
    }

    pub fn crawled_urls(&self) -> Vec<String> {
        sorted(&self.crawled_urls)
    }

    pub fn failed_urls(&self) -> Vec<String> {
        sorted(&self.failed_urls)
    }

    pub fn downloaded_images(&self) -> Vec<String> {
        sorted(&self.downloaded_images)
    }

    pub fn failed_images(&self) -> Vec<String> {
        sorted(&self.failed_images)
    }

    pub fn crawled_count(&self) -> usize {
        self.crawled_urls.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed_urls.len()
    }

    pub fn downloaded_image_count(&self) -> usize {
        self.downloaded_images.len()
    }

    pub fn failed_image_count(&self) -> usize {
        self.failed_images.len()
    }
}

fn sorted(set: &HashSet<String>) -> Vec<String> {
    let mut urls: Vec<String> = set.iter().cloned().collect();
    urls.sort();
    urls
}
