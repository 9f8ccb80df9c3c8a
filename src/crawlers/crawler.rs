use crate::config::ScrapeOptions;
use crate::results::PageRecord;
use async_trait::async_trait;
use serde::Serialize;

/// Parameters for one crawl of a site
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlRequest {
    pub url: String,
    pub limit: u32,
    pub scrape_options: ScrapeOptions,
}

/// A finished crawl job
#[derive(Debug, Clone)]
pub struct CrawlJob {
    /// Final job status as reported by the service
    pub status: String,
    /// Pages the service discovered
    pub total: Option<u64>,
    /// Pages the service finished scraping
    pub completed: Option<u64>,
    pub pages: Vec<PageRecord>,
}

/// Outcome of a crawl, resolved once at the service boundary
#[derive(Debug)]
pub enum CrawlOutcome {
    Success(CrawlJob),
    /// The service answered but returned no pages
    Empty,
    TransportError { message: String },
}

/// A service that crawls a whole site in one call
#[async_trait]
pub trait CrawlService: Send + Sync {
    async fn crawl(&self, request: &CrawlRequest) -> CrawlOutcome;
}
