pub mod crawler;
pub mod firecrawl;

pub use crawler::{CrawlJob, CrawlOutcome, CrawlRequest, CrawlService};
pub use firecrawl::FirecrawlClient;
