// Re-export modules
pub mod config;
pub mod crawlers;
pub mod error;
pub mod filter;
pub mod images;
pub mod invocation;
pub mod parsers;
pub mod pipeline;
pub mod results;
pub mod state;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::ScraperConfig;
pub use error::{Result, ScrapeError};
pub use invocation::{InvocationEvent, InvocationResponse, lambda_handler};
pub use pipeline::Pipeline;
pub use results::CrawlSummary;
