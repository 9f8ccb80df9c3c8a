//! Serverless-style entry point: an optional event in, a status code and
//! JSON body out.

use crate::config::ScraperConfig;
use crate::error::{Result, ScrapeError};
use crate::pipeline::Pipeline;
use crate::results::CrawlSummary;
use serde::{Deserialize, Serialize};

const FAILURE_MESSAGE: &str = "Failed to crawl, extract text, and download images";

/// Input payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationEvent {
    /// Page limit; the configured limit is used when absent
    #[serde(default)]
    pub max_pages: Option<u32>,
}

/// Output payload. `body` holds serialized JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: String,
    message: &'a str,
    timestamp: String,
}

impl InvocationResponse {
    pub fn from_result(result: Result<CrawlSummary>) -> Self {
        match result {
            Ok(summary) => match serde_json::to_string(&summary) {
                Ok(body) => Self {
                    status_code: 200,
                    body,
                },
                Err(e) => Self::error(&ScrapeError::from(e)),
            },
            Err(e) => Self::error(&e),
        }
    }

    pub fn error(err: &ScrapeError) -> Self {
        let body = ErrorBody {
            error: err.to_string(),
            message: FAILURE_MESSAGE,
            timestamp: chrono::Local::now().to_rfc3339(),
        };

        Self {
            status_code: 500,
            // A struct of plain strings always serializes
            body: serde_json::to_string(&body).unwrap_or_default(),
        }
    }
}

/// Run one invocation against the process environment
pub async fn lambda_handler(event: Option<InvocationEvent>) -> InvocationResponse {
    run_invocation(event, |key| std::env::var(key).ok()).await
}

/// Run one invocation with configuration taken from `lookup`
pub async fn run_invocation<F>(event: Option<InvocationEvent>, lookup: F) -> InvocationResponse
where
    F: Fn(&str) -> Option<String>,
{
    let result = harvest(event, lookup).await;
    match &result {
        Ok(summary) => ::log::info!(
            "Execution completed successfully. Crawled {} pages, downloaded {} images.",
            summary.crawl_statistics.total_pages_crawled,
            summary.file_processing.images_downloaded
        ),
        Err(e) => ::log::error!("Execution failed: {}", e),
    }
    InvocationResponse::from_result(result)
}

async fn harvest<F>(event: Option<InvocationEvent>, lookup: F) -> Result<CrawlSummary>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ScraperConfig::from_lookup(lookup)?;
    if let Some(max_pages) = event.and_then(|e| e.max_pages) {
        config.max_pages = max_pages;
    }

    let mut pipeline = Pipeline::from_config(config).await?;
    pipeline.run().await
}
