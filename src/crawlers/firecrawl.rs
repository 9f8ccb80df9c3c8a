//! Client for the hosted Firecrawl crawl API.
//!
//! A crawl is an asynchronous job on the service side: the client starts
//! it, then polls its status until it reaches a terminal state or the
//! configured wait runs out.

use crate::config::{API_KEY_VAR, FirecrawlConfig};
use crate::crawlers::crawler::{CrawlJob, CrawlOutcome, CrawlRequest, CrawlService};
use crate::error::{Result, ScrapeError};
use crate::results::PageRecord;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};

#[derive(Debug, Deserialize)]
struct StartResponse {
    #[serde(default)]
    success: bool,
    id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobStatus {
    status: String,
    total: Option<u64>,
    completed: Option<u64>,
    next: Option<String>,
    #[serde(default)]
    data: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    html: Option<String>,
    metadata: Option<DocumentMetadata>,
}

#[derive(Debug, Deserialize)]
struct DocumentMetadata {
    #[serde(rename = "sourceURL")]
    source_url: Option<String>,
}

/// Crawl service backed by the Firecrawl HTTP API
pub struct FirecrawlClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    poll_interval: Duration,
    max_wait: Duration,
}

impl FirecrawlClient {
    /// Create a client; the configuration must carry an API key
    pub fn new(config: &FirecrawlConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or(ScrapeError::MissingCredential(API_KEY_VAR))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_wait: Duration::from_secs(config.max_wait_secs),
        })
    }

    async fn start_job(&self, request: &CrawlRequest) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/v1/crawl", self.api_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Upstream(format!(
                "crawl request rejected with {}: {}",
                status, body
            )));
        }

        let started: StartResponse = response.json().await?;
        match started.id {
            Some(id) if started.success => Ok(id),
            _ => Err(ScrapeError::Upstream(
                started
                    .error
                    .unwrap_or_else(|| "crawl request was not accepted".to_string()),
            )),
        }
    }

    async fn wait_for_job(&self, id: &str) -> Result<JobStatus> {
        let status_url = format!("{}/v1/crawl/{}", self.api_url, id);
        let deadline = Instant::now() + self.max_wait;

        loop {
            let job: JobStatus = self
                .http
                .get(&status_url)
                .bearer_auth(&self.api_key)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            match job.status.as_str() {
                "completed" | "failed" | "cancelled" => return Ok(job),
                _ => {}
            }

            if Instant::now() >= deadline {
                return Err(ScrapeError::Upstream(format!(
                    "crawl job {} still {} after {}s",
                    id,
                    job.status,
                    self.max_wait.as_secs()
                )));
            }

            ::log::debug!(
                "Crawl job {} is {} ({}/{} pages)",
                id,
                job.status,
                job.completed.unwrap_or(0),
                job.total.unwrap_or(0)
            );
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Turn a terminal job status into an outcome, giving pages without a
/// source URL a synthetic one under the crawled site.
fn resolve_job(job: JobStatus, base_url: &str) -> CrawlOutcome {
    if job.next.is_some() {
        ::log::warn!("Crawl result is paginated; only the first batch is used");
    }

    if job.data.is_empty() {
        if job.status == "completed" {
            return CrawlOutcome::Empty;
        }
        return CrawlOutcome::TransportError {
            message: format!("crawl job ended with status {}", job.status),
        };
    }

    let base = base_url.trim_end_matches('/');
    let pages = job
        .data
        .into_iter()
        .enumerate()
        .map(|(i, doc)| {
            let source_url = doc
                .metadata
                .and_then(|m| m.source_url)
                .unwrap_or_else(|| format!("{}/page_{}", base, i));
            PageRecord::new(source_url, doc.html.unwrap_or_default())
        })
        .collect();

    CrawlOutcome::Success(CrawlJob {
        status: job.status,
        total: job.total,
        completed: job.completed,
        pages,
    })
}

#[async_trait]
impl CrawlService for FirecrawlClient {
    async fn crawl(&self, request: &CrawlRequest) -> CrawlOutcome {
        ::log::info!(
            "Calling crawl API with parameters: url={}, limit={}",
            request.url,
            request.limit
        );

        let id = match self.start_job(request).await {
            Ok(id) => id,
            Err(e) => {
                return CrawlOutcome::TransportError {
                    message: e.to_string(),
                };
            }
        };
        ::log::info!("Crawl job {} started", id);

        match self.wait_for_job(&id).await {
            Ok(job) => resolve_job(job, &request.url),
            Err(e) => CrawlOutcome::TransportError {
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeOptions;
    use mockito::Matcher;
    use serde_json::json;
    use std::io::Write;

    fn client_for(server: &mockito::Server) -> FirecrawlClient {
        let config = FirecrawlConfig {
            api_url: server.url(),
            api_key: Some("fc-test".to_string()),
            poll_interval_ms: 0,
            max_wait_secs: 5,
            ..FirecrawlConfig::default()
        };
        FirecrawlClient::new(&config).unwrap()
    }

    fn request() -> CrawlRequest {
        CrawlRequest {
            url: "https://site.test".to_string(),
            limit: 5,
            scrape_options: ScrapeOptions::default(),
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        let result = FirecrawlClient::new(&FirecrawlConfig::default());
        assert!(matches!(result, Err(ScrapeError::MissingCredential(_))));
    }

    #[tokio::test]
    async fn test_crawl_success() {
        let mut server = mockito::Server::new_async().await;
        let start = server
            .mock("POST", "/v1/crawl")
            .match_header("authorization", "Bearer fc-test")
            .match_body(Matcher::PartialJson(json!({
                "url": "https://site.test",
                "limit": 5,
                "scrapeOptions": {
                    "formats": ["markdown", "html"],
                    "onlyMainContent": false,
                    "waitFor": 2000
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":true,"id":"job-1","url":"http://x/v1/crawl/job-1"}"#)
            .expect(1)
            .create_async()
            .await;
        let status = server
            .mock("GET", "/v1/crawl/job-1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "status": "completed",
                    "total": 2,
                    "completed": 2,
                    "data": [
                        {"html": "<p>FAQ</p>", "markdown": "FAQ",
                         "metadata": {"sourceURL": "https://site.test/faq"}},
                        {"html": "<p>Home</p>"}
                    ]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let outcome = client_for(&server).crawl(&request()).await;
        let job = match outcome {
            CrawlOutcome::Success(job) => job,
            other => panic!("expected success, got {:?}", other),
        };

        assert_eq!(job.status, "completed");
        assert_eq!(job.total, Some(2));
        assert_eq!(job.pages.len(), 2);
        assert_eq!(job.pages[0].source_url, "https://site.test/faq");
        assert_eq!(job.pages[0].html, "<p>FAQ</p>");
        assert_eq!(job.pages[1].source_url, "https://site.test/page_1");

        start.assert_async().await;
        status.assert_async().await;
    }

    #[tokio::test]
    async fn test_crawl_empty() {
        let mut server = mockito::Server::new_async().await;
        let _start = server
            .mock("POST", "/v1/crawl")
            .with_status(200)
            .with_body(r#"{"success":true,"id":"job-2"}"#)
            .create_async()
            .await;
        let _status = server
            .mock("GET", "/v1/crawl/job-2")
            .with_status(200)
            .with_body(r#"{"status":"completed","total":0,"completed":0,"data":[]}"#)
            .create_async()
            .await;

        let outcome = client_for(&server).crawl(&request()).await;
        assert!(matches!(outcome, CrawlOutcome::Empty));
    }

    #[tokio::test]
    async fn test_crawl_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _start = server
            .mock("POST", "/v1/crawl")
            .with_status(401)
            .with_body(r#"{"success":false,"error":"Unauthorized"}"#)
            .create_async()
            .await;

        let outcome = client_for(&server).crawl(&request()).await;
        match outcome {
            CrawlOutcome::TransportError { message } => assert!(message.contains("401")),
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stalled_status_poll_times_out() {
        let mut server = mockito::Server::new_async().await;
        let _start = server
            .mock("POST", "/v1/crawl")
            .with_status(200)
            .with_body(r#"{"success":true,"id":"job-4"}"#)
            .create_async()
            .await;
        let _status = server
            .mock("GET", "/v1/crawl/job-4")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_secs(3));
                w.write_all(br#"{"status":"completed","data":[{"html":"<p>late</p>"}]}"#)
            })
            .create_async()
            .await;

        let config = FirecrawlConfig {
            api_url: server.url(),
            api_key: Some("fc-test".to_string()),
            poll_interval_ms: 0,
            max_wait_secs: 30,
            request_timeout_secs: 1,
            ..FirecrawlConfig::default()
        };
        let client = FirecrawlClient::new(&config).unwrap();

        let started = Instant::now();
        let outcome = client.crawl(&request()).await;
        assert!(matches!(outcome, CrawlOutcome::TransportError { .. }));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_failed_job_without_data() {
        let mut server = mockito::Server::new_async().await;
        let _start = server
            .mock("POST", "/v1/crawl")
            .with_status(200)
            .with_body(r#"{"success":true,"id":"job-3"}"#)
            .create_async()
            .await;
        let _status = server
            .mock("GET", "/v1/crawl/job-3")
            .with_status(200)
            .with_body(r#"{"status":"failed","data":[]}"#)
            .create_async()
            .await;

        let outcome = client_for(&server).crawl(&request()).await;
        assert!(matches!(outcome, CrawlOutcome::TransportError { .. }));
    }
}
