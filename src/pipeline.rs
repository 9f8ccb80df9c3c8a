use crate::config::ScraperConfig;
use crate::crawlers::{CrawlOutcome, CrawlRequest, CrawlService, FirecrawlClient};
use crate::error::{PageFailure, Result, ScrapeError};
use crate::filter::PolicyFilter;
use crate::images::ImageFetcher;
use crate::parsers::{ConversionOutcome, DocumentConverter, HtmdConverter};
use crate::parsers::{find_image_urls, segment_by_topic};
use crate::results::{
    CrawlStatistics, CrawlSummary, FileProcessing, PageRecord, ProcessedText, SavedHtml,
    SavedImage, SectionFile,
};
use crate::state::CrawlState;
use crate::utils::{page_filename, sanitize_filename};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Drives one harvesting run: crawl, save pages, extract text, download
/// images, summarise. Everything runs in sequence on the calling task.
pub struct Pipeline {
    config: ScraperConfig,
    policy: PolicyFilter,
    crawler: Box<dyn CrawlService>,
    converter: Box<dyn DocumentConverter>,
    images: ImageFetcher,
    state: CrawlState,
}

impl Pipeline {
    /// Create a pipeline with the default HTML converter. Output
    /// directories are created if missing.
    pub fn new(
        config: ScraperConfig,
        policy: PolicyFilter,
        crawler: Box<dyn CrawlService>,
    ) -> Result<Self> {
        for dir in [&config.html_dir, &config.text_dir, &config.images_dir] {
            std::fs::create_dir_all(dir)?;
        }
        let images = ImageFetcher::new(&config.images, config.images_dir.clone())?;

        Ok(Self {
            config,
            policy,
            crawler,
            converter: Box::new(HtmdConverter::new()),
            images,
            state: CrawlState::new(),
        })
    }

    /// Build the production pipeline: hosted crawl client, robots.txt
    /// loaded from the target site.
    ///
    /// Fails with `MissingCredential` before any network activity when no
    /// API key is configured.
    pub async fn from_config(config: ScraperConfig) -> Result<Self> {
        let crawler = FirecrawlClient::new(&config.firecrawl)?;
        let base_url = Url::parse(&config.base_url)?;

        let client = reqwest::Client::builder()
            .user_agent(config.images.user_agent.clone())
            .timeout(Duration::from_secs(config.images.timeout_secs))
            .build()?;
        let policy = PolicyFilter::load(config.policy.clone(), &client, &base_url).await;

        Self::new(config, policy, Box::new(crawler))
    }

    /// Replace the document converter
    pub fn with_converter(mut self, converter: Box<dyn DocumentConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    /// Run the whole pipeline.
    ///
    /// Only crawl-level problems abort the run; failed pages and images
    /// are recorded and reported in the summary.
    pub async fn run(&mut self) -> Result<CrawlSummary> {
        let base_url = self.config.base_url.clone();
        ::log::info!(
            "Starting crawl of {} with limit of {} pages",
            base_url,
            self.config.max_pages
        );

        if self.policy.is_allowed(&base_url, None) {
            ::log::info!("Base URL {} is allowed by robots.txt", base_url);
        } else {
            ::log::warn!("Base URL {} is not allowed by robots.txt or policy", base_url);
        }

        let request = CrawlRequest {
            url: base_url.clone(),
            limit: self.config.max_pages,
            scrape_options: self.config.firecrawl.scrape_options.clone(),
        };

        let job = match self.crawler.crawl(&request).await {
            CrawlOutcome::Success(job) => job,
            CrawlOutcome::Empty => return Err(ScrapeError::UpstreamEmpty),
            CrawlOutcome::TransportError { message } => return Err(ScrapeError::Upstream(message)),
        };

        ::log::info!(
            "Crawl job finished with status {} ({}/{} pages completed)",
            job.status,
            job.completed.unwrap_or(0),
            job.total.unwrap_or(0)
        );

        for page in &job.pages {
            self.state.record_crawled(&page.source_url);
        }
        ::log::info!("Unique URLs discovered: {}", self.state.crawled_count());

        let saved = self.save_pages(&job.pages).await;
        let processed = self.extract_text(&saved).await;
        let downloaded = self.download_images(&saved).await;

        ::log::info!(
            "Run finished: {} pages saved, {} failed, {} images downloaded, {} failed",
            saved.len(),
            self.state.failed_count(),
            self.state.downloaded_image_count(),
            self.state.failed_image_count()
        );

        Ok(self.summary(job.pages.len(), &saved, processed, downloaded))
    }

    async fn save_pages(&mut self, pages: &[PageRecord]) -> Vec<SavedHtml> {
        let mut saved = Vec::new();

        for page in pages {
            match self.save_page(page).await {
                Ok(html) => {
                    ::log::info!("Saved HTML: {}", html.path.display());
                    saved.push(html);
                }
                Err(e) => {
                    ::log::warn!("Skipping page {}: {}", page.source_url, e);
                    self.state.record_failed_page(&page.source_url);
                }
            }
        }

        saved
    }

    async fn save_page(&self, page: &PageRecord) -> std::result::Result<SavedHtml, PageFailure> {
        if !self.policy.is_allowed(&page.source_url, None) {
            return Err(PageFailure::Disallowed);
        }
        if page.html.trim().is_empty() {
            return Err(PageFailure::EmptyBody);
        }

        let path = self
            .config
            .html_dir
            .join(page_filename(&page.source_url, "html"));
        tokio::fs::write(&path, &page.html).await?;

        Ok(SavedHtml {
            path,
            source_url: page.source_url.clone(),
        })
    }

    async fn extract_text(&self, saved: &[SavedHtml]) -> Vec<ProcessedText> {
        let mut processed = Vec::new();

        for html in saved {
            match self.converter.convert(&html.path) {
                ConversionOutcome::Converted { markdown } => {
                    match self.write_text(&html.path, &markdown).await {
                        Ok(text) => processed.push(text),
                        Err(e) => {
                            ::log::warn!("Error writing text for {}: {}", html.path.display(), e)
                        }
                    }
                }
                ConversionOutcome::Empty => {
                    ::log::warn!("No text extracted from {}", html.path.display());
                }
                ConversionOutcome::Failed { reason } => {
                    ::log::warn!("Error processing {}: {}", html.path.display(), reason);
                }
            }
        }

        processed
    }

    /// Write the full text plus one file per segmented section. On failure
    /// every file written for this page is removed again.
    async fn write_text(
        &self,
        html_path: &Path,
        markdown: &str,
    ) -> std::io::Result<ProcessedText> {
        let stem = html_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text_file = self.config.text_dir.join(format!("{}.txt", stem));

        let mut written = Vec::new();
        let sections = match self
            .write_text_files(&stem, &text_file, markdown, &mut written)
            .await
        {
            Ok(sections) => sections,
            Err(e) => {
                for path in &written {
                    if let Err(remove_err) = tokio::fs::remove_file(path).await {
                        ::log::warn!("Could not remove {}: {}", path.display(), remove_err);
                    }
                }
                return Err(e);
            }
        };
        ::log::info!(
            "Wrote {} with {} sections",
            text_file.display(),
            sections.len()
        );

        Ok(ProcessedText {
            html_file: html_path.to_path_buf(),
            text_file,
            text_length: markdown.len(),
            sections,
            extraction_method: self.converter.name().to_string(),
        })
    }

    async fn write_text_files(
        &self,
        stem: &str,
        text_file: &Path,
        markdown: &str,
        written: &mut Vec<PathBuf>,
    ) -> std::io::Result<Vec<SectionFile>> {
        tokio::fs::write(text_file, markdown).await?;
        written.push(text_file.to_path_buf());

        let mut sections = Vec::new();
        for (section, body) in segment_by_topic(markdown) {
            let path = self
                .config
                .text_dir
                .join(format!("{}_{}.txt", stem, sanitize_filename(&section)));
            tokio::fs::write(&path, body).await?;
            written.push(path.clone());
            sections.push(SectionFile { section, path });
        }

        Ok(sections)
    }

    async fn download_images(&mut self, saved: &[SavedHtml]) -> Vec<SavedImage> {
        let mut downloaded = Vec::new();

        for html in saved {
            let markup = match tokio::fs::read_to_string(&html.path).await {
                Ok(markup) => markup,
                Err(e) => {
                    ::log::warn!("Could not read {}: {}", html.path.display(), e);
                    continue;
                }
            };

            let mut urls: Vec<String> = find_image_urls(&markup, &html.source_url)
                .into_iter()
                .collect();
            urls.sort();
            ::log::info!("Found {} images in {}", urls.len(), html.path.display());

            for url in urls {
                let Some(local_path) = self
                    .images
                    .download(&url, &self.policy, &mut self.state)
                    .await
                else {
                    continue;
                };

                let filename = local_path
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_default();
                downloaded.push(SavedImage {
                    source_html: html.path.clone(),
                    image_url: url,
                    local_path,
                    filename,
                });
            }
        }

        downloaded
    }

    fn summary(
        &self,
        total_pages: usize,
        saved: &[SavedHtml],
        processed: Vec<ProcessedText>,
        downloaded: Vec<SavedImage>,
    ) -> CrawlSummary {
        CrawlSummary {
            message: format!(
                "Completed crawl of {} with text extraction and image downloading",
                self.config.base_url
            ),
            base_url: self.config.base_url.clone(),
            crawl_statistics: CrawlStatistics {
                total_pages_crawled: total_pages,
                unique_urls_discovered: self.state.crawled_count(),
                failed_urls: self.state.failed_count(),
                max_pages_limit: self.config.max_pages,
                robots_txt_compliance: self.policy.robots_loaded(),
            },
            file_processing: FileProcessing {
                html_files_saved: saved.len(),
                text_files_processed: processed.len(),
                images_downloaded: self.state.downloaded_image_count(),
                failed_images: self.state.failed_image_count(),
                extraction_method: self.converter.name().to_string(),
            },
            processed_files: processed,
            downloaded_images: downloaded,
            crawled_urls: self.state.crawled_urls(),
            failed_urls: self.state.failed_urls(),
            failed_image_urls: self.state.failed_images(),
            timestamp: chrono::Local::now().to_rfc3339(),
        }
    }
}
