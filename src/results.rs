use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A page as returned by the crawl service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// URL the page was fetched from
    pub source_url: String,

    /// Raw HTML body (may be empty)
    pub html: String,
}

impl PageRecord {
    pub fn new(source_url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            html: html.into(),
        }
    }
}

/// An HTML file written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedHtml {
    pub path: PathBuf,
    pub source_url: String,
}

/// A downloaded image that passed validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedImage {
    pub source_html: PathBuf,
    pub image_url: String,
    pub local_path: PathBuf,
    pub filename: String,
}

/// One section file produced from a page's text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionFile {
    pub section: String,
    pub path: PathBuf,
}

/// Text extracted from one HTML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedText {
    pub html_file: PathBuf,
    pub text_file: PathBuf,
    pub text_length: usize,
    pub sections: Vec<SectionFile>,
    pub extraction_method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlStatistics {
    pub total_pages_crawled: usize,
    pub unique_urls_discovered: usize,
    pub failed_urls: usize,
    pub max_pages_limit: u32,
    pub robots_txt_compliance: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileProcessing {
    pub html_files_saved: usize,
    pub text_files_processed: usize,
    pub images_downloaded: usize,
    pub failed_images: usize,
    pub extraction_method: String,
}

/// Summary of a completed run, returned as the success body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub message: String,
    pub base_url: String,
    pub crawl_statistics: CrawlStatistics,
    pub file_processing: FileProcessing,
    pub processed_files: Vec<ProcessedText>,
    pub downloaded_images: Vec<SavedImage>,
    pub crawled_urls: Vec<String>,
    pub failed_urls: Vec<String>,
    pub failed_image_urls: Vec<String>,
    pub timestamp: String,
}
