use crate::error::{Result, ScrapeError};
use crate::filter::PolicyConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Environment variable holding the crawl service credential
pub const API_KEY_VAR: &str = "FIRECRAWL_API_KEY";

/// Environment variable pointing at an optional JSON config file
pub const CONFIG_PATH_VAR: &str = "SCRAPER_CONFIG";

/// Environment variable overriding the crawl service endpoint
pub const API_URL_VAR: &str = "FIRECRAWL_API_URL";

/// Configuration for a harvesting run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Site to crawl
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Page limit passed to the crawl service
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Directory for raw HTML
    #[serde(default = "default_html_dir")]
    pub html_dir: PathBuf,

    /// Directory for extracted text
    #[serde(default = "default_text_dir")]
    pub text_dir: PathBuf,

    /// Directory for downloaded images
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    /// URL policy settings
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Crawl service settings
    #[serde(default)]
    pub firecrawl: FirecrawlConfig,

    /// Image download settings
    #[serde(default)]
    pub images: ImageFetchConfig,
}

/// Settings for the hosted crawl service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirecrawlConfig {
    /// Service endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Credential, only ever taken from the environment
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Delay between job status checks
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Give up waiting for the crawl job after this long
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// Timeout for each individual request to the service
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Per-page scrape options forwarded to the service
    #[serde(default)]
    pub scrape_options: ScrapeOptions,
}

/// Scrape options as the crawl service expects them
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOptions {
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,

    #[serde(default)]
    pub only_main_content: bool,

    #[serde(default = "default_include_tags")]
    pub include_tags: Vec<String>,

    /// Milliseconds the service waits before capturing a page
    #[serde(default = "default_wait_for")]
    pub wait_for: u64,

    #[serde(default)]
    pub screenshot: bool,

    /// Browser actions run before capture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<serde_json::Value>>,
}

/// Settings for image downloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageFetchConfig {
    #[serde(default = "default_image_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_image_timeout_secs")]
    pub timeout_secs: u64,

    /// Images narrower or shorter than this are treated as tracking pixels
    #[serde(default = "default_min_dimension")]
    pub min_dimension: u32,
}

fn default_base_url() -> String {
    "https://www.jiopay.com".to_string()
}

fn default_max_pages() -> u32 {
    500
}

fn default_html_dir() -> PathBuf {
    PathBuf::from("html")
}

fn default_text_dir() -> PathBuf {
    PathBuf::from("text")
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_api_url() -> String {
    "https://api.firecrawl.dev".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_wait_secs() -> u64 {
    1800
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_formats() -> Vec<String> {
    vec!["markdown".to_string(), "html".to_string()]
}

fn default_include_tags() -> Vec<String> {
    ["nav", "menu", "sidebar", "footer"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

fn default_wait_for() -> u64 {
    2000
}

fn default_image_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_image_timeout_secs() -> u64 {
    30
}

fn default_min_dimension() -> u32 {
    10
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_pages: default_max_pages(),
            html_dir: default_html_dir(),
            text_dir: default_text_dir(),
            images_dir: default_images_dir(),
            policy: PolicyConfig::default(),
            firecrawl: FirecrawlConfig::default(),
            images: ImageFetchConfig::default(),
        }
    }
}

impl Default for FirecrawlConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_secs: default_max_wait_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            scrape_options: ScrapeOptions::default(),
        }
    }
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            only_main_content: false,
            include_tags: default_include_tags(),
            wait_for: default_wait_for(),
            screenshot: false,
            actions: None,
        }
    }
}

impl Default for ImageFetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_image_user_agent(),
            timeout_secs: default_image_timeout_secs(),
            min_dimension: default_min_dimension(),
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|e| {
            ScrapeError::Config(format!("cannot open {}: {}", path.display(), e))
        })?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an environment-like lookup.
    ///
    /// The credential is checked first so that a missing key fails before
    /// any file is read or any request is made.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ScrapeError::MissingCredential(API_KEY_VAR))?;

        let mut config = match lookup(CONFIG_PATH_VAR).filter(|p| !p.is_empty()) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(api_url) = lookup(API_URL_VAR).filter(|u| !u.is_empty()) {
            config.firecrawl.api_url = api_url;
        }
        config.firecrawl.api_key = Some(api_key);

        Ok(config)
    }
}
