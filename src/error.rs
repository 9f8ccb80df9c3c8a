//! Error types for the harvester

use thiserror::Error;

/// Run-level errors. Any of these aborts the run and becomes the
/// top-level error response.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// A required credential is missing from the environment
    #[error("{0} environment variable is required")]
    MissingCredential(&'static str),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The crawl service returned no page data at all
    #[error("No data returned from crawl service")]
    UpstreamEmpty,

    /// The crawl service call failed
    #[error("Crawl service error: {0}")]
    Upstream(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Why a single page was not saved
#[derive(Debug, Error)]
pub enum PageFailure {
    #[error("disallowed by crawl policy")]
    Disallowed,

    #[error("no HTML content")]
    EmptyBody,

    #[error("failed to write HTML file: {0}")]
    Write(#[from] std::io::Error),
}

/// Why a single image was not kept
#[derive(Debug, Error)]
pub enum ImageFailure {
    #[error("disallowed by crawl policy")]
    Disallowed,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("not an image (content-type: {0})")]
    NotAnImage(String),

    #[error("invalid image file: {0}")]
    Undecodable(String),

    #[error("image too small ({width}x{height})")]
    TooSmall { width: u32, height: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for run-level operations
pub type Result<T> = std::result::Result<T, ScrapeError>;
