//! Image downloads.
//!
//! Each candidate URL goes through the URL policy, is fetched with a
//! browser user agent, must be served as `image/*`, and must decode to at
//! least `min_dimension` pixels on both sides. Anything smaller is a
//! tracking pixel and is removed from disk again.

use crate::config::ImageFetchConfig;
use crate::error::{ImageFailure, Result};
use crate::filter::PolicyFilter;
use crate::state::CrawlState;
use crate::utils::image_filename;
use image::ImageReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Downloads and validates images into one directory
pub struct ImageFetcher {
    client: reqwest::Client,
    images_dir: PathBuf,
    min_dimension: u32,
}

impl ImageFetcher {
    pub fn new(config: &ImageFetchConfig, images_dir: impl Into<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            images_dir: images_dir.into(),
            min_dimension: config.min_dimension,
        })
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Download `url` and record the outcome in `state`.
    ///
    /// Returns the saved path, or `None` if the image was rejected. URLs
    /// already seen in this run are skipped without a request.
    pub async fn download(
        &self,
        url: &str,
        policy: &PolicyFilter,
        state: &mut CrawlState,
    ) -> Option<PathBuf> {
        if state.is_image_seen(url) {
            ::log::debug!("Skipping already processed image: {}", url);
            return None;
        }

        match self.fetch(url, policy).await {
            Ok(path) => {
                state.record_image_downloaded(url);
                ::log::info!("Downloaded image: {}", path.display());
                Some(path)
            }
            Err(e) => {
                state.record_image_failed(url);
                ::log::warn!("Failed to download image {}: {}", url, e);
                None
            }
        }
    }

    /// Fetch and validate one image without touching run state
    pub async fn fetch(
        &self,
        url: &str,
        policy: &PolicyFilter,
    ) -> std::result::Result<PathBuf, ImageFailure> {
        if !policy.is_allowed(url, None) {
            return Err(ImageFailure::Disallowed);
        }

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageFailure::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        if !content_type.starts_with("image/") {
            return Err(ImageFailure::NotAnImage(content_type));
        }

        let filename = image_filename(url, Some(&content_type));
        let path = self.images_dir.join(filename);

        let checked = match write_body(&mut response, &path).await {
            Ok(()) => self.validate(&path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = checked {
            remove_rejected(&path).await;
            return Err(e);
        }

        Ok(path)
    }

    async fn validate(&self, path: &Path) -> std::result::Result<(), ImageFailure> {
        let owned = path.to_path_buf();
        let (width, height) = tokio::task::spawn_blocking(move || read_dimensions(&owned))
            .await
            .map_err(std::io::Error::other)??;

        if width < self.min_dimension || height < self.min_dimension {
            return Err(ImageFailure::TooSmall { width, height });
        }
        Ok(())
    }
}

/// Stream the response body into a new file at `path`
async fn write_body(
    response: &mut reqwest::Response,
    path: &Path,
) -> std::result::Result<(), ImageFailure> {
    let mut file = File::create(path).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

fn read_dimensions(path: &Path) -> std::result::Result<(u32, u32), ImageFailure> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()
        .map_err(|e| ImageFailure::Undecodable(e.to_string()))
}

/// Delete a rejected or partially written image, if it exists
async fn remove_rejected(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => ::log::debug!("Removed rejected image {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => ::log::warn!("Could not remove rejected image {}: {}", path.display(), e),
    }
}
