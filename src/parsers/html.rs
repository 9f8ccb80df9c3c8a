use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

const IMAGE_EXTENSIONS: [&str; 7] = [".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".bmp"];
const IMAGE_HINTS: [&str; 4] = ["image", "img", "photo", "picture"];
const TRACKING_MARKERS: [&str; 3] = ["1x1", "1px", "pixel"];

static BACKGROUND_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"background-image:\s*url\(["']?([^"')]+)["']?\)"#)
        .expect("background-image pattern is valid")
});

static IMG_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("img selector is valid"));

static STYLED_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[style]").expect("style selector is valid"));

/// Whether a raw attribute value looks like a real, fetchable image
pub fn is_valid_image_url(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.starts_with("data:") {
        return false;
    }

    let lower = candidate.to_lowercase();
    if TRACKING_MARKERS.iter().any(|marker| lower.contains(marker)) {
        return false;
    }

    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || IMAGE_HINTS.iter().any(|hint| lower.contains(hint))
}

/// Make an image reference absolute. Protocol-relative references get
/// `https:`; everything else relative is resolved against `base`.
pub fn normalize_image_url(candidate: &str, base: &Url) -> Option<String> {
    if let Some(rest) = candidate.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return Some(candidate.to_string());
    }

    match base.join(candidate) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(e) => {
            ::log::debug!("Could not resolve image reference {}: {}", candidate, e);
            None
        }
    }
}

/// Collects image URLs from `img` tags (`src`, `data-src`) and inline
/// `background-image` styles, as absolute, de-duplicated URLs.
pub fn find_image_urls(html: &str, base_url: &str) -> HashSet<String> {
    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(e) => {
            ::log::error!("Error extracting image URLs: bad base URL {}: {}", base_url, e);
            return HashSet::new();
        }
    };

    let doc = Html::parse_document(html);
    let mut candidates: Vec<&str> = Vec::new();

    for img in doc.select(&IMG_SELECTOR) {
        candidates.extend(img.value().attr("src"));
        candidates.extend(img.value().attr("data-src"));
    }

    for element in doc.select(&STYLED_SELECTOR) {
        if let Some(style) = element.value().attr("style") {
            candidates.extend(
                BACKGROUND_IMAGE
                    .captures_iter(style)
                    .filter_map(|c| c.get(1))
                    .map(|m| m.as_str()),
            );
        }
    }

    let image_urls: HashSet<String> = candidates
        .into_iter()
        .map(str::trim)
        .filter(|candidate| is_valid_image_url(candidate))
        .filter_map(|candidate| normalize_image_url(candidate, &base))
        .collect();

    ::log::info!("Extracted {} image URLs from HTML", image_urls.len());
    image_urls
}
