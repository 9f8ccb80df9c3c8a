use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};

/// Maximum length of the URL-derived part of a page filename
pub const MAX_STEM_LEN: usize = 100;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Convert a URL to a filesystem-safe stem: the scheme is dropped, every
/// non-alphanumeric character becomes `_`, and the result is cut at
/// `MAX_STEM_LEN` characters.
pub fn sanitize_filename(url: &str) -> String {
    let without_scheme = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);

    without_scheme
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_STEM_LEN)
        .collect()
}

/// Filename for a saved page, stamped with the current second.
///
/// Two URLs sharing their first `MAX_STEM_LEN` sanitized characters
/// collide when saved within the same second.
pub fn page_filename(url: &str, extension: &str) -> String {
    page_filename_at(url, extension, Local::now())
}

/// Filename for a saved page, stamped with the given instant
pub fn page_filename_at(url: &str, extension: &str, at: DateTime<Local>) -> String {
    format!(
        "{}_{}.{}",
        sanitize_filename(url),
        at.format(TIMESTAMP_FORMAT),
        extension
    )
}

/// Filename for a downloaded image, stamped with the current second
pub fn image_filename(url: &str, content_type: Option<&str>) -> String {
    image_filename_at(url, content_type, Local::now())
}

/// Filename for a downloaded image: a 12-hex-character URL hash plus an
/// extension taken from the content type, else from the URL path.
pub fn image_filename_at(url: &str, content_type: Option<&str>, at: DateTime<Local>) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let hash = hex::encode(digest);
    let extension = match content_type {
        Some(content_type) => extension_from_content_type(content_type),
        None => extension_from_url(url),
    };

    format!("img_{}_{}.{}", &hash[..12], at.format(TIMESTAMP_FORMAT), extension)
}

/// Image extension declared by a content type, `jpg` when unrecognised
pub fn extension_from_content_type(content_type: &str) -> &'static str {
    let content_type = content_type.to_lowercase();
    if content_type.contains("jpeg") || content_type.contains("jpg") {
        "jpg"
    } else if content_type.contains("png") {
        "png"
    } else if content_type.contains("gif") {
        "gif"
    } else if content_type.contains("webp") {
        "webp"
    } else if content_type.contains("svg") {
        "svg"
    } else {
        "jpg"
    }
}

/// Image extension implied by a URL's path suffix, `jpg` when unrecognised
pub fn extension_from_url(url: &str) -> &'static str {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_lowercase(),
    };

    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "jpg"
    } else if path.ends_with(".png") {
        "png"
    } else if path.ends_with(".gif") {
        "gif"
    } else if path.ends_with(".webp") {
        "webp"
    } else if path.ends_with(".svg") {
        "svg"
    } else {
        "jpg"
    }
}
