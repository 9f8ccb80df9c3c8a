pub mod convert;
pub mod html;
pub mod text;

#[cfg(test)]
mod tests;

pub use convert::{ConversionOutcome, DocumentConverter, HtmdConverter};
pub use html::find_image_urls;
pub use text::{GENERAL, TabSections, segment_by_topic};
