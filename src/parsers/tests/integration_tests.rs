use crate::parsers::{ConversionOutcome, DocumentConverter, HtmdConverter, find_image_urls};
use crate::parsers::text::segment_by_topic;
use std::fs;

#[cfg(test)]
mod tests {
    use super::*;

    const FAQ_PAGE: &str = r#"<html><body>
        <h2>Settlement</h2>
        <p>When will I receive my settlement?</p>
        <p>Payouts are processed daily.</p>
        <img src="/assets/settlement-flow.png" alt="flow">
    </body></html>"#;

    #[test]
    fn test_convert_then_segment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faq.html");
        fs::write(&path, FAQ_PAGE).unwrap();

        let converter = HtmdConverter::new();
        assert_eq!(converter.name(), "htmd");

        let markdown = match converter.convert(&path) {
            ConversionOutcome::Converted { markdown } => markdown,
            other => panic!("expected converted text, got {:?}", other),
        };
        assert!(markdown.contains("Settlement"));
        assert!(markdown.contains("Payouts are processed daily."));

        let sections = segment_by_topic(&markdown);
        assert!(sections["Settlement"].contains("When will I receive my settlement?"));
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = HtmdConverter::new().convert(&dir.path().join("absent.html"));
        assert!(matches!(outcome, ConversionOutcome::Failed { .. }));
    }

    #[test]
    fn test_blank_page_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.html");
        fs::write(&path, "<html><body>   </body></html>").unwrap();

        let outcome = HtmdConverter::new().convert(&path);
        assert!(matches!(outcome, ConversionOutcome::Empty));
    }

    #[test]
    fn test_saved_page_images() {
        let urls = find_image_urls(FAQ_PAGE, "https://site.test/help-center");
        assert_eq!(urls.len(), 1);
        assert!(urls.contains("https://site.test/assets/settlement-flow.png"));
    }
}
