use std::path::Path;

/// Outcome of converting one saved document to text
#[derive(Debug)]
pub enum ConversionOutcome {
    Converted { markdown: String },
    /// The converter produced no text
    Empty,
    Failed { reason: String },
}

/// Converts a saved HTML file into readable text
pub trait DocumentConverter: Send + Sync {
    /// Short name reported as the extraction method
    fn name(&self) -> &str;

    fn convert(&self, path: &Path) -> ConversionOutcome;
}

/// HTML to Markdown conversion with `htmd`
#[derive(Debug, Default)]
pub struct HtmdConverter;

impl HtmdConverter {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentConverter for HtmdConverter {
    fn name(&self) -> &str {
        "htmd"
    }

    fn convert(&self, path: &Path) -> ConversionOutcome {
        ::log::info!("Processing HTML file with {}: {}", self.name(), path.display());

        let html = match std::fs::read_to_string(path) {
            Ok(html) => html,
            Err(e) => {
                return ConversionOutcome::Failed {
                    reason: format!("cannot read {}: {}", path.display(), e),
                };
            }
        };

        match htmd::convert(&html) {
            Ok(markdown) if markdown.trim().is_empty() => ConversionOutcome::Empty,
            Ok(markdown) => {
                ::log::info!("Extracted {} characters", markdown.len());
                ConversionOutcome::Converted { markdown }
            }
            Err(e) => ConversionOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }
}
