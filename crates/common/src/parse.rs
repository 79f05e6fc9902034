use scraper::Selector;

use crate::error::{IngestError, IngestResult};

/// Parse a CSS selector, mapping failures into the ingest taxonomy.
pub fn selector(css: &str) -> IngestResult<Selector> {
    Selector::parse(css)
        .map_err(|e| IngestError::HtmlParse(format!("bad selector `{}`: {}", css, e)))
}
