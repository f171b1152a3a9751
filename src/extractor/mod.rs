pub mod language;
pub mod metadata;
pub mod model;
pub mod reader;

#[cfg(test)]
mod tests;

pub use model::{ExtractedContent, PageMetadata, normalize_whitespace};
pub use reader::{ContentExtractor, ContentStrategy, Page};

use scraper::Html;

use crate::fetcher::FetchResult;

/// Pull metadata and body text out of a fetched page. Never fails: missing
/// pieces come back empty or `None`.
pub fn extract(
    resp: &FetchResult,
    content: &ContentExtractor,
    detect_from_text: bool,
) -> ExtractedContent {
    let document = Html::parse_document(&resp.body_utf8);

    // 1. Head metadata
    let mut metadata = metadata::extract_metadata(&document);

    // 2. Body text through the strategy chain
    let page = Page {
        html: &resp.body_utf8,
        document: &document,
        url: &resp.url_final,
    };
    let text = content.extract(&page);

    // 3. Statistical language guess when the page declares none
    if metadata.lang.is_none() && detect_from_text {
        metadata.lang = language::detect_language(&text);
    }

    ExtractedContent { metadata, text }
}
