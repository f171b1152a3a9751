use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::extractor::language::normalize_lang;
use crate::extractor::model::PageMetadata;

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static HTML_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("html").unwrap());

const TITLE_KEYS: [&str; 2] = ["og:title", "twitter:title"];
const AUTHOR_KEYS: [&str; 2] = ["author", "article:author"];
const PUBLISHED_KEYS: [&str; 4] = [
    "article:published_time",
    "og:updated_time",
    "date",
    "pubdate",
];

pub fn extract_metadata(document: &Html) -> PageMetadata {
    let title = pick_meta(document, &TITLE_KEYS)
        .or_else(|| document_title(document))
        .unwrap_or_default();

    PageMetadata {
        title,
        author: pick_meta(document, &AUTHOR_KEYS),
        // Kept verbatim; formats vary too much across publishers to parse
        published_at: pick_meta(document, &PUBLISHED_KEYS),
        lang: document_lang(document),
    }
}

/// First non-empty `content` among `meta[name=key]` / `meta[property=key]`,
/// trying keys in order.
pub fn pick_meta(document: &Html, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        ["name", "property"].iter().find_map(|attr| {
            let selector = Selector::parse(&format!("meta[{attr}=\"{key}\"]")).ok()?;
            document
                .select(&selector)
                .next()
                .and_then(|meta| meta.value().attr("content"))
                .map(str::trim)
                .filter(|content| !content.is_empty())
                .map(str::to_string)
        })
    })
}

fn document_title(document: &Html) -> Option<String> {
    let title = document.select(&TITLE_SELECTOR).next()?;
    let text = title.text().map(str::trim).collect::<String>();
    (!text.is_empty()).then_some(text)
}

/// `<html lang>` first, then `og:locale`.
fn document_lang(document: &Html) -> Option<String> {
    let declared = document
        .select(&HTML_SELECTOR)
        .next()
        .and_then(|html| html.value().attr("lang"));

    normalize_lang(declared).or_else(|| normalize_lang(pick_meta(document, &["og:locale"]).as_deref()))
}
