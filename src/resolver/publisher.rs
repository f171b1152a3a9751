//! Finds the outbound publisher link on an aggregator wrapper page.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::resolver::wrapper::WrapperRules;

static ANCHOR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());
static CANONICAL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[rel='canonical'][href]").unwrap());

/// Visible link texts that point at the full story.
const CALL_TO_ACTION_PHRASES: [&str; 3] = ["read full article", "view full coverage", "go to article"];

/// Locate the publisher URL in a wrapper page. Strategies run in order and
/// the first hit wins: call-to-action anchor, canonical link, then the first
/// outbound anchor with an article-like path (or any outbound anchor).
pub fn find_publisher_url(html: &str, base_url: &Url, rules: &WrapperRules) -> Option<Url> {
    let document = Html::parse_document(html);

    if let Some(url) = call_to_action_link(&document, base_url, rules) {
        debug!(url = %url, "publisher link from call-to-action anchor");
        return Some(url);
    }
    if let Some(url) = canonical_link(&document, rules) {
        debug!(url = %url, "publisher link from canonical tag");
        return Some(url);
    }
    if let Some(url) = outbound_anchor(&document, base_url, rules) {
        debug!(url = %url, "publisher link from outbound anchor scan");
        return Some(url);
    }
    None
}

/// Resolve `href` against the page, unwrap gateway redirects, and keep it
/// only if it leaves the aggregator.
pub fn resolve_candidate(href: &str, base_url: &Url, rules: &WrapperRules) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let absolute = base_url.join(href).ok()?;
    let unwrapped = rules.unwrap_redirect_link(absolute.as_str());
    rules.off_aggregator_url(&unwrapped)
}

fn anchor_text(anchor: &ElementRef<'_>) -> String {
    anchor
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn call_to_action_link(document: &Html, base_url: &Url, rules: &WrapperRules) -> Option<Url> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter(|anchor| {
            let text = anchor_text(anchor);
            CALL_TO_ACTION_PHRASES
                .iter()
                .any(|phrase| text.contains(phrase))
        })
        .filter_map(|anchor| anchor.value().attr("href"))
        .find_map(|href| resolve_candidate(href, base_url, rules))
}

fn canonical_link(document: &Html, rules: &WrapperRules) -> Option<Url> {
    document
        .select(&CANONICAL_SELECTOR)
        .filter_map(|link| link.value().attr("href"))
        .find_map(|href| rules.off_aggregator_url(href))
}

fn outbound_anchor(document: &Html, base_url: &Url, rules: &WrapperRules) -> Option<Url> {
    let mut first_outbound = None;

    for href in document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| anchor.value().attr("href"))
    {
        let Some(url) = resolve_candidate(href, base_url, rules) else {
            continue;
        };
        // A bare domain is less likely to be the story than a real path
        if url.path().len() > 1 {
            return Some(url);
        }
        first_outbound.get_or_insert(url);
    }

    first_outbound
}
