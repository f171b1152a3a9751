//! Article body extraction as a priority-ordered list of strategies. The
//! first strategy to produce non-empty normalized text wins; a strategy that
//! fails is logged and skipped.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::extractor::model::normalize_whitespace;

/// Elements whose text never belongs to the article body.
const NON_CONTENT_TAGS: [&str; 7] = ["script", "style", "noscript", "nav", "header", "footer", "aside"];

/// Shortest container text the candidate scan will consider.
pub const MIN_CANDIDATE_CHARS: usize = 800;

static ARTICLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static CANDIDATE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    ["main", "div", "section"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
});

#[derive(Error, Debug)]
#[error("{strategy}: {message}")]
pub struct StrategyError {
    pub strategy: &'static str,
    pub message: String,
}

/// Input shared by every strategy.
pub struct Page<'a> {
    pub html: &'a str,
    pub document: &'a Html,
    pub url: &'a Url,
}

pub trait ContentStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw text for the page; `Ok(None)` when the strategy has nothing.
    fn extract(&self, page: &Page<'_>) -> Result<Option<String>, StrategyError>;
}

/// Readability-style scoring over the raw HTML.
pub struct ReadabilityStrategy;

impl ContentStrategy for ReadabilityStrategy {
    fn name(&self) -> &'static str {
        "readability"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Option<String>, StrategyError> {
        // Engine failures, panics included, only skip this strategy
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            readability::extractor::extract(&mut page.html.as_bytes(), page.url)
        }));

        match outcome {
            // The engine's plain text drops separators between nodes, so
            // re-walk its cleaned HTML the same way the structural strategies do
            Ok(Ok(article)) => {
                let fragment = Html::parse_fragment(&article.content);
                Ok(Some(content_text(fragment.root_element())))
            }
            Ok(Err(e)) => Err(StrategyError {
                strategy: self.name(),
                message: format!("{e:?}"),
            }),
            Err(_) => Err(StrategyError {
                strategy: self.name(),
                message: "extractor panicked".to_string(),
            }),
        }
    }
}

/// Text of the first `<article>` element.
pub struct ArticleTagStrategy;

impl ContentStrategy for ArticleTagStrategy {
    fn name(&self) -> &'static str {
        "article-tag"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Option<String>, StrategyError> {
        Ok(page
            .document
            .select(&ARTICLE_SELECTOR)
            .find(|article| !inside_non_content(*article))
            .map(content_text))
    }
}

/// Longest `<main>`/`<div>`/`<section>` with at least
/// [`MIN_CANDIDATE_CHARS`] characters of normalized text.
pub struct LongestBlockStrategy;

impl ContentStrategy for LongestBlockStrategy {
    fn name(&self) -> &'static str {
        "longest-block"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Option<String>, StrategyError> {
        let mut best: Option<(usize, String)> = None;

        for selector in CANDIDATE_SELECTORS.iter() {
            for element in page
                .document
                .select(selector)
                .filter(|element| !inside_non_content(*element))
            {
                let text = normalize_whitespace(&content_text(element));
                let len = text.chars().count();
                if len < MIN_CANDIDATE_CHARS {
                    continue;
                }
                // Ties keep the earliest candidate
                if best.as_ref().is_none_or(|(best_len, _)| len > *best_len) {
                    best = Some((len, text));
                }
            }
        }

        Ok(best.map(|(_, text)| text))
    }
}

/// Everything in `<body>`.
pub struct BodyStrategy;

impl ContentStrategy for BodyStrategy {
    fn name(&self) -> &'static str {
        "body"
    }

    fn extract(&self, page: &Page<'_>) -> Result<Option<String>, StrategyError> {
        Ok(page
            .document
            .select(&BODY_SELECTOR)
            .next()
            .map(content_text))
    }
}

/// Ordered strategy chain.
pub struct ContentExtractor {
    strategies: Vec<Box<dyn ContentStrategy>>,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new(vec![
            Box::new(ReadabilityStrategy),
            Box::new(ArticleTagStrategy),
            Box::new(LongestBlockStrategy),
            Box::new(BodyStrategy),
        ])
    }
}

impl ContentExtractor {
    pub fn new(strategies: Vec<Box<dyn ContentStrategy>>) -> Self {
        Self { strategies }
    }

    /// The structural strategies only, without the readability pass.
    pub fn structural() -> Self {
        Self::new(vec![
            Box::new(ArticleTagStrategy),
            Box::new(LongestBlockStrategy),
            Box::new(BodyStrategy),
        ])
    }

    /// Normalized article text, or an empty string when nothing matched.
    pub fn extract(&self, page: &Page<'_>) -> String {
        for strategy in &self.strategies {
            match strategy.extract(page) {
                Ok(Some(text)) => {
                    let text = normalize_whitespace(&text);
                    if !text.is_empty() {
                        debug!(strategy = strategy.name(), chars = text.len(), "extracted text");
                        return text;
                    }
                }
                Ok(None) => {}
                Err(e) => debug!(error = %e, "extraction strategy failed"),
            }
        }
        String::new()
    }
}

/// Text of `element` with non-content subtrees skipped: every text node is
/// trimmed, blank ones dropped, the rest joined by newlines.
pub fn content_text(element: ElementRef<'_>) -> String {
    let mut parts = Vec::new();
    collect_text(element, &mut parts);
    parts.join("\n")
}

/// True when any ancestor is a non-content element, e.g. an `<article>`
/// teaser inside an `<aside>`.
fn inside_non_content(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| NON_CONTENT_TAGS.contains(&ancestor.value().name()))
}

fn collect_text<'a>(element: ElementRef<'a>, parts: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        } else if let Some(child) = ElementRef::wrap(child)
            && !NON_CONTENT_TAGS.contains(&child.value().name())
        {
            collect_text(child, parts);
        }
    }
}
