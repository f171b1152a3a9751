//! Optional translation of title and body text.

pub mod google;

pub use google::GoogleTranslator;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// Largest piece of body text sent in one call.
pub const CHUNK_CHARS: usize = 4500;

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("translation service returned {0}")]
    Status(reqwest::StatusCode),

    #[error("unexpected response shape: {0}")]
    Response(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target`, letting the service detect the source.
    async fn translate(&self, text: &str, target: &str) -> Result<String, TranslateError>;
}

/// Title and body after the translation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedFields {
    pub title: String,
    pub text: String,
}

/// Whether a translation pass is needed for this target/source pair.
pub fn needs_translation(target: Option<&str>, source: Option<&str>) -> bool {
    match target {
        Some(target) if !target.is_empty() => Some(target) != source,
        _ => false,
    }
}

/// Split on character boundaries into pieces of at most `size` chars.
pub fn chunk_text(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let end = rest
            .char_indices()
            .nth(size)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

/// Translate title and text independently. A failure leaves that field as
/// it was; chunks are sent one after another and rejoined with spaces.
pub async fn translate_fields(
    translator: &dyn Translator,
    title: String,
    text: String,
    target: &str,
) -> TranslatedFields {
    let title = if title.is_empty() {
        title
    } else {
        match translator.translate(&title, target).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!(error = %e, "title translation failed, keeping original");
                title
            }
        }
    };

    let text = if text.is_empty() {
        text
    } else {
        match translate_chunked(translator, &text, target).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!(error = %e, "text translation failed, keeping original");
                text
            }
        }
    };

    TranslatedFields { title, text }
}

async fn translate_chunked(
    translator: &dyn Translator,
    text: &str,
    target: &str,
) -> Result<String, TranslateError> {
    let chunks = chunk_text(text, CHUNK_CHARS);
    debug!(chunks = chunks.len(), target, "translating body text");

    let mut translated = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        translated.push(translator.translate(chunk, target).await?);
    }
    Ok(translated.join(" "))
}
