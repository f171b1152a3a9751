//! Orchestration of a single extraction: unwrap, fetch, extract, translate,
//! and package the outcome as a [`ResultEnvelope`].

pub mod envelope;
pub mod errors;

pub use envelope::{ExtractedArticle, OutputConfig, ResultEnvelope, write_envelope};
pub use errors::{ErrorKind, WorkerError};

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

use crate::config::{ExtractionRequest, RuntimeConfig};
use crate::extractor::{self, ContentExtractor};
use crate::fetcher::{FetchLimits, Fetcher};
use crate::resolver::{BrowserEngine, NavigationSettings, RedirectResolver, UnwrapLoop, WrapperRules};
use crate::translate::{Translator, needs_translation, translate_fields};

pub struct Worker {
    fetcher: Fetcher,
    resolver: RedirectResolver,
    content: ContentExtractor,
    translator: Option<Arc<dyn Translator>>,
    detect_language: bool,
}

impl Worker {
    /// Build a worker with the default wrapper rules and extraction chain.
    pub fn new(
        config: &RuntimeConfig,
        browser: Option<Arc<dyn BrowserEngine>>,
    ) -> Result<Self, WorkerError> {
        Self::with_rules(config, WrapperRules::default(), browser)
    }

    pub fn with_rules(
        config: &RuntimeConfig,
        rules: WrapperRules,
        browser: Option<Arc<dyn BrowserEngine>>,
    ) -> Result<Self, WorkerError> {
        let resolver = RedirectResolver::new(rules, browser, NavigationSettings::from(config))?;
        Ok(Self {
            fetcher: Fetcher::new()?,
            resolver,
            content: ContentExtractor::default(),
            translator: None,
            detect_language: config.detect_language(),
        })
    }

    pub fn with_content_extractor(mut self, content: ContentExtractor) -> Self {
        self.content = content;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Run the full pipeline for one request.
    #[instrument(skip_all, fields(url = %request.url()))]
    pub async fn process(&self, request: &ExtractionRequest) -> Result<ExtractedArticle, WorkerError> {
        let limits = FetchLimits::new(request.timeout(), request.max_bytes());

        let resolved = UnwrapLoop::new(&self.fetcher, &self.resolver)
            .run(request.url(), limits)
            .await?;
        let page = resolved.page;

        let content = extractor::extract(&page, &self.content, self.detect_language);
        let mut title = content.metadata.title;
        let mut text = content.text;
        let lang = content.metadata.lang;

        if let (Some(translator), Some(target)) = (&self.translator, request.target_lang())
            && needs_translation(Some(target), lang.as_deref())
        {
            debug!(target, source = ?lang, "translating article");
            let translated = translate_fields(translator.as_ref(), title, text, target).await;
            title = translated.title;
            text = translated.text;
        }

        let site = page.url_final.host_str().unwrap_or_default().to_string();
        info!(site = %site, chars = text.chars().count(), "article extracted");

        Ok(ExtractedArticle {
            url: request.url().clone(),
            resolved_url: resolved.resolved_url,
            final_url: page.url_final,
            site,
            title,
            author: content.metadata.author,
            published_at: content.metadata.published_at,
            lang,
            text,
            fetched_at: page.fetched_at,
        })
    }

    /// Like [`Worker::process`] but always produces an envelope, plus the
    /// exit status for the process.
    pub async fn run(&self, request: &ExtractionRequest) -> (ResultEnvelope, i32) {
        let started = Instant::now();
        let outcome = self.process(request).await;
        let elapsed_ms = elapsed_ms(started);

        match outcome {
            Ok(article) => (ResultEnvelope::success(article, elapsed_ms), 0),
            Err(e) => {
                if request.debug() {
                    error!(error = ?e, kind = ?e.kind(), "extraction failed");
                } else {
                    debug!(error = %e, "extraction failed");
                }
                (
                    ResultEnvelope::failure(e.envelope_message(), elapsed_ms),
                    e.exit_code(),
                )
            }
        }
    }
}

pub fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
