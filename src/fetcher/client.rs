use crate::fetcher::{
    errors::FetchError,
    pipeline::{is_markup_content_type, process_response, push_chunk},
    types::{FetchLimits, FetchResult},
};
use bytes::BytesMut;
use reqwest::{
    Client, ClientBuilder,
    header::{self, HeaderMap, HeaderValue},
};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const ACCEPT_MARKUP: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const MAX_REDIRECTS: usize = 10;

/// Headers every article request carries: a desktop browser identity and
/// no-cache directives so intermediaries hand back a fresh copy.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT_MARKUP));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

/// Size- and content-type-bounded HTML fetcher.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(BROWSER_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .default_headers(browser_headers())
            .build()
            .map_err(FetchError::from_reqwest_error)?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    #[instrument(skip_all, fields(url = %url, max_bytes = limits.max_bytes))]
    pub async fn fetch(&self, url: &Url, limits: FetchLimits) -> Result<FetchResult, FetchError> {
        let mut response = self
            .client
            .get(url.clone())
            .timeout(limits.timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let final_url = response.url().clone();
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Http { status });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        if !is_markup_content_type(&content_type) {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        // A declared length over the cap fails before any body is read
        if let Some(content_length) = response.content_length()
            && content_length > limits.max_bytes
        {
            return Err(FetchError::BodyTooLarge {
                limit: limits.max_bytes,
            });
        }

        // The declared length may be absent or wrong, so count what arrives
        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(FetchError::from_reqwest_error)?
        {
            push_chunk(&mut body, &chunk, limits.max_bytes)?;
        }

        debug!(
            final_url = %final_url,
            status = status.as_u16(),
            bytes = body.len(),
            "fetched page"
        );

        Ok(process_response(
            final_url,
            status,
            body.freeze(),
            &content_type,
        ))
    }
}
