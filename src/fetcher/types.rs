use chrono::{DateTime, Utc};
use encoding_rs::Encoding;
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

/// Bounds applied to a single GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub timeout: Duration,
    pub max_bytes: u64,
}

impl FetchLimits {
    pub fn new(timeout: Duration, max_bytes: u64) -> Self {
        Self { timeout, max_bytes }
    }
}

#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url_final: Url,
    pub status: StatusCode,
    pub content_type: String,
    pub body_utf8: String,
    pub encoding: &'static Encoding,
    pub fetched_at: DateTime<Utc>,
}
