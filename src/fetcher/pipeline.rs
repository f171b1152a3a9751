use crate::fetcher::{errors::FetchError, types::FetchResult};
use bytes::{Bytes, BytesMut};
use chrono::Utc;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::StatusCode;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

static META_HTTP_EQUIV_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?http-equiv\s*=\s*["']?content-type["']?[^>]*?content\s*=\s*["']?[^"'>]*?charset\s*=\s*([^"'\s;/>]+)"#).unwrap()
});

const MARKUP_TYPES: [&str; 3] = ["text/html", "application/xhtml+xml", "application/xml"];

/// An absent content-type is accepted; a present one must be HTML/XHTML/XML.
pub fn is_markup_content_type(content_type: &str) -> bool {
    let content_type = content_type.trim().to_ascii_lowercase();
    content_type.is_empty() || MARKUP_TYPES.iter().any(|t| content_type.contains(t))
}

/// Append a chunk unless it would push the buffer past `limit`.
pub fn push_chunk(buffer: &mut BytesMut, chunk: &[u8], limit: u64) -> Result<(), FetchError> {
    let total = buffer.len() as u64 + chunk.len() as u64;
    if total > limit {
        return Err(FetchError::BodyTooLarge { limit });
    }
    buffer.extend_from_slice(chunk);
    Ok(())
}

pub fn process_response(
    url_final: Url,
    status: StatusCode,
    body_bytes: Bytes,
    content_type: &str,
) -> FetchResult {
    let encoding = detect_encoding(content_type, &body_bytes);
    let body_utf8 = decode_lossy(&body_bytes, encoding);

    FetchResult {
        url_final,
        status,
        content_type: content_type.to_string(),
        body_utf8,
        encoding,
        fetched_at: Utc::now(),
    }
}

fn label_to_encoding(captures: Option<regex::Captures<'_>>) -> Option<&'static Encoding> {
    let label = captures?.get(1)?.as_str().to_lowercase();
    Encoding::for_label(label.as_bytes())
}

fn detect_encoding(content_type: &str, body_bytes: &[u8]) -> &'static Encoding {
    // 1. Server-declared charset
    if let Some(encoding) = label_to_encoding(CHARSET_REGEX.captures(content_type)) {
        return encoding;
    }

    // 2. <meta charset> / http-equiv in the first 4KB
    let search_bytes = &body_bytes[..body_bytes.len().min(4096)];
    let search_str = String::from_utf8_lossy(search_bytes);

    if let Some(encoding) = label_to_encoding(META_CHARSET_REGEX.captures(&search_str)) {
        return encoding;
    }
    if let Some(encoding) = label_to_encoding(META_HTTP_EQUIV_REGEX.captures(&search_str)) {
        return encoding;
    }

    // 3. Heuristic
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(search_bytes, false);
    detector.guess(None, true)
}

/// Decode with replacement characters; never fails.
fn decode_lossy(body_bytes: &[u8], encoding: &'static Encoding) -> String {
    let (decoded, used, had_errors) = encoding.decode(body_bytes);
    if had_errors {
        debug!(
            encoding = used.name(),
            "body contained undecodable bytes, replaced"
        );
    }
    decoded.into_owned()
}
