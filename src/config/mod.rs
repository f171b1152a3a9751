//! Configuration handling for the worker.
//!
//! Two layers live here. [`ExtractionRequest`] is the per-invocation input
//! (what to fetch and how strictly), built from CLI flags. [`RuntimeConfig`]
//! carries the environment-level knobs (browser endpoint, navigation timing,
//! translation endpoint) and is loaded with [`RuntimeConfig::from_env`] using
//! development defaults when variables are absent.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

use url::Url;

/// Environment variable names. Public so tests and wrappers can set them.
pub const ENV_WEBDRIVER_URL: &str = "ARTICLE_WORKER_WEBDRIVER_URL";
pub const ENV_NAV_TIMEOUT_SECS: &str = "ARTICLE_WORKER_NAV_TIMEOUT_SECS";
pub const ENV_SETTLE_MS: &str = "ARTICLE_WORKER_SETTLE_MS";
pub const ENV_ANCHOR_SCAN_LIMIT: &str = "ARTICLE_WORKER_ANCHOR_SCAN_LIMIT";
pub const ENV_TRANSLATE_ENDPOINT: &str = "ARTICLE_WORKER_TRANSLATE_ENDPOINT";
pub const ENV_DETECT_LANG: &str = "ARTICLE_WORKER_DETECT_LANG";

/// Per-request defaults.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_MAX_BYTES: u64 = 3_000_000;

const DEFAULT_NAV_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SETTLE_MS: u64 = 2_000;
const DEFAULT_ANCHOR_SCAN_LIMIT: usize = 500;
const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// A single fetch-and-normalize job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    url: Url,
    timeout: Duration,
    max_bytes: u64,
    target_lang: Option<String>,
    debug: bool,
}

impl ExtractionRequest {
    /// Parse and validate a request. Blank target languages count as absent.
    pub fn new(
        url: &str,
        timeout_secs: u64,
        max_bytes: u64,
        target_lang: Option<&str>,
        debug: bool,
    ) -> Result<Self, ConfigError> {
        let raw = url.trim();
        let url = Url::parse(raw).map_err(|e| ConfigError::Invalid {
            name: "url",
            value: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                name: "url",
                value: raw.to_string(),
                reason: "scheme must be http or https".to_string(),
            });
        }
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "timeout",
                value: timeout_secs.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if max_bytes == 0 {
            return Err(ConfigError::Invalid {
                name: "max-bytes",
                value: max_bytes.to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        let target_lang = target_lang
            .map(|lang| lang.trim().to_lowercase())
            .filter(|lang| !lang.is_empty());

        Ok(Self {
            url,
            timeout: Duration::from_secs(timeout_secs),
            max_bytes,
            target_lang,
            debug,
        })
    }

    /// Request with default timeout and size cap.
    pub fn for_url(url: &str) -> Result<Self, ConfigError> {
        Self::new(url, DEFAULT_TIMEOUT_SECS, DEFAULT_MAX_BYTES, None, false)
    }

    pub fn with_target_lang(mut self, lang: impl Into<String>) -> Self {
        let lang = lang.into().trim().to_lowercase();
        self.target_lang = (!lang.is_empty()).then_some(lang);
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
    /// Transport timeout applied to each HTTP call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
    /// Body cap in bytes.
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
    pub fn target_lang(&self) -> Option<&str> {
        self.target_lang.as_deref()
    }
    pub fn debug(&self) -> bool {
        self.debug
    }
}

/// Environment-level configuration shared by every request in a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    webdriver_url: Option<String>,
    nav_timeout: Duration,
    settle_delay: Duration,
    anchor_scan_limit: usize,
    translate_endpoint: String,
    detect_language: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            webdriver_url: None,
            nav_timeout: Duration::from_secs(DEFAULT_NAV_TIMEOUT_SECS),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_MS),
            anchor_scan_limit: DEFAULT_ANCHOR_SCAN_LIMIT,
            translate_endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            detect_language: false,
        }
    }
}

impl RuntimeConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let webdriver_url = env::var(ENV_WEBDRIVER_URL)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let nav_timeout = parse_var(ENV_NAV_TIMEOUT_SECS)?
            .map(Duration::from_secs)
            .unwrap_or(defaults.nav_timeout);
        let settle_delay = parse_var(ENV_SETTLE_MS)?
            .map(Duration::from_millis)
            .unwrap_or(defaults.settle_delay);
        let anchor_scan_limit =
            parse_var(ENV_ANCHOR_SCAN_LIMIT)?.unwrap_or(defaults.anchor_scan_limit);
        let translate_endpoint =
            env::var(ENV_TRANSLATE_ENDPOINT).unwrap_or(defaults.translate_endpoint);
        let detect_language = match env::var(ENV_DETECT_LANG) {
            Ok(v) => parse_flag(ENV_DETECT_LANG, &v)?,
            Err(_) => defaults.detect_language,
        };

        Ok(Self {
            webdriver_url,
            nav_timeout,
            settle_delay,
            anchor_scan_limit,
            translate_endpoint,
            detect_language,
        })
    }

    pub fn with_webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.webdriver_url = Some(url.into());
        self
    }

    pub fn with_detect_language(mut self, enabled: bool) -> Self {
        self.detect_language = enabled;
        self
    }

    pub fn with_translate_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.translate_endpoint = endpoint.into();
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// WebDriver endpoint; `None` disables browser-based resolution.
    pub fn webdriver_url(&self) -> Option<&str> {
        self.webdriver_url.as_deref()
    }
    /// Page-load budget for browser navigation.
    pub fn nav_timeout(&self) -> Duration {
        self.nav_timeout
    }
    /// Wait after navigation for script-driven redirects.
    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }
    /// Upper bound on anchors inspected in a rendered page.
    pub fn anchor_scan_limit(&self) -> usize {
        self.anchor_scan_limit
    }
    pub fn translate_endpoint(&self) -> &str {
        &self.translate_endpoint
    }
    pub fn detect_language(&self) -> bool {
        self.detect_language
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid {
                name,
                value,
                reason,
            } => write!(f, "invalid {name} {value:?}: {reason}"),
        }
    }
}

impl Error for ConfigError {}
