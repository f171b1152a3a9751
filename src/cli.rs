//! Command-line interface for the `worker` binary.

use clap::Parser;

use crate::config::{
    ConfigError, DEFAULT_MAX_BYTES, DEFAULT_TIMEOUT_SECS, ENV_DETECT_LANG, ENV_WEBDRIVER_URL,
    ExtractionRequest,
};

/// Fetch one article URL, unwrap aggregator links, and print a JSON result.
///
/// ```sh
/// worker --url https://news.google.com/rss/articles/CBMi... --target-lang en
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Article or aggregator URL to process
    #[arg(long)]
    pub url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Maximum response body size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BYTES)]
    pub max_bytes: u64,

    /// Translate title and text into this language (e.g. "en", "fr")
    #[arg(long)]
    pub target_lang: Option<String>,

    /// Emit debug diagnostics on stderr
    #[arg(long)]
    pub debug: bool,

    /// WebDriver endpoint used to resolve aggregator links in a headless browser
    #[arg(long, env = ENV_WEBDRIVER_URL)]
    pub webdriver_url: Option<String>,

    /// Guess the language from the text when the page does not declare one
    #[arg(long, env = ENV_DETECT_LANG)]
    pub detect_lang: bool,

    /// Escape all non-ASCII characters in the JSON output
    #[arg(long)]
    pub ascii_output: bool,
}

impl Cli {
    pub fn request(&self) -> Result<ExtractionRequest, ConfigError> {
        ExtractionRequest::new(
            &self.url,
            self.timeout,
            self.max_bytes,
            self.target_lang.as_deref(),
            self.debug,
        )
    }
}
