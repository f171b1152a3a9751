//! Headless-browser capability used to follow script-driven redirects.
//!
//! The engine is optional: callers hold an `Option<Arc<dyn BrowserEngine>>`
//! and skip browser resolution entirely when it is `None`.

use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator, wd::Capabilities};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::fetcher::BROWSER_USER_AGENT;

const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("browser session could not be started: {0}")]
    Connect(String),

    #[error("navigation timed out after {0:?}")]
    NavigationTimeout(Duration),

    #[error("browser command failed: {0}")]
    Command(String),

    #[error("browser command timed out after {0:?}")]
    CommandTimeout(Duration),
}

/// Starts isolated browser sessions.
#[async_trait]
pub trait BrowserEngine: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError>;
}

/// One isolated browser context. `close` must be called on every exit path.
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate and wait for the page to load, bounded by `timeout`.
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError>;

    async fn current_url(&mut self) -> Result<String, BrowserError>;

    /// `href` of the first `<link rel="canonical">`, if any.
    async fn canonical_href(&mut self) -> Result<Option<String>, BrowserError>;

    /// Raw `href` attributes of at most `limit` anchors, in DOM order.
    async fn anchor_hrefs(&mut self, limit: usize) -> Result<Vec<String>, BrowserError>;

    async fn close(self: Box<Self>) -> Result<(), BrowserError>;
}

/// Chrome driven over the WebDriver protocol (chromedriver or a grid).
#[derive(Debug, Clone)]
pub struct WebDriverEngine {
    endpoint: String,
    user_agent: String,
    command_timeout: Duration,
}

impl WebDriverEngine {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Upper bound on connecting and on every WebDriver command.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless=new",
                    "--no-sandbox",
                    "--disable-gpu",
                    "--incognito",
                    format!("--user-agent={}", self.user_agent),
                ]
            }),
        );
        caps
    }
}

#[async_trait]
impl BrowserEngine for WebDriverEngine {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());
        let connect = builder.connect(&self.endpoint);
        let client = match tokio::time::timeout(self.command_timeout, connect).await {
            Ok(result) => result.map_err(|e| BrowserError::Connect(e.to_string()))?,
            Err(_) => return Err(BrowserError::CommandTimeout(self.command_timeout)),
        };
        debug!(endpoint = %self.endpoint, "webdriver session opened");
        Ok(Box::new(WebDriverSession {
            client,
            command_timeout: self.command_timeout,
        }))
    }
}

struct WebDriverSession {
    client: Client,
    command_timeout: Duration,
}

fn command_error(err: fantoccini::error::CmdError) -> BrowserError {
    BrowserError::Command(err.to_string())
}

/// Run one WebDriver command under `timeout`.
async fn bounded<T, F>(timeout: Duration, command: F) -> Result<T, BrowserError>
where
    F: Future<Output = Result<T, fantoccini::error::CmdError>>,
{
    match tokio::time::timeout(timeout, command).await {
        Ok(result) => result.map_err(command_error),
        Err(_) => Err(BrowserError::CommandTimeout(timeout)),
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        match tokio::time::timeout(timeout, self.client.goto(url)).await {
            Ok(result) => result.map_err(command_error),
            Err(_) => Err(BrowserError::NavigationTimeout(timeout)),
        }
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        let url = bounded(self.command_timeout, self.client.current_url()).await?;
        Ok(url.to_string())
    }

    async fn canonical_href(&mut self) -> Result<Option<String>, BrowserError> {
        let links = bounded(
            self.command_timeout,
            self.client.find_all(Locator::Css("link[rel='canonical']")),
        )
        .await?;
        match links.first() {
            Some(link) => bounded(self.command_timeout, link.attr("href")).await,
            None => Ok(None),
        }
    }

    async fn anchor_hrefs(&mut self, limit: usize) -> Result<Vec<String>, BrowserError> {
        let anchors = bounded(
            self.command_timeout,
            self.client.find_all(Locator::Css("a[href]")),
        )
        .await?;

        let mut hrefs = Vec::with_capacity(anchors.len().min(limit));
        for anchor in anchors.into_iter().take(limit) {
            match bounded(self.command_timeout, anchor.attr("href")).await {
                Ok(Some(href)) => hrefs.push(href),
                // Anchors can detach while scripts run; skip those
                Ok(None) | Err(BrowserError::Command(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(hrefs)
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        bounded(self.command_timeout, self.client.close()).await
    }
}
