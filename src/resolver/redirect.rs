//! Pre-fetch resolution of wrapper URLs: headless browser first, then plain
//! HTTP redirect following. Neither tier surfaces errors; both report
//! "unresolved" as `None`.

use reqwest::{
    Client, ClientBuilder,
    header::{self, HeaderMap, HeaderValue},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::RuntimeConfig;
use crate::fetcher::{BROWSER_USER_AGENT, FetchError};
use crate::resolver::browser::{BrowserEngine, BrowserError, BrowserSession};
use crate::resolver::wrapper::WrapperRules;

const AGGREGATOR_REFERER: &str = "https://news.google.com/";
const MAX_HTTP_REDIRECTS: usize = 5;

/// Timing and bounds for browser-based resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationSettings {
    pub nav_timeout: Duration,
    pub settle_delay: Duration,
    pub anchor_scan_limit: usize,
}

impl From<&RuntimeConfig> for NavigationSettings {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            nav_timeout: config.nav_timeout(),
            settle_delay: config.settle_delay(),
            anchor_scan_limit: config.anchor_scan_limit(),
        }
    }
}

pub struct RedirectResolver {
    rules: WrapperRules,
    browser: Option<Arc<dyn BrowserEngine>>,
    navigation: NavigationSettings,
    http: Client,
}

impl RedirectResolver {
    pub fn new(
        rules: WrapperRules,
        browser: Option<Arc<dyn BrowserEngine>>,
        navigation: NavigationSettings,
    ) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(header::REFERER, HeaderValue::from_static(AGGREGATOR_REFERER));

        let http = ClientBuilder::new()
            .user_agent(BROWSER_USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_HTTP_REDIRECTS))
            .default_headers(headers)
            .build()
            .map_err(FetchError::from_reqwest_error)?;

        Ok(Self {
            rules,
            browser,
            navigation,
            http,
        })
    }

    pub fn rules(&self) -> &WrapperRules {
        &self.rules
    }

    /// Try every tier in priority order.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn resolve(&self, url: &Url, timeout: Duration) -> Option<Url> {
        match &self.browser {
            Some(engine) => {
                if let Some(resolved) = self.resolve_with_browser(engine.as_ref(), url).await {
                    debug!(resolved = %resolved, "resolved in headless browser");
                    return Some(resolved);
                }
            }
            None => warn!("headless browser not configured, skipping browser resolution"),
        }

        let resolved = self.resolve_with_http(url, timeout).await;
        match &resolved {
            Some(resolved) => debug!(resolved = %resolved, "resolved by following redirects"),
            None => debug!("redirects stayed on the aggregator"),
        }
        resolved
    }

    /// Tier A. The session is closed whatever the outcome.
    pub async fn resolve_with_browser(&self, engine: &dyn BrowserEngine, url: &Url) -> Option<Url> {
        let mut session = match engine.open_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "headless browser unavailable");
                return None;
            }
        };

        let result = self.inspect_session(session.as_mut(), url).await;

        if let Err(e) = session.close().await {
            debug!(error = %e, "failed to close browser session");
        }

        match result {
            Ok(found) => found,
            Err(e) => {
                debug!(error = %e, "browser resolution failed");
                None
            }
        }
    }

    async fn inspect_session(
        &self,
        session: &mut dyn BrowserSession,
        url: &Url,
    ) -> Result<Option<Url>, BrowserError> {
        session.goto(url.as_str(), self.navigation.nav_timeout).await?;
        tokio::time::sleep(self.navigation.settle_delay).await;

        let landed = session.current_url().await?;
        if let Some(found) = self.rules.off_aggregator_url(&landed) {
            return Ok(Some(found));
        }

        if let Some(canonical) = session.canonical_href().await?
            && let Some(found) = self.rules.off_aggregator_url(&canonical)
        {
            return Ok(Some(found));
        }

        let hrefs = session.anchor_hrefs(self.navigation.anchor_scan_limit).await?;
        Ok(hrefs
            .iter()
            .map(|href| self.rules.unwrap_redirect_link(href.trim()))
            .find_map(|href| self.rules.off_aggregator_url(&href)))
    }

    /// Tier B: drop the query string and let the server redirect us.
    pub async fn resolve_with_http(&self, url: &Url, timeout: Duration) -> Option<Url> {
        let mut clean = url.clone();
        clean.set_query(None);
        clean.set_fragment(None);

        let response = match self.http.get(clean).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "redirect lookup failed");
                return None;
            }
        };

        let landed = response.url().clone();
        self.rules.is_off_aggregator(&landed).then_some(landed)
    }
}
