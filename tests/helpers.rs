#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use article_worker::resolver::{
    BrowserEngine, BrowserError, BrowserSession, NavigationSettings, RedirectResolver,
    WrapperRules,
};

/// The mock server plays the aggregator on `127.0.0.1` and the publisher on
/// `localhost`; both names reach the same listener.
pub fn local_rules() -> WrapperRules {
    WrapperRules::new(["127.0.0.1"], ["127.0.0.1"])
}

pub fn aggregator_url(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("http://127.0.0.1:{}{}", server.address().port(), route)).unwrap()
}

pub fn publisher_url(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("http://localhost:{}{}", server.address().port(), route)).unwrap()
}

pub fn fast_navigation() -> NavigationSettings {
    NavigationSettings {
        nav_timeout: Duration::from_secs(2),
        settle_delay: Duration::ZERO,
        anchor_scan_limit: 50,
    }
}

pub fn resolver(browser: Option<Arc<dyn BrowserEngine>>) -> RedirectResolver {
    RedirectResolver::new(local_rules(), browser, fast_navigation()).unwrap()
}

pub async fn mount_html(server: &MockServer, route: &str, html: impl Into<String>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html.into(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

pub async fn mount_redirect(server: &MockServer, route: &str, location: &Url) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", location.as_str()))
        .mount(server)
        .await;
}

/// Wrapper page whose only way out is a "Read full article" link.
pub fn wrapper_page(target: &Url) -> String {
    format!(
        r#"<html><head><title>Aggregator</title></head><body>
            <a href="/topics/world">World</a>
            <a href="{target}">Read full article</a>
        </body></html>"#
    )
}

/// How a scripted browser session behaves after navigation.
#[derive(Debug, Clone)]
pub enum Scripted {
    /// The page navigates itself to this URL.
    LandsOn(String),
    /// Stays put and exposes these anchors.
    Anchors(Vec<String>),
    /// Stays put and exposes a canonical link as well as anchors.
    CanonicalAndAnchors {
        canonical: String,
        anchors: Vec<String>,
    },
    /// Navigation fails.
    NavigationError,
}

/// In-process stand-in for a WebDriver browser that counts opened and
/// closed sessions.
#[derive(Debug, Clone)]
pub struct FakeBrowser {
    pub script: Scripted,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    /// Last `limit` passed to `anchor_hrefs`.
    pub anchor_limit: Arc<Mutex<Option<usize>>>,
}

impl FakeBrowser {
    pub fn new(script: Scripted) -> Self {
        Self {
            script,
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            anchor_limit: Arc::new(Mutex::new(None)),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn anchor_limit(&self) -> Option<usize> {
        *self.anchor_limit.lock().unwrap()
    }
}

#[async_trait]
impl BrowserEngine for FakeBrowser {
    async fn open_session(&self) -> Result<Box<dyn BrowserSession>, BrowserError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            script: self.script.clone(),
            current: String::new(),
            closed: Arc::clone(&self.closed),
            anchor_limit: Arc::clone(&self.anchor_limit),
        }))
    }
}

struct FakeSession {
    script: Scripted,
    current: String,
    closed: Arc<AtomicUsize>,
    anchor_limit: Arc<Mutex<Option<usize>>>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn goto(&mut self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        match &self.script {
            Scripted::NavigationError => Err(BrowserError::NavigationTimeout(timeout)),
            Scripted::LandsOn(target) => {
                self.current = target.clone();
                Ok(())
            }
            Scripted::Anchors(_) | Scripted::CanonicalAndAnchors { .. } => {
                self.current = url.to_string();
                Ok(())
            }
        }
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        Ok(self.current.clone())
    }

    async fn canonical_href(&mut self) -> Result<Option<String>, BrowserError> {
        match &self.script {
            Scripted::CanonicalAndAnchors { canonical, .. } => Ok(Some(canonical.clone())),
            _ => Ok(None),
        }
    }

    // Returns every anchor regardless of `limit`; tests assert on the
    // recorded limit instead
    async fn anchor_hrefs(&mut self, limit: usize) -> Result<Vec<String>, BrowserError> {
        *self.anchor_limit.lock().unwrap() = Some(limit);
        match &self.script {
            Scripted::Anchors(hrefs) | Scripted::CanonicalAndAnchors { anchors: hrefs, .. } => {
                Ok(hrefs.clone())
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn close(self: Box<Self>) -> Result<(), BrowserError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
