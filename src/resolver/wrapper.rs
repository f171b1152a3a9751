//! Aggregator host rules: which URLs are wrappers, which hosts count as
//! on-aggregator, and how gateway redirect links are unwrapped.

use url::Url;

/// Host and path rules describing one link aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperRules {
    aggregator_hosts: Vec<String>,
    /// Any host with one of these dot-separated labels is on-aggregator,
    /// so regional domains like `consent.google.de` never count as a
    /// publisher.
    aggregator_labels: Vec<String>,
    gateway_hosts: Vec<String>,
    article_segments: Vec<String>,
    redirect_path: String,
}

impl Default for WrapperRules {
    fn default() -> Self {
        Self::google_news()
    }
}

impl WrapperRules {
    /// Google News article wrappers and `google.com/url` redirects.
    pub fn google_news() -> Self {
        Self::new(
            ["news.google.com", "www.google.com", "google.com"],
            ["www.google.com", "google.com"],
        )
        .with_aggregator_label("google")
    }

    pub fn new<A, G>(aggregator_hosts: A, gateway_hosts: G) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        Self {
            aggregator_hosts: lowercase_all(aggregator_hosts),
            aggregator_labels: Vec::new(),
            gateway_hosts: lowercase_all(gateway_hosts),
            article_segments: vec!["/articles/".to_string(), "/rss/articles/".to_string()],
            redirect_path: "/url".to_string(),
        }
    }

    pub fn with_aggregator_label(mut self, label: impl Into<String>) -> Self {
        self.aggregator_labels.push(label.into().to_ascii_lowercase());
        self
    }

    /// True for a host in the aggregator set, any subdomain of one, or any
    /// host carrying an aggregator label.
    pub fn is_aggregator_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        let listed = self.aggregator_hosts.iter().any(|agg| {
            host == *agg
                || host
                    .strip_suffix(agg.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        });
        listed
            || host
                .split('.')
                .any(|label| self.aggregator_labels.iter().any(|l| l == label))
    }

    /// An absolute http(s) URL whose host is not an aggregator.
    pub fn is_off_aggregator(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && url
                .host_str()
                .is_some_and(|host| !host.is_empty() && !self.is_aggregator_host(host))
    }

    /// Parse `candidate` and accept it only if it leaves the aggregator.
    pub fn off_aggregator_url(&self, candidate: &str) -> Option<Url> {
        let url = Url::parse(candidate.trim()).ok()?;
        self.is_off_aggregator(&url).then_some(url)
    }

    /// Wrapper classification for a raw string. Unparseable input is not a
    /// wrapper.
    pub fn is_wrapper_str(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|u| self.is_wrapper(&u))
    }

    pub fn is_wrapper(&self, url: &Url) -> bool {
        let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
            return false;
        };
        if !self.aggregator_hosts.contains(&host) {
            return false;
        }

        let path = url.path();
        if self.article_segments.iter().any(|seg| path.contains(seg.as_str())) {
            return true;
        }

        self.is_gateway_host(&host) && path == self.redirect_path
    }

    fn is_gateway_host(&self, host: &str) -> bool {
        self.gateway_hosts.iter().any(|g| g == host)
    }

    /// `https://www.google.com/url?...&url=<target>` (or `q=`) yields the
    /// decoded target; anything else comes back unchanged.
    pub fn unwrap_redirect_link(&self, href: &str) -> String {
        let Ok(parsed) = Url::parse(href) else {
            return href.to_string();
        };
        let is_gateway = parsed
            .host_str()
            .is_some_and(|host| self.is_gateway_host(&host.to_ascii_lowercase()));
        if !is_gateway || parsed.path() != self.redirect_path {
            return href.to_string();
        }

        let first_value = |key: &str| {
            parsed
                .query_pairs()
                .find(|(k, v)| k == key && !v.is_empty())
                .map(|(_, v)| v.into_owned())
        };

        first_value("url")
            .or_else(|| first_value("q"))
            .unwrap_or_else(|| href.to_string())
    }
}

fn lowercase_all<I>(hosts: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    hosts
        .into_iter()
        .map(|h| h.into().to_ascii_lowercase())
        .collect()
}
