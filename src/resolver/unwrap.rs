//! Bounded loop that turns a possibly-wrapped URL into a fetched publisher
//! page.
//!
//! ```text
//! Precheck -> Fetching -> StillWrapped -> Fetching (at most MAX_REFETCHES)
//!                  \                \
//!                   -> Resolved      -> failure
//! ```

use tracing::{debug, info, instrument};
use url::Url;

use crate::fetcher::{FetchLimits, FetchResult, Fetcher};
use crate::resolver::publisher::find_publisher_url;
use crate::resolver::redirect::RedirectResolver;
use crate::worker::WorkerError;

/// Re-fetches allowed after the first fetch while still on a wrapper.
pub const MAX_REFETCHES: u8 = 2;

/// The page the loop settled on.
#[derive(Debug, Clone)]
pub struct ResolvedPage {
    /// Last URL requested (publisher URL once unwrapped).
    pub resolved_url: Url,
    pub page: FetchResult,
    pub refetches: u8,
}

enum State {
    Precheck,
    Fetching(Url),
    StillWrapped { requested: Url, page: FetchResult },
    Resolved { requested: Url, page: FetchResult },
}

pub struct UnwrapLoop<'a> {
    fetcher: &'a Fetcher,
    resolver: &'a RedirectResolver,
}

impl<'a> UnwrapLoop<'a> {
    pub fn new(fetcher: &'a Fetcher, resolver: &'a RedirectResolver) -> Self {
        Self { fetcher, resolver }
    }

    #[instrument(skip_all, fields(url = %input))]
    pub async fn run(&self, input: &Url, limits: FetchLimits) -> Result<ResolvedPage, WorkerError> {
        let rules = self.resolver.rules();
        let input_was_wrapper = rules.is_wrapper(input);
        let mut refetches = 0u8;
        let mut state = State::Precheck;

        loop {
            state = match state {
                State::Precheck => {
                    if !input_was_wrapper {
                        State::Fetching(input.clone())
                    } else {
                        debug!("input is an aggregator wrapper, resolving before fetch");
                        match self.resolver.resolve(input, limits.timeout).await {
                            Some(resolved) => State::Fetching(resolved),
                            None => {
                                debug!("pre-fetch resolution failed, will parse wrapper page");
                                State::Fetching(input.clone())
                            }
                        }
                    }
                }

                State::Fetching(url) => {
                    let page = self.fetcher.fetch(&url, limits).await?;
                    let landed = &page.url_final;
                    let still_wrapped = rules.is_wrapper(landed)
                        || (input_was_wrapper && !rules.is_off_aggregator(landed));
                    if still_wrapped {
                        State::StillWrapped {
                            requested: url,
                            page,
                        }
                    } else {
                        State::Resolved {
                            requested: url,
                            page,
                        }
                    }
                }

                State::StillWrapped { requested, page } => {
                    if refetches >= MAX_REFETCHES {
                        return Err(WorkerError::UnwrapExhausted {
                            attempts: refetches,
                        });
                    }
                    debug!(
                        attempt = refetches + 1,
                        url = %page.url_final,
                        "still on aggregator, parsing wrapper page"
                    );
                    match find_publisher_url(&page.body_utf8, &page.url_final, rules) {
                        Some(publisher) => {
                            refetches += 1;
                            State::Fetching(publisher)
                        }
                        None => {
                            return Err(WorkerError::NoPublisherLink { url: requested });
                        }
                    }
                }

                State::Resolved { requested, page } => {
                    info!(final_url = %page.url_final, refetches, "resolved article page");
                    return Ok(ResolvedPage {
                        resolved_url: requested,
                        page,
                        refetches,
                    });
                }
            };
        }
    }
}
