pub mod client;
pub mod errors;
pub mod pipeline;
pub mod types;

pub use client::{BROWSER_USER_AGENT, Fetcher, browser_headers};
pub use errors::FetchError;
pub use types::{FetchLimits, FetchResult};
