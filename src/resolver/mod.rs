pub mod browser;
pub mod publisher;
pub mod redirect;
pub mod unwrap;
pub mod wrapper;

pub use browser::{BrowserEngine, BrowserError, BrowserSession, WebDriverEngine};
pub use publisher::find_publisher_url;
pub use redirect::{NavigationSettings, RedirectResolver};
pub use unwrap::{MAX_REFETCHES, ResolvedPage, UnwrapLoop};
pub use wrapper::WrapperRules;
