use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HORIZONTAL_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Document-level metadata pulled from `<head>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    pub author: Option<String>,
    pub published_at: Option<String>,
    pub lang: Option<String>,
}

/// Metadata plus body text for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub metadata: PageMetadata,
    pub text: String,
}

/// Collapse runs of spaces/tabs, cap blank lines at one, trim the ends.
/// Applying it twice gives the same result as applying it once.
pub fn normalize_whitespace(text: &str) -> String {
    let spaced = HORIZONTAL_SPACE.replace_all(text, " ");
    let lines = BLANK_LINES.replace_all(&spaced, "\n\n");
    lines.trim().to_string()
}
