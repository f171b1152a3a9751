use chrono::Utc;
use reqwest::StatusCode;
use url::Url;

use crate::extractor::{ContentExtractor, extract, normalize_whitespace};
use crate::fetcher::FetchResult;

const PARAGRAPH: &str = "The council voted on Tuesday to expand the river restoration project, \
adding four new wetland sites and a public monitoring program. ";

#[test]
fn test_article_tag_excludes_boilerplate() {
    let html = format!(
        r#"<!DOCTYPE html><html lang="en"><head><title>Council Vote</title>
        <style>body {{ color: red }}</style></head>
        <body>
          <header>Site Header</header>
          <nav><a href="/">Home</a><a href="/news">News</a></nav>
          <article>
            <h1>Council Vote</h1>
            <script>trackPageView();</script>
            <p>{p}</p>
            <aside>Related: other stories</aside>
            <p>Second   paragraph	with tabs.</p>
            <footer>Article footer</footer>
          </article>
          <footer>Copyright</footer>
        </body></html>"#,
        p = PARAGRAPH
    );

    let response = create_test_response(html, "https://example.com/council");
    let content = extract(&response, &ContentExtractor::structural(), false);

    assert_eq!(
        content.text,
        format!(
            "Council Vote\n{}\nSecond paragraph with tabs.",
            PARAGRAPH.trim()
        )
    );
    assert!(!content.text.contains("trackPageView"));
    assert!(!content.text.contains("Related"));
    assert!(!content.text.contains("Copyright"));
    assert_eq!(content.metadata.title, "Council Vote");
    assert_eq!(content.metadata.lang.as_deref(), Some("en"));
}

#[test]
fn test_longest_block_wins_without_article() {
    let long_text = PARAGRAPH.repeat(12);
    let longer_text = PARAGRAPH.repeat(14);
    let html = format!(
        r#"<html><body>
            <div id="sidebar">Short sidebar text</div>
            <section><p>{long_text}</p></section>
            <main><p>{longer_text}</p></main>
        </body></html>"#
    );

    let response = create_test_response(html, "https://example.com/longest");
    let content = extract(&response, &ContentExtractor::structural(), false);

    assert_eq!(content.text, normalize_whitespace(&longer_text));
}

#[test]
fn test_short_blocks_fall_back_to_body() {
    let html = r#"<html><body>
        <nav>Menu</nav>
        <div>Only a short note.</div>
        <p>Loose paragraph.</p>
    </body></html>"#
        .to_string();

    let response = create_test_response(html, "https://example.com/short");
    let content = extract(&response, &ContentExtractor::structural(), false);

    assert_eq!(content.text, "Only a short note.\nLoose paragraph.");
}

#[test]
fn test_empty_article_falls_through() {
    let html = r#"<html><body><article><script>x()</script></article><p>Body text</p></body></html>"#
        .to_string();

    let response = create_test_response(html, "https://example.com/empty-article");
    let content = extract(&response, &ContentExtractor::structural(), false);

    assert_eq!(content.text, "Body text");
}

#[test]
fn test_no_content_is_empty_string() {
    let response = create_test_response(String::new(), "https://example.com/nothing");
    let content = extract(&response, &ContentExtractor::structural(), false);

    assert_eq!(content.text, "");
    assert_eq!(content.metadata.title, "");
}

#[test]
fn test_default_chain_extracts_article() {
    let html = format!(
        r#"<!DOCTYPE html><html><head><title>Valid Article</title></head><body><article><h1>Valid Article</h1><p>{}</p></article></body></html>"#,
        "This is a valid article with enough content to pass the minimum requirements for extraction. ".repeat(20)
    );

    let response = create_test_response(html, "https://example.com/valid");
    let content = extract(&response, &ContentExtractor::default(), false);

    assert_eq!(content.metadata.title, "Valid Article");
    assert!(content.text.contains("valid article with enough content"));
    assert_eq!(normalize_whitespace(&content.text), content.text);
}

#[test]
fn test_malformed_html() {
    let html =
        "<html><head><title>Broken</title><body><p>Unclosed tags<div>More content".to_string();

    let response = create_test_response(html, "https://example.com/broken");
    let content = extract(&response, &ContentExtractor::structural(), false);

    assert_eq!(content.metadata.title, "Broken");
    assert!(content.text.contains("Unclosed tags"));
}

#[test]
fn test_language_detection_is_opt_in() {
    let html = format!("<html><body><article><p>{}</p></article></body></html>", PARAGRAPH.repeat(3));

    let response = create_test_response(html, "https://example.com/undeclared");
    let without = extract(&response, &ContentExtractor::structural(), false);
    let with = extract(&response, &ContentExtractor::structural(), true);

    assert_eq!(without.metadata.lang, None);
    assert_eq!(with.metadata.lang.as_deref(), Some("en"));
}

#[test]
fn test_default_chain_keeps_separators_between_nodes() {
    let paragraphs: String = (0..6)
        .map(|i| format!("<p>{PARAGRAPH}See <a href=\"/map/{i}\">the map</a> for route {i}.</p>\n"))
        .collect();
    let html = format!(
        r#"<!DOCTYPE html><html><head><title>Routes</title></head>
        <body><article>{paragraphs}</article></body></html>"#
    );

    let response = create_test_response(html, "https://example.com/routes");
    let default = extract(&response, &ContentExtractor::default(), false);
    let structural = extract(&response, &ContentExtractor::structural(), false);

    assert_eq!(default.text, structural.text);
    assert!(default.text.contains("See\nthe map\nfor route 0."));
    assert!(!default.text.contains("Seethe map"));
}

#[test]
fn test_article_inside_aside_is_skipped() {
    let html = r#"<html><body>
        <aside><article>Related teaser headline</article></aside>
        <article><p>Main story body.</p></article>
    </body></html>"#
        .to_string();

    let response = create_test_response(html, "https://example.com/teaser");
    let content = extract(&response, &ContentExtractor::structural(), false);

    assert_eq!(content.text, "Main story body.");
}

#[test]
fn test_long_block_inside_footer_is_skipped() {
    let legal = "Legal boilerplate sentence repeated for every page on the site. ".repeat(22);
    let html = format!(
        r#"<html><body>
        <div>Short real note.</div>
        <footer><div>{legal}</div></footer>
    </body></html>"#
    );

    let response = create_test_response(html, "https://example.com/legal");
    let content = extract(&response, &ContentExtractor::structural(), false);

    assert_eq!(content.text, "Short real note.");
}

fn create_test_response(html: String, url: &str) -> FetchResult {
    FetchResult {
        url_final: Url::parse(url).unwrap(),
        status: StatusCode::OK,
        content_type: "text/html; charset=utf-8".to_string(),
        body_utf8: html,
        encoding: encoding_rs::UTF_8,
        fetched_at: Utc::now(),
    }
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(
            html in ".*",
            url in "https://[a-z]+\\.com/[a-z]*"
        ) {
            let response = create_test_response(html, &url);
            let _ = extract(&response, &ContentExtractor::default(), false);
        }

        #[test]
        fn test_extracted_text_is_normalized(html in ".*") {
            let response = create_test_response(html, "https://example.com");
            let content = extract(&response, &ContentExtractor::structural(), false);
            prop_assert_eq!(normalize_whitespace(&content.text), content.text);
        }

        #[test]
        fn test_normalize_idempotent(text in "[ \\ta-z\\n]*") {
            let once = normalize_whitespace(&text);
            prop_assert_eq!(normalize_whitespace(&once), once);
        }
    }
}
