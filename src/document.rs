// src/document.rs

//! Fail-closed navigation over fetched documents.
//!
//! The services query markup and JSON exclusively through these helpers, so
//! a missing required anchor surfaces as a structure-drift error with stage
//! context instead of a panic deep inside a parser.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::error::{FeedError, Result};

/// Parse raw text as an HTML document. The underlying parser is
/// error-tolerant, so this cannot fail; malformed markup shows up later as
/// missing anchors.
pub fn parse_html(text: &str) -> Html {
    Html::parse_document(text)
}

/// Parse raw text as a JSON document.
pub fn parse_json(text: &str, stage: &'static str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| FeedError::parse(stage, e))
}

/// Parse a CSS selector.
pub fn selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| FeedError::selector(s, format!("{e:?}")))
}

/// First match for a required anchor. Missing means the upstream layout
/// changed in a breaking way.
pub fn require_first<'a>(
    scope: ElementRef<'a>,
    selector: &Selector,
    stage: &'static str,
    what: &str,
) -> Result<ElementRef<'a>> {
    scope
        .select(selector)
        .next()
        .ok_or_else(|| FeedError::drift(stage, format!("missing required anchor: {what}")))
}

/// First match for an optional anchor.
pub fn first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// Required attribute on an element.
pub fn require_attr<'a>(
    element: ElementRef<'a>,
    name: &str,
    stage: &'static str,
) -> Result<&'a str> {
    element
        .value()
        .attr(name)
        .ok_or_else(|| FeedError::drift(stage, format!("missing attribute '{name}'")))
}

/// Collected, trimmed text content of an element.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Navigate a JSON document by pointer. A missing path is reported as
/// structure drift, never as a panic.
pub fn json_path<'a>(value: &'a Value, pointer: &str, stage: &'static str) -> Result<&'a Value> {
    value
        .pointer(pointer)
        .ok_or_else(|| FeedError::drift(stage, format!("missing path '{pointer}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_first_present() {
        let html = parse_html("<div><span class='x'>hello</span></div>");
        let sel = selector("span.x").unwrap();
        let element = require_first(html.root_element(), &sel, "test", "span").unwrap();
        assert_eq!(text_of(element), "hello");
    }

    #[test]
    fn test_require_first_missing_is_drift() {
        let html = parse_html("<div></div>");
        let sel = selector("span.x").unwrap();
        let error = require_first(html.root_element(), &sel, "test", "span").unwrap_err();
        assert!(matches!(error, FeedError::Drift { stage: "test", .. }));
    }

    #[test]
    fn test_require_attr_missing_is_drift() {
        let html = parse_html("<a>link</a>");
        let sel = selector("a").unwrap();
        let anchor = first(html.root_element(), &sel).unwrap();
        assert!(require_attr(anchor, "href", "test").is_err());
    }

    #[test]
    fn test_parse_json_rejects_garbage() {
        assert!(matches!(
            parse_json("{not json", "test"),
            Err(FeedError::Parse { stage: "test", .. })
        ));
    }

    #[test]
    fn test_json_path_missing_is_drift() {
        let value = parse_json(r#"{"a": {"b": 1}}"#, "test").unwrap();
        assert_eq!(json_path(&value, "/a/b", "test").unwrap(), 1);
        assert!(json_path(&value, "/a/c", "test").is_err());
    }

    #[test]
    fn test_selector_invalid() {
        assert!(selector("[[invalid").is_err());
    }
}
