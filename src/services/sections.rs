//! Section resolution service.
//!
//! Resolves the list of content categories from the site's index page.
//! Newer layouts embed the full catalog as a JSON blob inside a script tag;
//! older layouts only expose anchor links. Both shapes are supported, with
//! the blob preferred because it carries richer metadata.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::document;
use crate::error::{FeedError, Result};
use crate::models::{Config, Section, SectionCatalog, SectionKind};
use crate::utils::{de, resolve_url};

const STAGE: &str = "sections";

/// Service for resolving the section catalog from the index page.
pub struct SectionResolver {
    base: Url,
    config_blob: Regex,
    hot: Selector,
    trending: Selector,
    fresh: Selector,
    menu: Selector,
}

impl SectionResolver {
    /// Create a new resolver from the client configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            base: config.base()?,
            config_blob: Regex::new(r#"window\._config\s*=\s*JSON\.parse\("(.*?)"\)"#)
                .map_err(|e| FeedError::config(format!("config blob pattern: {e}")))?,
            hot: document::selector(&config.selectors.hot_section)?,
            trending: document::selector(&config.selectors.trending_section)?,
            fresh: document::selector(&config.selectors.fresh_section)?,
            menu: document::selector(&config.selectors.menu_sections)?,
        })
    }

    /// Resolve the section catalog from the index page text.
    pub fn resolve(&self, index_page: &str) -> Result<SectionCatalog> {
        if let Some(blob) = self.embedded_config(index_page) {
            return self.resolve_from_config(&blob);
        }
        log::debug!("no embedded config blob; falling back to anchor scraping");
        self.resolve_from_anchors(&document::parse_html(index_page))
    }

    /// Extract and unescape the embedded configuration blob, if present.
    fn embedded_config(&self, index_page: &str) -> Option<String> {
        let captures = self.config_blob.captures(index_page)?;
        let raw = captures.get(1)?.as_str();
        Some(raw.replace("\\\"", "\"").replace("\\\\/", "/"))
    }

    fn resolve_from_config(&self, blob: &str) -> Result<SectionCatalog> {
        let value = document::parse_json(blob, STAGE)?;
        let page = document::json_path(&value, "/page", STAGE)?;

        // The primary list is a required anchor; the other groups come and
        // go with upstream experiments.
        let sections = self.parse_group(document::json_path(page, "/sections", STAGE)?);
        let featured = page
            .pointer("/featuredSections")
            .map(|group| self.parse_group(group))
            .unwrap_or_default();
        let local = page
            .pointer("/localSections")
            .map(|group| self.parse_group(group))
            .unwrap_or_default();
        let current_local = page
            .pointer("/geoSection")
            .and_then(|raw| self.section_from_value(raw));

        Ok(SectionCatalog {
            sections,
            featured,
            local,
            current_local,
        })
    }

    /// Parse one group of sections. Entries are keyed by slug in current
    /// layouts but have shipped as plain arrays before; a malformed entry is
    /// skipped, not fatal.
    fn parse_group(&self, group: &Value) -> Vec<Section> {
        let entries: Vec<&Value> = match group {
            Value::Object(map) => map.values().collect(),
            Value::Array(items) => items.iter().collect(),
            _ => Vec::new(),
        };

        entries
            .into_iter()
            .filter_map(|entry| self.section_from_value(entry))
            .collect()
    }

    fn section_from_value(&self, value: &Value) -> Option<Section> {
        let raw: RawSection = match serde_json::from_value(value.clone()) {
            Ok(raw) => raw,
            Err(error) => {
                log::warn!("skipping malformed section entry: {error}");
                return None;
            }
        };

        let url = match resolve_url(&self.base, &raw.url) {
            Ok(url) => url,
            Err(error) => {
                log::warn!("skipping section '{}' with bad URL: {error}", raw.name);
                return None;
            }
        };

        let kind = SectionKind::parse_label(&raw.name);
        Some(Section {
            name: raw.name,
            description: raw.description.unwrap_or_default(),
            kind,
            url,
            icon_url: raw.og_image_url,
            region: raw.location.unwrap_or_default(),
            upload_enabled: raw.is_upload_enabled,
            sensitive: raw.is_sensitive,
        })
    }

    /// Anchor-scraping fallback for layouts without the config blob. The
    /// three primary anchors are required; the secondary menu degrades per
    /// entry.
    fn resolve_from_anchors(&self, document: &Html) -> Result<SectionCatalog> {
        let root = document.root_element();
        let mut sections = Vec::new();

        let primary = [
            (&self.hot, SectionKind::Hot, "hot section anchor"),
            (&self.trending, SectionKind::Trending, "trending section anchor"),
            (&self.fresh, SectionKind::Fresh, "fresh section anchor"),
        ];
        for (selector, kind, what) in primary {
            let anchor = document::require_first(root, selector, STAGE, what)?;
            sections.push(self.section_from_anchor(anchor, Some(kind))?);
        }

        for anchor in root.select(&self.menu) {
            match self.section_from_anchor(anchor, None) {
                Ok(section) => sections.push(section),
                Err(error) => log::warn!("skipping malformed section anchor: {error}"),
            }
        }

        Ok(SectionCatalog {
            sections,
            ..SectionCatalog::default()
        })
    }

    fn section_from_anchor(
        &self,
        anchor: ElementRef<'_>,
        kind: Option<SectionKind>,
    ) -> Result<Section> {
        let name = document::text_of(anchor);
        let href = document::require_attr(anchor, "href", STAGE)?;
        let url = resolve_url(&self.base, href)?;
        let kind = kind.unwrap_or_else(|| SectionKind::parse_label(&name));

        Ok(Section {
            name,
            description: String::new(),
            kind,
            url,
            icon_url: None,
            region: String::new(),
            upload_enabled: false,
            sensitive: false,
        })
    }
}

/// Raw section entry as it appears in the embedded configuration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSection {
    name: String,

    #[serde(default, deserialize_with = "de::empty_string_as_none")]
    description: Option<String>,

    url: String,

    #[serde(default, deserialize_with = "de::empty_string_as_none")]
    og_image_url: Option<String>,

    #[serde(default, deserialize_with = "de::empty_string_as_none")]
    location: Option<String>,

    #[serde(default)]
    is_sensitive: bool,

    #[serde(default)]
    is_upload_enabled: bool,
}
