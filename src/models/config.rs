//! Client configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FeedError, Result};

/// Root client configuration.
///
/// Every endpoint and structural anchor the pipeline relies on lives here,
/// so tests can point the whole pipeline at a mock server and selector drift
/// can be patched without a release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the upstream site
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Number of posts requested per listing page
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Maximum concurrent detail fetches
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Name of the cookie that marks a signed-in session
    #[serde(default = "defaults::session_cookie")]
    pub session_cookie: String,

    /// Structural anchors for scraped pages
    #[serde(default)]
    pub selectors: SelectorConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return defaults if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(FeedError::config("user_agent is empty"));
        }
        if self.timeout_secs == 0 {
            return Err(FeedError::config("timeout_secs must be > 0"));
        }
        if self.page_size == 0 {
            return Err(FeedError::config("page_size must be > 0"));
        }
        if self.max_concurrent == 0 {
            return Err(FeedError::config("max_concurrent must be > 0"));
        }
        self.base()?;
        Ok(())
    }

    /// The parsed base URL.
    pub fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| FeedError::config(format!("invalid base_url '{}': {}", self.base_url, e)))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            page_size: defaults::page_size(),
            max_concurrent: defaults::max_concurrent(),
            session_cookie: defaults::session_cookie(),
            selectors: SelectorConfig::default(),
        }
    }
}

/// CSS selectors and attribute names the scraper anchors on.
///
/// The upstream markup is versioned only by observation; keeping the anchors
/// in configuration means a layout change is a config edit, not a code
/// change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Selector for one post fragment in a listing
    #[serde(default = "defaults::item")]
    pub item: String,

    /// Selector for the title element within a fragment
    #[serde(default = "defaults::title")]
    pub title: String,

    /// Selector for the video element within a fragment
    #[serde(default = "defaults::video")]
    pub video: String,

    /// Selector for encoded sources within a video element
    #[serde(default = "defaults::video_source")]
    pub video_source: String,

    /// Selector for the image element within a fragment
    #[serde(default = "defaults::image")]
    pub image: String,

    /// Selector for the not-safe-for-work marker
    #[serde(default = "defaults::nsfw_marker")]
    pub nsfw_marker: String,

    /// Selector for the vote-count element (fallback when the attribute is
    /// missing)
    #[serde(default = "defaults::vote_count")]
    pub vote_count: String,

    /// Selector for the comment-count element (fallback when the attribute
    /// is missing)
    #[serde(default = "defaults::comment_count")]
    pub comment_count: String,

    /// Selector for the load-more anchor carrying the continuation cursor
    #[serde(default = "defaults::load_more")]
    pub load_more: String,

    /// Selectors for the three primary section anchors
    #[serde(default = "defaults::hot_section")]
    pub hot_section: String,
    #[serde(default = "defaults::trending_section")]
    pub trending_section: String,
    #[serde(default = "defaults::fresh_section")]
    pub fresh_section: String,

    /// Selector for the secondary section menu entries
    #[serde(default = "defaults::menu_sections")]
    pub menu_sections: String,

    /// Selector for the full-size image on a post's own page
    #[serde(default = "defaults::detail_image")]
    pub detail_image: String,

    /// Attribute carrying the post ID
    #[serde(default = "defaults::id_attr")]
    pub id_attr: String,

    /// Attribute carrying the vote count
    #[serde(default = "defaults::votes_attr")]
    pub votes_attr: String,

    /// Attribute carrying the comment count
    #[serde(default = "defaults::comments_attr")]
    pub comments_attr: String,

    /// Attribute carrying the creation timestamp (unix seconds)
    #[serde(default = "defaults::created_attr")]
    pub created_attr: String,

    /// Substring of an image URL that marks a long-form post
    #[serde(default = "defaults::long_post_marker")]
    pub long_post_marker: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            item: defaults::item(),
            title: defaults::title(),
            video: defaults::video(),
            video_source: defaults::video_source(),
            image: defaults::image(),
            nsfw_marker: defaults::nsfw_marker(),
            vote_count: defaults::vote_count(),
            comment_count: defaults::comment_count(),
            load_more: defaults::load_more(),
            hot_section: defaults::hot_section(),
            trending_section: defaults::trending_section(),
            fresh_section: defaults::fresh_section(),
            menu_sections: defaults::menu_sections(),
            detail_image: defaults::detail_image(),
            id_attr: defaults::id_attr(),
            votes_attr: defaults::votes_attr(),
            comments_attr: defaults::comments_attr(),
            created_attr: defaults::created_attr(),
            long_post_marker: defaults::long_post_marker(),
        }
    }
}

mod defaults {
    // Client defaults
    pub fn base_url() -> String {
        "https://9gag.com".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; gagfeed/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn page_size() -> u32 {
        10
    }
    pub fn max_concurrent() -> usize {
        5
    }
    pub fn session_cookie() -> String {
        "sid".into()
    }

    // Selector defaults
    pub fn item() -> String {
        "article".into()
    }
    pub fn title() -> String {
        "header".into()
    }
    pub fn video() -> String {
        "video".into()
    }
    pub fn video_source() -> String {
        "source".into()
    }
    pub fn image() -> String {
        "img".into()
    }
    pub fn nsfw_marker() -> String {
        ".nsfw-post".into()
    }
    pub fn vote_count() -> String {
        ".badge-item-love-count".into()
    }
    pub fn comment_count() -> String {
        ".comment".into()
    }
    pub fn load_more() -> String {
        "a.badge-load-more-post".into()
    }
    pub fn hot_section() -> String {
        "a.hot".into()
    }
    pub fn trending_section() -> String {
        "a.trending".into()
    }
    pub fn fresh_section() -> String {
        "a.fresh".into()
    }
    pub fn menu_sections() -> String {
        "li.badge-section-menu-items > a".into()
    }
    pub fn detail_image() -> String {
        "article img".into()
    }

    // Attribute defaults
    pub fn id_attr() -> String {
        "data-entry-id".into()
    }
    pub fn votes_attr() -> String {
        "data-entry-votes".into()
    }
    pub fn comments_attr() -> String {
        "data-entry-comments".into()
    }
    pub fn created_attr() -> String {
        "data-entry-ts".into()
    }
    pub fn long_post_marker() -> String {
        "long-post".into()
    }
}
