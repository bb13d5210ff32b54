//! Post data structures and classification results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Kind tag for a single media reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Unknown,
    Mp4,
    WebM,
    Jpeg,
}

impl MediaKind {
    /// Map a declared MIME type to a media kind. `video/mp4` is always
    /// `Mp4`; any other video type is treated as WebM.
    pub fn from_mime(mime: &str) -> Self {
        let mime = mime.trim().to_ascii_lowercase();
        match mime.as_str() {
            "video/mp4" => Self::Mp4,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            m if m.starts_with("video/") => Self::WebM,
            _ => Self::Unknown,
        }
    }
}

/// A single media reference extracted from a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Absolute URL of the media
    pub url: Url,

    /// Kind tag, consistent with the source attribute that produced it
    pub kind: MediaKind,
}

/// The classified media shape of a post. Set exactly once at classification
/// time and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentVariant {
    /// A still image
    Photo {
        url: Url,
        /// Image URL carries the long-form marker
        long_post: bool,
    },

    /// A video with one or more encoded sources
    Animated {
        sources: Vec<ContentItem>,
        thumbnail: Option<Url>,
    },

    /// Content withheld from anonymous views; no media URLs are available
    Restricted,

    /// No recognizable media element
    Unknown,
}

/// One piece of content within a section feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Upstream item ID (absent for minimal fragments)
    pub id: Option<String>,

    /// Title, trimmed
    pub title: String,

    /// Number of upvotes (0 when the fragment carries no usable count)
    pub upvotes: u32,

    /// Number of comments (0 when the fragment carries no usable count)
    pub comments: u32,

    /// Not-safe-for-work marker on the fragment. Independent of the
    /// `Restricted` variant, which records that the media itself was
    /// withheld.
    pub nsfw: bool,

    /// Creation time, when the fragment exposes one
    pub created: Option<DateTime<Utc>>,

    /// Classified media shape
    pub variant: ContentVariant,

    /// Filled only by detail enrichment, never at classification time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<PostDetails>,
}

/// Full-resolution media discovered on a post's own page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostDetails {
    pub content: Vec<ContentItem>,
}
