//! Post classification service.
//!
//! Turns one listing fragment into a typed [`Post`], deciding its content
//! variant and extracting the fields every variant shares. Cosmetic problems
//! (missing counts, missing title) degrade to defaults; only a fragment
//! without the item container itself counts as structure drift.

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Selector};
use url::Url;

use crate::document;
use crate::error::{FeedError, Result};
use crate::models::{Config, ContentItem, ContentVariant, MediaKind, Post};
use crate::utils::{parse_count, resolve_url};

const STAGE: &str = "post";

/// Service for classifying listing fragments into typed posts.
pub struct ItemClassifier {
    base: Url,
    item: Selector,
    title: Selector,
    video: Selector,
    video_source: Selector,
    image: Selector,
    nsfw_marker: Selector,
    vote_count: Selector,
    comment_count: Selector,
    id_attr: String,
    votes_attr: String,
    comments_attr: String,
    created_attr: String,
    long_post_marker: String,
}

impl ItemClassifier {
    /// Create a new classifier from the client configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let selectors = &config.selectors;
        Ok(Self {
            base: config.base()?,
            item: document::selector(&selectors.item)?,
            title: document::selector(&selectors.title)?,
            video: document::selector(&selectors.video)?,
            video_source: document::selector(&selectors.video_source)?,
            image: document::selector(&selectors.image)?,
            nsfw_marker: document::selector(&selectors.nsfw_marker)?,
            vote_count: document::selector(&selectors.vote_count)?,
            comment_count: document::selector(&selectors.comment_count)?,
            id_attr: selectors.id_attr.clone(),
            votes_attr: selectors.votes_attr.clone(),
            comments_attr: selectors.comments_attr.clone(),
            created_attr: selectors.created_attr.clone(),
            long_post_marker: selectors.long_post_marker.to_lowercase(),
        })
    }

    /// Selector for the item fragments within a listing document.
    pub fn item_selector(&self) -> &Selector {
        &self.item
    }

    /// Classify one fragment into a typed post.
    ///
    /// The variant is decided exactly once here and never revisited.
    pub fn classify(&self, fragment: ElementRef<'_>) -> Result<Post> {
        let item = self.require_item(fragment)?;

        let variant = self.classify_variant(item);

        let id = item
            .value()
            .attr(&self.id_attr)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let title = document::first(item, &self.title)
            .map(document::text_of)
            .unwrap_or_default();
        // The marker is a property of the post itself, independent of
        // whether the media body was withheld (the Restricted variant).
        let nsfw = document::first(item, &self.nsfw_marker).is_some();
        let upvotes = self.count_of(item, &self.votes_attr, &self.vote_count);
        let comments = self.count_of(item, &self.comments_attr, &self.comment_count);
        let created = self.created_of(item);

        Ok(Post {
            id,
            title,
            upvotes,
            comments,
            nsfw,
            created,
            variant,
            details: None,
        })
    }

    /// The fragment itself, or its item container when the caller handed in
    /// a wrapper node. Neither matching is drift.
    fn require_item<'a>(&self, fragment: ElementRef<'a>) -> Result<ElementRef<'a>> {
        if self.item.matches(&fragment) {
            return Ok(fragment);
        }
        document::first(fragment, &self.item)
            .ok_or_else(|| FeedError::drift(STAGE, "missing item container"))
    }

    /// First match wins: video, then image, then the withheld-content
    /// marker, then unknown.
    fn classify_variant(&self, item: ElementRef<'_>) -> ContentVariant {
        if let Some(video) = document::first(item, &self.video) {
            return self.animated_variant(video);
        }
        if let Some(image) = document::first(item, &self.image) {
            return self.photo_variant(image);
        }
        if document::first(item, &self.nsfw_marker).is_some() {
            return ContentVariant::Restricted;
        }
        ContentVariant::Unknown
    }

    fn animated_variant(&self, video: ElementRef<'_>) -> ContentVariant {
        let mut sources = Vec::new();
        for source in video.select(&self.video_source) {
            let Some(src) = source.value().attr("src") else {
                log::debug!("video source without src attribute; skipping");
                continue;
            };
            let Ok(url) = resolve_url(&self.base, src) else {
                log::debug!("video source with unresolvable src '{src}'; skipping");
                continue;
            };
            // Undeclared types under a video element are still video-like.
            let kind = source
                .value()
                .attr("type")
                .map(MediaKind::from_mime)
                .unwrap_or(MediaKind::WebM);
            sources.push(ContentItem { url, kind });
        }

        let thumbnail = video
            .value()
            .attr("poster")
            .and_then(|poster| resolve_url(&self.base, poster).ok());

        ContentVariant::Animated { sources, thumbnail }
    }

    fn photo_variant(&self, image: ElementRef<'_>) -> ContentVariant {
        let Some(src) = image.value().attr("src") else {
            log::debug!("image without src attribute");
            return ContentVariant::Unknown;
        };
        let Ok(url) = resolve_url(&self.base, src) else {
            log::debug!("image with unresolvable src '{src}'");
            return ContentVariant::Unknown;
        };

        let long_post = src.to_lowercase().contains(&self.long_post_marker);
        ContentVariant::Photo { url, long_post }
    }

    /// Numeric count from an attribute, falling back to a marked element's
    /// text. Anything unusable defaults to zero.
    fn count_of(&self, item: ElementRef<'_>, attr: &str, fallback: &Selector) -> u32 {
        if let Some(value) = item.value().attr(attr) {
            return parse_count(value);
        }
        document::first(item, fallback)
            .map(|element| parse_count(&document::text_of(element)))
            .unwrap_or(0)
    }

    fn created_of(&self, item: ElementRef<'_>) -> Option<DateTime<Utc>> {
        item.value()
            .attr(&self.created_attr)
            .and_then(|ts| ts.trim().parse::<i64>().ok())
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
    }
}
