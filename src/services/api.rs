//! JSON API feed service.
//!
//! Alongside the scraped listings, the upstream site serves its feeds from a
//! JSON endpoint with an opaque `after` cursor. Entries map declaratively
//! onto typed posts; fields the API leaves empty become `None` rather than
//! empty strings.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::document;
use crate::error::Result;
use crate::models::Config;
use crate::utils::{de, http};

const STAGE: &str = "api-posts";

/// Which feed of a group to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Hot,
    Trending,
    Fresh,
}

impl FeedKind {
    /// Path segment the endpoint expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Trending => "trending",
            Self::Fresh => "fresh",
        }
    }
}

/// Post shape declared by the JSON endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPost {
    pub id: String,

    /// Canonical URL of the post
    pub url: String,

    pub title: String,

    #[serde(default, deserialize_with = "de::empty_string_as_none")]
    pub description: Option<String>,

    #[serde(
        default,
        rename = "creationTs",
        deserialize_with = "de::unix_timestamp_as_datetime"
    )]
    pub created: Option<DateTime<Utc>>,

    /// Declared content kind; unrecognized values map to `Unknown`
    #[serde(default, rename = "type")]
    pub kind: ApiPostKind,
}

/// Content kind tags the JSON endpoint declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum ApiPostKind {
    Photo,
    Animated,
    #[serde(other)]
    #[default]
    Unknown,
}

/// One batch from the JSON endpoint.
#[derive(Debug, Clone)]
pub struct ApiPage {
    pub posts: Vec<ApiPost>,

    /// Opaque continuation token; pass back verbatim as `after`
    pub next: Option<String>,
}

/// Service for the JSON feed endpoint.
pub struct ApiFeed {
    client: Client,
    base: Url,
    page_size: u32,
}

impl ApiFeed {
    /// Create a new API feed sharing the client's HTTP session.
    pub fn new(client: Client, config: &Config) -> Result<Self> {
        Ok(Self {
            client,
            base: config.base()?,
            page_size: config.page_size,
        })
    }

    /// Fetch one batch of a group's feed.
    ///
    /// `after` is the opaque token from a previous batch; `None` starts at
    /// the top.
    pub async fn posts(
        &self,
        group: &str,
        kind: FeedKind,
        after: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ApiPage> {
        let mut url = self
            .base
            .join(&format!("v1/group-posts/group/{group}/type/{}", kind.as_str()))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("c", &self.page_size.to_string());
            if let Some(after) = after {
                query.append_pair("after", after);
            }
        }

        let body = http::fetch_text(&self.client, url, STAGE, cancel).await?;
        let value = document::parse_json(&body, STAGE)?;
        let entries = document::json_path(&value, "/data/posts", STAGE)?;

        let posts = match entries {
            Value::Array(items) => items
                .iter()
                .filter_map(|entry| match serde_json::from_value(entry.clone()) {
                    Ok(post) => Some(post),
                    Err(error) => {
                        log::warn!("skipping malformed post entry: {error}");
                        None
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        let next = value
            .pointer("/data/nextCursor")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        Ok(ApiPage { posts, next })
    }
}
