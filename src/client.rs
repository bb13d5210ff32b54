// src/client.rs

//! Public client facade.
//!
//! Owns the HTTP session (client + cookie jar) for its whole lifetime and
//! wires the resolver, classifier, and assembler together. The session is
//! acquired once at construction and released when the client drops; no
//! state is shared across client instances.

use std::sync::Arc;

use reqwest::Client;
use reqwest::cookie::{CookieStore, Jar};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{FeedError, Result};
use crate::models::{Config, Page, Post, Section, SectionCatalog};
use crate::services::{ApiFeed, ApiPage, EnrichOutcome, FeedKind, PageAssembler, SectionResolver};
use crate::utils::http;

/// Client for the upstream content site.
///
/// A single instance is meant to serve one logical session; issuing two
/// requests through it concurrently requires external synchronization of
/// the session state by the caller.
pub struct GagClient {
    config: Config,
    base: Url,
    client: Client,
    jar: Arc<Jar>,
    resolver: SectionResolver,
    assembler: PageAssembler,
    api: ApiFeed,
}

impl GagClient {
    /// Create a client with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let base = config.base()?;
        let (client, jar) = http::create_client(&config)?;
        let resolver = SectionResolver::new(&config)?;
        let assembler = PageAssembler::new(client.clone(), &config)?;
        let api = ApiFeed::new(client.clone(), &config)?;

        Ok(Self {
            config,
            base,
            client,
            jar,
            resolver,
            assembler,
            api,
        })
    }

    /// Create a client with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(Config::default())
    }

    /// Resolve the full section catalog from the index page.
    pub async fn section_catalog(&self) -> Result<SectionCatalog> {
        self.section_catalog_with_cancel(&CancellationToken::new())
            .await
    }

    /// Resolve the section catalog, cancellable.
    pub async fn section_catalog_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<SectionCatalog> {
        let index = http::fetch_text(&self.client, self.base.clone(), "sections", cancel).await?;
        self.resolver.resolve(&index)
    }

    /// List the primary sections.
    pub async fn sections(&self) -> Result<Vec<Section>> {
        Ok(self.section_catalog().await?.sections)
    }

    /// Fetch the first page of a section's feed.
    pub async fn front_page(&self, section: &Section) -> Result<Page> {
        self.front_page_with_cancel(section, &CancellationToken::new())
            .await
    }

    /// Fetch the first page, cancellable.
    pub async fn front_page_with_cancel(
        &self,
        section: &Section,
        cancel: &CancellationToken,
    ) -> Result<Page> {
        self.assembler.get_page(section, None, cancel).await
    }

    /// Fetch the page after `page` for the same section.
    ///
    /// Fails with a precondition error when `page` has no continuation
    /// cursor; an exhausted feed is a caller-visible state, not a transport
    /// problem.
    pub async fn next_page(&self, section: &Section, page: &Page) -> Result<Page> {
        self.next_page_with_cancel(section, page, &CancellationToken::new())
            .await
    }

    /// Fetch the next page, cancellable.
    pub async fn next_page_with_cancel(
        &self,
        section: &Section,
        page: &Page,
        cancel: &CancellationToken,
    ) -> Result<Page> {
        let cursor = page.next.as_ref().ok_or_else(|| {
            FeedError::precondition("page has no continuation cursor; the feed is exhausted")
        })?;
        self.assembler.get_page(section, Some(cursor), cancel).await
    }

    /// Enrich posts in place with their detail-page data.
    pub async fn enrich(&self, posts: &mut [Post]) -> EnrichOutcome {
        self.enrich_with_cancel(posts, &CancellationToken::new())
            .await
    }

    /// Enrich posts, cancellable.
    pub async fn enrich_with_cancel(
        &self,
        posts: &mut [Post],
        cancel: &CancellationToken,
    ) -> EnrichOutcome {
        self.assembler.enrich(posts, cancel).await
    }

    /// Fetch one batch of a group's feed from the JSON endpoint.
    pub async fn api_posts(
        &self,
        group: &str,
        kind: FeedKind,
        after: Option<&str>,
    ) -> Result<ApiPage> {
        self.api
            .posts(group, kind, after, &CancellationToken::new())
            .await
    }

    /// Cast a single upvote for a post.
    pub async fn upvote(&self, post_id: &str) -> Result<()> {
        self.vote(post_id, "/vote/like", 1).await
    }

    /// Cast a single downvote for a post.
    pub async fn downvote(&self, post_id: &str) -> Result<()> {
        self.vote(post_id, "/vote/dislike", -1).await
    }

    async fn vote(&self, post_id: &str, path: &str, expected_score: i32) -> Result<()> {
        let url = self.base.join(path)?;
        let body = http::post_form(
            &self.client,
            url,
            &[("id", post_id)],
            "vote",
            &CancellationToken::new(),
        )
        .await?;

        let result: VotingResult = serde_json::from_str(&body)?;
        if result.my_score != expected_score {
            return Err(FeedError::Vote(format!(
                "upstream rejected the vote for post '{post_id}'; signing in may be required"
            )));
        }
        Ok(())
    }

    /// Whether the session cookie from a prior sign-in is present in the
    /// jar.
    pub fn is_authenticated(&self) -> bool {
        let Some(header) = self.jar.cookies(&self.base) else {
            return false;
        };
        let Ok(cookies) = header.to_str() else {
            return false;
        };
        cookies.split(';').any(|cookie| {
            cookie
                .trim()
                .split('=')
                .next()
                .is_some_and(|name| name == self.config.session_cookie)
        })
    }
}

/// Response shape of the voting endpoint.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct VotingResult {
    #[serde(default)]
    id: String,

    #[serde(default)]
    msg: String,

    /// 1 after a successful upvote, -1 after a downvote
    #[serde(default, rename = "myScore")]
    my_score: i32,
}
