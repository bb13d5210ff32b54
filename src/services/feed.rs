//! Feed page assembly.
//!
//! Drives one listing fetch: resolves the request URL (first page or
//! continuation), classifies every item fragment, extracts the continuation
//! cursor from the load-more anchor, and fans out per-post detail fetches.

use futures::stream::{self, StreamExt};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::document;
use crate::error::{DetailFailure, FeedError, PartialFailure, Result};
use crate::models::{
    Config, ContentItem, ContentVariant, MediaKind, Page, PageCursor, Post, PostDetails, Section,
};
use crate::services::ItemClassifier;
use crate::utils::{http, resolve_url};

/// Summary of a detail-enrichment pass.
///
/// Failures are collected here instead of aborting the batch; posts not
/// listed in `failures` were either enriched or had nothing to fetch.
#[derive(Debug, Default)]
pub struct EnrichOutcome {
    /// Number of posts that had a detail parser and were fetched
    pub attempted: usize,

    /// Per-post failures
    pub failures: Vec<DetailFailure>,
}

impl EnrichOutcome {
    /// Convert collected failures into an error for callers that want one.
    pub fn into_result(self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(FeedError::Partial(PartialFailure {
                attempted: self.attempted,
                failures: self.failures,
            }))
        }
    }
}

/// Everything a detail parse function gets to work with.
struct DetailContext {
    base: Url,
    image: Selector,
}

/// Detail parse function for one content variant.
type DetailParser = fn(&Html, &DetailContext) -> Result<PostDetails>;

/// Capability table: which variants have a detail page worth parsing.
/// Variants without an entry are skipped by enrichment.
fn detail_parser(variant: &ContentVariant) -> Option<DetailParser> {
    match variant {
        ContentVariant::Photo { .. } => Some(parse_photo_details),
        ContentVariant::Animated { .. } => None,
        ContentVariant::Restricted => None,
        ContentVariant::Unknown => None,
    }
}

/// The post page serves the image in its full resolution; listing pages
/// carry a downscaled rendition.
fn parse_photo_details(document: &Html, ctx: &DetailContext) -> Result<PostDetails> {
    let image = document::require_first(
        document.root_element(),
        &ctx.image,
        "post-details",
        "full-size image",
    )?;
    let src = document::require_attr(image, "src", "post-details")?;
    let url = resolve_url(&ctx.base, src)?;

    Ok(PostDetails {
        content: vec![ContentItem {
            url,
            kind: MediaKind::Jpeg,
        }],
    })
}

/// Service that assembles listing pages and enriches their posts.
pub struct PageAssembler {
    client: Client,
    base: Url,
    page_size: u32,
    max_concurrent: usize,
    classifier: ItemClassifier,
    load_more: Selector,
    cursor_query: Regex,
    detail: DetailContext,
}

impl PageAssembler {
    /// Create a new assembler sharing the client's HTTP session.
    pub fn new(client: Client, config: &Config) -> Result<Self> {
        let base = config.base()?;
        Ok(Self {
            client,
            base: base.clone(),
            page_size: config.page_size,
            max_concurrent: config.max_concurrent.max(1),
            classifier: ItemClassifier::new(config)?,
            load_more: document::selector(&config.selectors.load_more)?,
            cursor_query: Regex::new(r"^/[^/]*/?\?id=(?P<id>[^&]+)&c=(?P<count>[0-9]+)$")
                .map_err(|e| FeedError::config(format!("cursor pattern: {e}")))?,
            detail: DetailContext {
                base,
                image: document::selector(&config.selectors.detail_image)?,
            },
        })
    }

    /// Fetch one listing page of a section.
    ///
    /// `cursor` must come from a page previously returned for the same
    /// section; `None` requests the first page.
    pub async fn get_page(
        &self,
        section: &Section,
        cursor: Option<&PageCursor>,
        cancel: &CancellationToken,
    ) -> Result<Page> {
        let target = self.request_url(section, cursor);
        let body = http::fetch_text(&self.client, target, "feed-page", cancel).await?;
        let listing = document::parse_html(&body);

        let mut posts = Vec::new();
        for fragment in listing.root_element().select(self.classifier.item_selector()) {
            match self.classifier.classify(fragment) {
                Ok(post) => posts.push(post),
                // One undecipherable fragment must not cost the batch.
                Err(error) => log::warn!("skipping unclassifiable item: {error}"),
            }
        }

        let next = self.next_cursor(&listing)?;

        Ok(Page {
            current: cursor.cloned(),
            next,
            posts,
        })
    }

    /// Enrich posts in place with their detail-page data, one concurrent
    /// fetch per post that has a registered detail parser.
    ///
    /// A failing fetch is recorded and the rest of the batch still
    /// completes; cancellation propagates into every in-flight fetch.
    pub async fn enrich(&self, posts: &mut [Post], cancel: &CancellationToken) -> EnrichOutcome {
        let jobs: Vec<(usize, Url)> = posts
            .iter()
            .enumerate()
            .filter(|(_, post)| detail_parser(&post.variant).is_some())
            .filter_map(|(index, post)| {
                let Some(id) = post.id.as_deref() else {
                    log::debug!("post without ID cannot be enriched; skipping");
                    return None;
                };
                match self.base.join(&format!("gag/{id}")) {
                    Ok(url) => Some((index, url)),
                    Err(error) => {
                        log::debug!("post '{id}' has no valid detail URL: {error}");
                        None
                    }
                }
            })
            .collect();

        let mut outcome = EnrichOutcome {
            attempted: jobs.len(),
            ..EnrichOutcome::default()
        };

        let mut fetches = stream::iter(jobs)
            .map(|(index, url)| {
                let client = &self.client;
                async move {
                    let result = http::fetch_text(client, url, "post-details", cancel).await;
                    (index, result)
                }
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((index, result)) = fetches.next().await {
            let parsed = result.and_then(|body| {
                let page = document::parse_html(&body);
                match detail_parser(&posts[index].variant) {
                    Some(parser) => parser(&page, &self.detail),
                    None => Ok(PostDetails::default()),
                }
            });

            match parsed {
                Ok(details) => posts[index].details = Some(details),
                Err(error) => {
                    log::warn!(
                        "detail fetch failed for post {:?}: {error}",
                        posts[index].id
                    );
                    outcome.failures.push(DetailFailure {
                        post_id: posts[index].id.clone(),
                        error,
                    });
                }
            }
        }

        outcome
    }

    /// First page requests the section URL itself; continuation pages append
    /// the cursor query.
    fn request_url(&self, section: &Section, cursor: Option<&PageCursor>) -> Url {
        match cursor {
            None => section.url.clone(),
            Some(cursor) => {
                let mut url = section.url.clone();
                url.set_query(Some(&cursor.to_query()));
                url
            }
        }
    }

    /// Parse the load-more anchor into the continuation cursor. A missing
    /// anchor is the end of the feed, not an error; a present anchor whose
    /// href no longer matches the known query shape is drift.
    fn next_cursor(&self, listing: &Html) -> Result<Option<PageCursor>> {
        let Some(anchor) = document::first(listing.root_element(), &self.load_more) else {
            return Ok(None);
        };

        let href = document::require_attr(anchor, "href", "pagination")?.trim();
        let captures = self.cursor_query.captures(href).ok_or_else(|| {
            FeedError::drift("pagination", format!("unrecognized load-more href '{href}'"))
        })?;

        let id = captures["id"].to_string();
        let count = captures["count"].parse().unwrap_or(self.page_size);

        Ok(Some(PageCursor { id, count }))
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;
    use crate::models::SectionKind;

    fn setup(server: &MockServer) -> (PageAssembler, Section) {
        let mut config = Config::default();
        config.base_url = server.base_url();

        let (client, _jar) = http::create_client(&config).unwrap();
        let assembler = PageAssembler::new(client, &config).unwrap();
        let section = Section {
            name: "Hot".into(),
            description: String::new(),
            kind: SectionKind::Hot,
            url: Url::parse(&server.url("/hot")).unwrap(),
            icon_url: None,
            region: String::new(),
            upload_enabled: false,
            sensitive: false,
        };
        (assembler, section)
    }

    const LISTING: &str = r#"
        <html><body>
            <article data-entry-id="v1" data-entry-votes="300" data-entry-comments="12">
                <header>A video</header>
                <video poster="/thumbs/v1.jpg">
                    <source src="/video/v1.mp4" type="video/mp4">
                    <source src="/video/v1.webm" type="video/webm">
                </video>
            </article>
            <article data-entry-id="i1">
                <header>A tall picture</header>
                <img src="/photo/i1-long-post.jpg">
            </article>
            <article data-entry-id="n1">
                <header>Hidden</header>
                <div class="nsfw-post"></div>
            </article>
            <a class="badge-load-more-post" href="/hot/?id=abc123&c=10">Load more</a>
        </body></html>
    "#;

    #[tokio::test]
    async fn first_page_classifies_and_extracts_cursor() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/hot");
            then.status(200).body(LISTING);
        });

        let (assembler, section) = setup(&server);
        let page = assembler
            .get_page(&section, None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(page.posts.len(), 3);
        assert!(page.current.is_none());

        let ContentVariant::Animated { sources, .. } = &page.posts[0].variant else {
            panic!("expected animated first post");
        };
        assert!(sources.iter().any(|s| s.kind == MediaKind::Mp4));

        let ContentVariant::Photo { long_post, .. } = &page.posts[1].variant else {
            panic!("expected photo second post");
        };
        assert!(long_post);

        assert_eq!(page.posts[2].variant, ContentVariant::Restricted);

        assert_eq!(
            page.next,
            Some(PageCursor {
                id: "abc123".into(),
                count: 10,
            })
        );
    }

    #[tokio::test]
    async fn continuation_appends_cursor_query() {
        let server = MockServer::start();
        let continuation = server.mock(|when, then| {
            when.method(GET)
                .path("/hot")
                .query_param("id", "abc123")
                .query_param("c", "10");
            then.status(200)
                .body("<html><body><article data-entry-id='x'></article></body></html>");
        });

        let (assembler, section) = setup(&server);
        let cursor = PageCursor {
            id: "abc123".into(),
            count: 10,
        };
        let page = assembler
            .get_page(&section, Some(&cursor), &CancellationToken::new())
            .await
            .unwrap();

        continuation.assert();
        assert_eq!(page.current, Some(cursor));
        // No load-more anchor: the feed ends here.
        assert!(page.next.is_none());
        assert_eq!(page.posts.len(), 1);
        assert_eq!(page.posts[0].variant, ContentVariant::Unknown);
    }

    #[tokio::test]
    async fn unparseable_load_more_href_is_drift() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/hot");
            then.status(200).body(
                "<html><body><a class='badge-load-more-post' href='/hot/?offset=3'>more</a></body></html>",
            );
        });

        let (assembler, section) = setup(&server);
        let error = assembler
            .get_page(&section, None, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(error, FeedError::Drift { stage: "pagination", .. }));
    }

    #[tokio::test]
    async fn transport_failure_carries_stage() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/hot");
            then.status(500);
        });

        let (assembler, section) = setup(&server);
        let error = assembler
            .get_page(&section, None, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            error,
            FeedError::Transport { stage: "feed-page", .. }
        ));
    }

    fn photo_post(id: &str, server: &MockServer) -> Post {
        Post {
            id: Some(id.into()),
            title: format!("photo {id}"),
            upvotes: 0,
            comments: 0,
            nsfw: false,
            created: None,
            variant: ContentVariant::Photo {
                url: Url::parse(&server.url(format!("/photo/{id}.jpg"))).unwrap(),
                long_post: false,
            },
            details: None,
        }
    }

    #[tokio::test]
    async fn enrich_collects_partial_failures() {
        let server = MockServer::start();
        for id in ["a", "b"] {
            server.mock(|when, then| {
                when.method(GET).path(format!("/gag/{id}"));
                then.status(200).body(format!(
                    "<html><body><article><img src='/full/{id}.jpg'></article></body></html>"
                ));
            });
        }
        server.mock(|when, then| {
            when.method(GET).path("/gag/c");
            then.status(502);
        });

        let (assembler, _) = setup(&server);
        let mut posts = vec![
            photo_post("a", &server),
            photo_post("b", &server),
            photo_post("c", &server),
        ];

        let outcome = assembler.enrich(&mut posts, &CancellationToken::new()).await;

        assert_eq!(outcome.attempted, 3);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].post_id.as_deref(), Some("c"));

        // The two healthy posts were still enriched.
        let full = posts[0].details.as_ref().unwrap();
        assert_eq!(full.content[0].kind, MediaKind::Jpeg);
        assert!(full.content[0].url.as_str().ends_with("/full/a.jpg"));
        assert!(posts[1].details.is_some());
        assert!(posts[2].details.is_none());

        // And the outcome converts into a partial-failure error on demand.
        let error = assembler
            .enrich(&mut posts.clone(), &CancellationToken::new())
            .await
            .into_result()
            .unwrap_err();
        assert!(matches!(error, FeedError::Partial(_)));
    }

    #[tokio::test]
    async fn enrich_skips_variants_without_parser() {
        let server = MockServer::start();
        let (assembler, _) = setup(&server);

        let mut posts = vec![Post {
            id: Some("r1".into()),
            title: "hidden".into(),
            upvotes: 0,
            comments: 0,
            nsfw: true,
            created: None,
            variant: ContentVariant::Restricted,
            details: None,
        }];

        let outcome = assembler.enrich(&mut posts, &CancellationToken::new()).await;
        assert_eq!(outcome.attempted, 0);
        assert!(outcome.failures.is_empty());
        assert!(posts[0].details.is_none());
    }

    #[tokio::test]
    async fn enrich_cancellation_reaches_every_fetch() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_contains("/gag/");
            then.status(200)
                .body("<html><body><article><img src='/x.jpg'></article></body></html>")
                .delay(std::time::Duration::from_secs(5));
        });

        let (assembler, _) = setup(&server);
        let mut posts = vec![photo_post("a", &server), photo_post("b", &server)];

        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = assembler.enrich(&mut posts, &cancel).await;
        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome
            .failures
            .iter()
            .all(|failure| matches!(failure.error, FeedError::Cancelled)));
    }
}
