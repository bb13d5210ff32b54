//! Service layer for the feed client.
//!
//! This module contains the pipeline stages:
//! - Section resolution (`SectionResolver`)
//! - Post classification (`ItemClassifier`)
//! - Page assembly and detail enrichment (`PageAssembler`)
//! - The JSON feed variant (`ApiFeed`)

mod api;
mod feed;
mod posts;
mod sections;

pub use api::{ApiFeed, ApiPage, ApiPost, ApiPostKind, FeedKind};
pub use feed::{EnrichOutcome, PageAssembler};
pub use posts::ItemClassifier;
pub use sections::SectionResolver;
