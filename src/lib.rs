// src/lib.rs

//! Typed access to 9GAG content feeds.
//!
//! The upstream markup is unstable and versioned only by observation. This
//! crate resolves the available sections, fetches paginated listings,
//! classifies every post into a typed content variant, and follows the
//! continuation cursor, recovering per item wherever the layout drifts.

pub mod client;
pub mod document;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use client::GagClient;
pub use error::{FeedError, Result};
