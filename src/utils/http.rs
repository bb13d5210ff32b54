// src/utils/http.rs

//! HTTP client utilities.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use reqwest::cookie::Jar;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{FeedError, Result};
use crate::models::Config;

/// Create the shared HTTP client together with its session cookie jar.
///
/// The jar is handed back separately so the caller can inspect session
/// cookies; it lives exactly as long as the client that owns it.
pub fn create_client(config: &Config) -> Result<(Client, Arc<Jar>)> {
    let jar = Arc::new(Jar::default());
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .cookie_provider(Arc::clone(&jar))
        .build()
        .map_err(|e| FeedError::transport("client-setup", e))?;
    Ok((client, jar))
}

/// Fetch a URL and return its body text.
///
/// Fails on connection errors, timeouts, and non-success status codes. No
/// retries; retry policy belongs to the caller.
pub async fn fetch_text(
    client: &Client,
    url: Url,
    stage: &'static str,
    cancel: &CancellationToken,
) -> Result<String> {
    let request = async {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::transport(stage, e))?
            .error_for_status()
            .map_err(|e| FeedError::transport(stage, e))?;
        response
            .text()
            .await
            .map_err(|e| FeedError::transport(stage, e))
    };

    tokio::select! {
        result = request => result,
        _ = cancel.cancelled() => Err(FeedError::Cancelled),
    }
}

/// POST a form and return the body text. Same failure semantics as
/// [`fetch_text`].
pub async fn post_form(
    client: &Client,
    url: Url,
    form: &[(&str, &str)],
    stage: &'static str,
    cancel: &CancellationToken,
) -> Result<String> {
    let request = async {
        let response = client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| FeedError::transport(stage, e))?
            .error_for_status()
            .map_err(|e| FeedError::transport(stage, e))?;
        response
            .text()
            .await
            .map_err(|e| FeedError::transport(stage, e))
    };

    tokio::select! {
        result = request => result,
        _ = cancel.cancelled() => Err(FeedError::Cancelled),
    }
}
