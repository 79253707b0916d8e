use anyhow::Result;
use reqwest::blocking::Client;
use reqwest::{header, redirect::Policy};
use std::time::Duration;
use url::Url;

/// Redirects followed per fetch before giving up.
pub const DEFAULT_REDIRECTS: usize = 3;

/// Builds the blocking client shared by all fetch tasks. Redirects beyond
/// the cap make the request fail, which a crawl task treats like any other
/// fetch failure.
pub fn client(user_agent: &str, max_redirects: usize, timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .user_agent(user_agent.to_string())
        .redirect(Policy::limited(max_redirects))
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Fetches a page, following up to the client's redirect cap. Returns the
/// body only for a successful response whose Content-Type is text/html;
/// network errors, non-2xx statuses, exhausted redirects, and non-HTML
/// content all come back as None.
pub fn fetch(client: &Client, url: &Url) -> Option<String> {
    let response = match client.get(url.clone()).send() {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(%url, %err, "fetch failed");
            return None;
        }
    };
    if !response.status().is_success() {
        tracing::debug!(%url, status = %response.status(), "skipping non-success response");
        return None;
    }
    let html = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_ascii_lowercase().starts_with("text/html"))
        .unwrap_or(false);
    if !html {
        tracing::debug!(%url, "skipping non-html content");
        return None;
    }
    response.text().ok()
}
