mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

/// Sends a GET with the given query pairs and decodes the JSON body.
///
/// # Errors
///
/// Fails on transport errors, non-success status codes, and bodies that do not decode into `T`.
pub async fn fetch_json<C: HttpClient, T: DeserializeOwned>(
    client: &C,
    url: &str,
    query: &[(&str, String)],
) -> Result<T> {
    let mut url: reqwest::Url = url.parse().with_context(|| format!("invalid URL '{url}'"))?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in query {
            pairs.append_pair(name, value);
        }
    }

    let req = reqwest::Request::new(reqwest::Method::GET, url);
    let resp = client.execute(req).await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow::anyhow!("API returned status {}: {}", status, body));
    }

    resp.json()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to parse response: {}", e))
}
