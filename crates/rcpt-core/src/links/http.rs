//! HTTP page fetcher.

use std::future::Future;
use std::time::Duration;

use url::Url;

use super::PageFetcher;
use crate::error::FetchError;
use crate::models::config::LinkConfig;

/// Fetches invoice pages over HTTPS with a bounded timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    /// Create a fetcher with the configured user agent and timeout.
    pub fn new(config: &LinkConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            max_bytes: config.max_page_bytes,
        })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<String, FetchError>> + Send {
        let checked = check_url(url).map(|url| self.client.get(url.clone()));
        let max_bytes = self.max_bytes;

        async move {
            let mut response = checked?.send().await.map_err(transport_error)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            if let Some(length) = response.content_length() {
                if length > max_bytes as u64 {
                    return Err(FetchError::TooLarge(max_bytes));
                }
            }

            let mut body = Vec::new();
            while let Some(chunk) = response.chunk().await.map_err(transport_error)? {
                append_capped(&mut body, &chunk, max_bytes)?;
            }

            Ok(String::from_utf8_lossy(&body).into_owned())
        }
    }
}

/// Only web links with a host are fetched.
fn check_url(url: &Url) -> Result<&Url, FetchError> {
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(FetchError::InvalidUrl(url.to_string())),
    }
}

/// Append `chunk` unless the body would grow past `limit` bytes.
fn append_capped(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<(), FetchError> {
    if body.len() + chunk.len() > limit {
        return Err(FetchError::TooLarge(limit));
    }
    body.extend_from_slice(chunk);
    Ok(())
}

fn transport_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(e.to_string())
    }
}
