//! Thin HTTP wrapper shared by every provider adapter (§4.2).
//!
//! Grounded on the reference implementation's `HttpClient`: validate the URL
//! scheme, wait on the caller-supplied rate limiter immediately before
//! sending, and convert every failure into a typed [`crate::error::Error`]
//! at this one boundary so adapters never see a raw `reqwest::Error`.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::rate_limiter::RateLimiter;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Wraps a [`reqwest::Client`] with the rate-limit-then-send discipline
/// every adapter call must follow. One instance per adapter, built with
/// that adapter's own [`RateLimiter`].
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl HttpClient {
    /// Build a client for one adapter with the given sustained
    /// requests-per-second rate.
    pub fn new(user_agent: &str, requests_per_second: f64) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .user_agent(user_agent.to_string())
            .build()
            .map_err(Error::from)?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(requests_per_second),
        })
    }

    fn validate_scheme(url: &str) -> Result<()> {
        if url.starts_with("http://") || url.starts_with("https://") {
            Ok(())
        } else {
            Err(Error::InvalidInput {
                field: "url".to_string(),
                reason: format!("unsupported scheme in {url}"),
            })
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder, url: &str) -> Result<Response> {
        Self::validate_scheme(url)?;
        self.rate_limiter.wait().await;

        let response = builder.send().await.map_err(|err| {
            if err.is_timeout() {
                Error::NetworkTimeout {
                    timeout: DEFAULT_TIMEOUT,
                    url: url.to_string(),
                }
            } else if err.is_connect() {
                Error::Connection {
                    url: url.to_string(),
                    reason: err.to_string(),
                }
            } else {
                Error::Http(err)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Protocol {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        Ok(response)
    }

    /// `GET url`, applying this adapter's rate limit first.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.send(self.client.get(url), url).await
    }

    /// `GET url` with extra query parameters appended before rate-limiting.
    pub async fn get_with_query(&self, url: &str, query: &[(&str, String)]) -> Result<Response> {
        let built = self.client.get(url).query(query);
        self.send(built, url).await
    }

    /// `GET url` with an extra header (e.g. a bearer token), applying this
    /// adapter's rate limit first.
    pub async fn get_with_header(&self, url: &str, header: (&str, &str)) -> Result<Response> {
        let built = self.client.get(url).header(header.0, header.1);
        self.send(built, url).await
    }

    /// `POST url` with an optional body, sent as JSON when `as_json` is
    /// true and as a raw string body otherwise. No current adapter needs
    /// this (every source here is read via `GET`), but the contract (§4.2)
    /// requires it.
    pub async fn post(&self, url: &str, body: Option<&str>, as_json: bool) -> Result<Response> {
        let mut builder = self.client.post(url);
        builder = match (body, as_json) {
            (Some(body), true) => builder.header("content-type", "application/json").body(body.to_string()),
            (Some(body), false) => builder.body(body.to_string()),
            (None, _) => builder,
        };
        self.send(builder, url).await
    }
}

/// Parse a successful response body as JSON, converting decode failures
/// into [`Error::Parse`].
pub async fn json<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
    let url = response.url().to_string();
    let bytes = response.bytes().await.map_err(Error::from)?;
    serde_json::from_slice(&bytes).map_err(|err| Error::Parse {
        context: context.to_string(),
        message: format!("{err} (from {url})"),
    })
}

/// Read a successful response body as text, for adapters that parse XML
/// themselves with `roxmltree` (which borrows from a `&str`).
pub async fn text(response: Response, context: &str) -> Result<String> {
    response.text().await.map_err(|err| Error::Parse {
        context: context.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_schemes() {
        let err = HttpClient::validate_scheme("ftp://example.com").unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[test]
    fn accepts_http_and_https() {
        assert!(HttpClient::validate_scheme("http://example.com").is_ok());
        assert!(HttpClient::validate_scheme("https://example.com").is_ok());
    }
}
