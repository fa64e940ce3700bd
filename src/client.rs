//! Blocking HTTP client for the Firefly III API.
//!
//! The report engine only ever talks to the API through [`FinanceApi`], so
//! tests can swap in an in-memory implementation.

use core::time::Duration;

use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret as _, SecretString};
use serde_json::Value;
use url::Url;

use crate::error::{ReportError, Result};
use crate::models::{About, Document};

/// Server information endpoint path.
const ABOUT_PATH: &str = "/api/v1/about";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of extra attempts for a failed GET.
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Base delay between attempts; multiplied by the attempt number.
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Read access to a JSON finance API.
pub trait FinanceApi: core::fmt::Debug {
    /// Issues an authenticated GET for `path` (relative to the API base
    /// URL) with the given query parameters and returns the parsed body.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Api`] for a non-success status,
    /// [`ReportError::Http`] on transport failure, and
    /// [`ReportError::Serialization`] when the body is not JSON.
    fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value>;
}

/// Builder for constructing a [`FireflyClient`].
#[derive(Debug)]
pub struct FireflyClientBuilder {
    /// Personal access token.
    token: Option<SecretString>,
    /// Firefly III base URL, e.g. `https://firefly.example.com`.
    base_url: Option<String>,
    /// Per-request timeout.
    timeout: Duration,
    /// Extra attempts for failed idempotent requests.
    max_retries: u32,
}

impl FireflyClientBuilder {
    /// Sets the personal access token.
    #[inline]
    #[must_use]
    pub fn token<T: Into<String>>(mut self, token: T) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Sets the server base URL.
    #[inline]
    #[must_use]
    pub fn base_url<T: Into<String>>(mut self, url: T) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the per-request timeout.
    #[inline]
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many times a failed GET is repeated before giving up.
    #[inline]
    #[must_use]
    pub const fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Configuration`] if the token or base URL is
    /// missing, [`ReportError::InvalidUrl`] if the base URL does not parse,
    /// and [`ReportError::Http`] if the HTTP client fails to build.
    #[inline]
    #[tracing::instrument(skip_all)]
    pub fn build(self) -> Result<FireflyClient> {
        let mut missing = Vec::new();
        if self.token.is_none() {
            missing.push("access token".to_owned());
        }
        if self.base_url.is_none() {
            missing.push("base URL".to_owned());
        }
        let (Some(token), Some(raw_url)) = (self.token, self.base_url) else {
            return Err(ReportError::Configuration(missing));
        };
        let base_url = raw_url.trim_end_matches('/').to_owned();
        let parsed = Url::parse(&base_url)?;
        tracing::debug!(base_url = %parsed, timeout = ?self.timeout, "building client");
        let http = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        Ok(FireflyClient {
            http,
            token,
            base_url,
            max_retries: self.max_retries,
        })
    }
}

/// Blocking client for the Firefly III API.
///
/// Use [`FireflyClient::builder()`] to construct an instance.
#[derive(Debug)]
pub struct FireflyClient {
    /// Underlying HTTP client.
    http: reqwest::blocking::Client,
    /// Bearer access token.
    token: SecretString,
    /// API base URL without a trailing slash.
    base_url: String,
    /// Extra attempts for failed requests.
    max_retries: u32,
}

impl FireflyClient {
    /// Creates a new builder for configuring the client.
    #[inline]
    #[must_use]
    pub const fn builder() -> FireflyClientBuilder {
        FireflyClientBuilder {
            token: None,
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Fetches server version information from `/api/v1/about`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not an about
    /// document.
    #[inline]
    #[tracing::instrument(skip_all)]
    pub fn about(&self) -> Result<About> {
        let body = self.get_json(ABOUT_PATH, &[])?;
        let document: Document<About> = serde_json::from_value(body)?;
        Ok(document.data)
    }

    /// Joins the base URL, `path` and query parameters.
    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))?;
        if !query.is_empty() {
            _ = url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Sends one GET request and parses the response.
    fn send_once(&self, url: &Url) -> Result<Value> {
        tracing::trace!(url = %url, "sending GET request");
        let response = self
            .http
            .get(url.clone())
            .bearer_auth(self.token.expose_secret())
            .header(ACCEPT, "application/json")
            .send()?;

        let status = response.status();
        tracing::debug!(status = %status, url = %url, "received response");
        let body = response.text()?;
        if status.is_success() {
            tracing::trace!(body_len = body.len(), "parsing response body");
            serde_json::from_str(&body).map_err(ReportError::from)
        } else {
            tracing::debug!(status = status.as_u16(), message = %body, "API error");
            Err(ReportError::Api {
                status: status.as_u16(),
                message: body,
            })
        }
    }
}

impl FinanceApi for FireflyClient {
    #[tracing::instrument(skip_all, fields(path = %path))]
    fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let url = self.endpoint(path, query)?;
        let mut attempt: u32 = 0;
        loop {
            match self.send_once(&url) {
                Err(err) if attempt < self.max_retries && err.is_retryable() => {
                    attempt += 1;
                    tracing::warn!(error = %err, attempt, "request failed, retrying");
                    std::thread::sleep(RETRY_BACKOFF * attempt);
                }
                result => return result,
            }
        }
    }
}
