//! Blocking HTTP transport used for every GitHub call.
//!
//! The [`Transport`] trait is the seam between the retry logic and the
//! network: production code uses [`ReqwestTransport`], tests substitute a
//! mock to script timeouts and responses.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, LINK, USER_AGENT};
use thiserror::Error;

use super::error::HarvestError;
use super::locator::PersonalAccessToken;

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const CLIENT_USER_AGENT: &str = concat!("hoarder/", env!("CARGO_PKG_VERSION"));

/// A fully-read HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Effective URL after redirects.
    pub url: String,
    /// Raw `Link` header, when present.
    pub link: Option<String>,
    /// Response body as text.
    pub body: String,
}

impl ApiResponse {
    /// Returns true for HTTP 200.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::MalformedPayload`] when the body is not JSON.
    pub fn json(&self) -> Result<serde_json::Value, HarvestError> {
        serde_json::from_str(&self.body).map_err(|error| HarvestError::MalformedPayload {
            url: self.url.clone(),
            message: error.to_string(),
        })
    }
}

/// Transient transport failures. All of them are worth retrying.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The server did not answer within the timeout.
    #[error("request timed out: {0}")]
    Timeout(String),
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Any other transport-level failure.
    #[error("request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout(error.to_string())
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else {
            Self::Other(error.to_string())
        }
    }
}

/// Issues a single GET request.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    /// Fetches `url`, waiting at most `timeout` for the response.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when no response could be read.
    fn get(&self, url: &str, timeout: Duration) -> Result<ApiResponse, TransportError>;
}

/// `reqwest` blocking transport carrying the bearer token on every request.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    token: PersonalAccessToken,
}

impl ReqwestTransport {
    /// Builds a transport for `token`.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Configuration`] when the HTTP client cannot be
    /// constructed.
    pub fn new(token: PersonalAccessToken) -> Result<Self, HarvestError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|error| HarvestError::Configuration {
                message: format!("failed to configure GitHub HTTP client: {error}"),
            })?;
        Ok(Self { client, token })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str, timeout: Duration) -> Result<ApiResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.value())
            .timeout(timeout)
            .send()?;

        let status = response.status().as_u16();
        let effective_url = response.url().to_string();
        let link = response
            .headers()
            .get(LINK)
            .and_then(|raw| raw.to_str().ok())
            .map(ToOwned::to_owned);
        let body = response.text()?;

        Ok(ApiResponse {
            status,
            url: effective_url,
            link,
            body,
        })
    }
}
