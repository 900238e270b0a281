//! Blocking HTTP client shared by every pipeline stage, plus the asset fetcher.

use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::{Client, Response};

use crate::error::{body_snippet, ConfigurationError, HttpError, ReportError};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("investory-report/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper over a configured [`reqwest::blocking::Client`].
#[derive(Clone, Debug)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Builds a client with the fixed user agent and the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let inner = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| HttpError::transport("<client>", err))?;
        Ok(Self { inner })
    }

    pub(crate) fn inner(&self) -> &Client {
        &self.inner
    }

    /// Downloads the asset behind the setting `setting`.
    ///
    /// An unset or blank URL is a configuration problem, not an HTTP one.
    pub fn fetch_asset(
        &self,
        setting: &'static str,
        url: Option<&str>,
    ) -> Result<Vec<u8>, ReportError> {
        let url = url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigurationError::missing(setting))?;
        let bytes = self.get_bytes(url)?;
        info!("fetched {} ({} bytes)", setting, bytes.len());
        Ok(bytes)
    }

    /// Performs a GET request and returns the body of a successful response.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        debug!("GET {}", url);
        let response = self
            .inner
            .get(url)
            .send()
            .map_err(|err| HttpError::transport(url, err))?;
        let response = ensure_success(url, response)?;
        let bytes = response
            .bytes()
            .map_err(|err| HttpError::transport(url, err))?;
        Ok(bytes.to_vec())
    }
}

/// Turns a non-success response into [`HttpError::Status`] carrying a body snippet.
pub(crate) fn ensure_success(url: &str, response: Response) -> Result<Response, HttpError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(HttpError::Status {
        url: url.to_owned(),
        status: status.as_u16(),
        snippet: body_snippet(&body),
    })
}
