//! Uploads the rendered report to the media library.

use std::fs;
use std::path::Path;

use log::info;
use reqwest::blocking::multipart::{Form, Part};
use serde_json::Value;

use crate::config::PublishConfig;
use crate::error::{body_snippet, HttpError, ReportError, UploadError};
use crate::http::HttpClient;

/// Path of the media collection below the configured base URL.
pub const MEDIA_ENDPOINT_PATH: &str = "/wp-json/wp/v2/media";

/// Result of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadResult {
    pub public_url: String,
}

/// Publishes files through the media REST endpoint.
pub struct Publisher<'a> {
    client: &'a HttpClient,
    config: &'a PublishConfig,
}

impl<'a> Publisher<'a> {
    pub fn new(client: &'a HttpClient, config: &'a PublishConfig) -> Self {
        Self { client, config }
    }

    /// Uploads `path` and returns the public URL reported by the endpoint.
    pub fn upload(&self, path: &Path, title: Option<&str>) -> Result<UploadResult, ReportError> {
        let credentials = self.config.credentials()?;
        let url = format!(
            "{}{}",
            credentials.base_url.trim_end_matches('/'),
            MEDIA_ENDPOINT_PATH
        );

        let bytes = fs::read(path).map_err(|source| UploadError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.pdf".to_owned());
        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str("application/pdf")
            .map_err(|err| HttpError::transport(&url, err))?;
        let mut form = Form::new().part("file", part);
        if let Some(title) = title {
            form = form.text("title", title.to_owned());
        }

        info!("uploading {} to {}", file_name, url);
        let response = self
            .client
            .inner()
            .post(&url)
            .basic_auth(credentials.username, Some(credentials.app_password))
            .multipart(form)
            .send()
            .map_err(|err| HttpError::transport(&url, err))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| HttpError::transport(&url, err))?;

        let public_url = resolve_public_url(status, &body)?;
        info!("upload complete: {}", public_url);
        Ok(UploadResult { public_url })
    }
}

/// Interprets the media endpoint's answer.
///
/// Accepts 200 and 201 only. The URL comes from `source_url`, else from
/// `guid.rendered`; a JSON list is answered by its first element.
pub fn resolve_public_url(status: u16, body: &str) -> Result<String, UploadError> {
    if status != 200 && status != 201 {
        return Err(UploadError::Status {
            status,
            snippet: body_snippet(body),
        });
    }

    let value: Value = serde_json::from_str(body).map_err(UploadError::InvalidJson)?;
    let media = match &value {
        Value::Array(items) => items.first().ok_or(UploadError::MissingUrl)?,
        other => other,
    };

    let non_empty = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_owned)
    };

    non_empty(media.get("source_url"))
        .or_else(|| non_empty(media.get("guid").and_then(|guid| guid.get("rendered"))))
        .ok_or(UploadError::MissingUrl)
}
