//! Error types shared by the report pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Number of body characters kept when an HTTP response is quoted in an error.
pub const BODY_SNIPPET_CHARS: usize = 300;

/// A required setting was not provided.
#[derive(Debug, Error)]
#[error("required setting `{setting}` is not configured")]
pub struct ConfigurationError {
    setting: &'static str,
}

impl ConfigurationError {
    /// Creates an error naming the missing setting.
    pub fn missing(setting: &'static str) -> Self {
        Self { setting }
    }

    /// Name of the setting that was missing.
    pub fn setting(&self) -> &'static str {
        self.setting
    }
}

/// Failures of an outbound HTTP call.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The request could not be sent or the response could not be read.
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("request to {url} returned HTTP {status}: {snippet}")]
    Status {
        url: String,
        status: u16,
        snippet: String,
    },
}

impl HttpError {
    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.to_owned(),
            source,
        }
    }

    /// HTTP status code for [`HttpError::Status`] failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport { .. } => None,
        }
    }
}

/// The media library rejected or garbled an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The file to upload could not be read.
    #[error("failed to read {}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The endpoint answered with a status other than 200 or 201.
    #[error("upload failed with HTTP {status}: {snippet}")]
    Status { status: u16, snippet: String },
    /// The endpoint answered with a body that is not JSON.
    #[error("upload response is not valid JSON")]
    InvalidJson(#[source] serde_json::Error),
    /// The JSON response carries neither `source_url` nor `guid.rendered`.
    #[error("upload response contains no public URL")]
    MissingUrl,
}

/// Document construction failed.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The layout engine failed to build or write the document.
    #[error("failed to render PDF document")]
    Pdf(#[source] genpdf::error::Error),
    /// The logo bytes could not be turned into an image element.
    #[error("failed to prepare logo image")]
    Logo(#[source] genpdf::error::Error),
    /// Neither the brand fonts nor a fallback metrics source could be loaded.
    #[error("no usable font family: {0}")]
    Fonts(String),
    /// Output directory handling failed.
    #[error("failed to prepare {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Umbrella error returned by the pipeline.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Returns at most [`BODY_SNIPPET_CHARS`] characters of `body`.
pub fn body_snippet(body: &str) -> String {
    body.trim().chars().take(BODY_SNIPPET_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_truncated_on_char_boundaries() {
        let body = "ä".repeat(BODY_SNIPPET_CHARS + 20);
        let snippet = body_snippet(&body);
        assert_eq!(snippet.chars().count(), BODY_SNIPPET_CHARS);
    }

    #[test]
    fn configuration_error_names_setting() {
        let err = ConfigurationError::missing("INV_LOGO_URL");
        assert_eq!(err.setting(), "INV_LOGO_URL");
        assert!(err.to_string().contains("INV_LOGO_URL"));
    }
}
