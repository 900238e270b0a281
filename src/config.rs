//! Run configuration, built once at process start and passed by reference.

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;

use crate::error::ConfigurationError;

/// Default timeout applied to every outbound HTTP call.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(60);
/// Default chat-completion API base.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
/// Default chat-completion model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default news search API base.
pub const DEFAULT_NEWS_API_BASE: &str = "https://serpapi.com";
/// Zone used for the report timestamp and file name.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Zurich;

/// Settings of the media library the report is published to.
#[derive(Clone, Debug, Default)]
pub struct PublishConfig {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub app_password: Option<String>,
}

/// Resolved publishing credentials.
#[derive(Clone, Copy, Debug)]
pub struct Credentials<'a> {
    pub base_url: &'a str,
    pub username: &'a str,
    pub app_password: &'a str,
}

impl PublishConfig {
    /// Returns the three connection settings or names the first one missing.
    pub fn credentials(&self) -> Result<Credentials<'_>, ConfigurationError> {
        Ok(Credentials {
            base_url: required(&self.base_url, "INV_WP_BASE_URL")?,
            username: required(&self.username, "INV_WP_USER")?,
            app_password: required(&self.app_password, "INV_WP_APP_PASSWORD")?,
        })
    }
}

/// URLs of the brand assets.
#[derive(Clone, Debug, Default)]
pub struct AssetConfig {
    pub logo_url: Option<String>,
    pub font_regular_url: Option<String>,
    pub font_bold_url: Option<String>,
}

/// Settings of the content generator.
#[derive(Clone, Debug)]
pub struct ContentConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
        }
    }
}

impl ContentConfig {
    /// API key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        optional(&self.api_key)
    }
}

/// Settings of the optional news search that feeds the content prompt.
#[derive(Clone, Debug)]
pub struct NewsConfig {
    pub api_key: Option<String>,
    pub api_base: String,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_NEWS_API_BASE.to_owned(),
        }
    }
}

impl NewsConfig {
    /// API key, if one is configured and non-blank. Without it no search runs.
    pub fn api_key(&self) -> Option<&str> {
        optional(&self.api_key)
    }
}

/// Full configuration of a pipeline run.
#[derive(Clone, Debug)]
pub struct Config {
    pub publish: PublishConfig,
    pub assets: AssetConfig,
    pub content: ContentConfig,
    pub news: NewsConfig,
    /// Directory receiving the rendered PDF.
    pub output_dir: PathBuf,
    /// Directory receiving downloaded font files.
    pub scratch_dir: PathBuf,
    /// Extra directory searched for fallback font metrics.
    pub fallback_fonts_dir: Option<PathBuf>,
    pub http_timeout: Duration,
    pub timezone: Tz,
    /// Media title override; a dated default is used otherwise.
    pub upload_title: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let tmp = std::env::temp_dir();
        Self {
            publish: PublishConfig::default(),
            assets: AssetConfig::default(),
            content: ContentConfig::default(),
            news: NewsConfig::default(),
            scratch_dir: tmp.join("investory-fonts"),
            output_dir: tmp,
            fallback_fonts_dir: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            timezone: DEFAULT_TIMEZONE,
            upload_title: None,
        }
    }
}

/// Returns the trimmed value if it is set and non-blank.
pub fn optional(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Returns the trimmed value or a [`ConfigurationError`] naming `setting`.
pub fn required<'a>(
    value: &'a Option<String>,
    setting: &'static str,
) -> Result<&'a str, ConfigurationError> {
    optional(value).ok_or_else(|| ConfigurationError::missing(setting))
}
