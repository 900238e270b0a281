//! Runs news gathering, content generation, asset fetching, rendering and
//! publishing in sequence.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use log::info;

use crate::config::Config;
use crate::content::{ContentGenerator, ContentOutcome};
use crate::error::ReportError;
use crate::fonts::Typeface;
use crate::http::HttpClient;
use crate::news::NewsGatherer;
use crate::publish::{Publisher, UploadResult};
use crate::render::ReportRenderer;

/// File name of the report rendered on `date`.
pub fn report_file_name(date: NaiveDate) -> String {
    format!("Daily_Investment_Report_{}.pdf", date.format("%Y-%m-%d"))
}

/// Media title used when none is configured.
pub fn default_upload_title(date: NaiveDate) -> String {
    format!("Daily Investment Report {}", date.format("%d.%m.%Y"))
}

/// Everything a pipeline run produced.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOutcome {
    pub content: ContentOutcome,
    pub pdf_path: PathBuf,
    pub typeface: Typeface,
    /// `None` when publishing was skipped.
    pub upload: Option<UploadResult>,
}

/// A configured report run.
pub struct Pipeline<'a> {
    config: &'a Config,
    client: HttpClient,
    now: DateTime<Tz>,
    publish: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Result<Self, ReportError> {
        Ok(Self {
            client: HttpClient::new(config.http_timeout)?,
            now: Utc::now().with_timezone(&config.timezone),
            config,
            publish: true,
        })
    }

    /// Overrides the clock used for the prompt date, file name and timestamp.
    pub fn with_now(mut self, now: DateTime<Tz>) -> Self {
        self.now = now;
        self
    }

    /// Renders without uploading when `skip` is set.
    pub fn skip_upload(mut self, skip: bool) -> Self {
        self.publish = !skip;
        self
    }

    pub fn run(&self) -> Result<PipelineOutcome, ReportError> {
        let today = self.now.date_naive();

        // Articles only feed the prompt, so skip the search when no prompt is sent.
        let articles = if self.config.content.api_key().is_some() {
            NewsGatherer::new(&self.client, &self.config.news).gather(today)
        } else {
            Vec::new()
        };
        let content = ContentGenerator::new(&self.client, &self.config.content)
            .with_context(&articles)
            .generate(today)?;
        if let ContentOutcome::Unparseable { reason, .. } = &content {
            info!("continuing with fallback report ({})", reason);
        }

        let logo = self
            .client
            .fetch_asset("INV_LOGO_URL", self.config.assets.logo_url.as_deref())?;

        let pdf_path = self.config.output_dir.join(report_file_name(today));
        let summary = ReportRenderer::new(&self.client, self.config)
            .with_generated_at(self.now)
            .render(&pdf_path, &logo, content.report())?;

        let upload = if self.publish {
            let title = self
                .config
                .upload_title
                .clone()
                .unwrap_or_else(|| default_upload_title(today));
            let publisher = Publisher::new(&self.client, &self.config.publish);
            Some(publisher.upload(&summary.path, Some(&title))?)
        } else {
            info!("upload skipped; report left at {}", summary.path.display());
            None
        };

        Ok(PipelineOutcome {
            content,
            pdf_path: summary.path,
            typeface: summary.typeface,
            upload,
        })
    }
}
