//! Daily investment report: content generation, PDF rendering and publishing.

pub mod builder;
pub mod config;
pub mod content;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod http;
pub mod layout;
pub mod model;
pub mod news;
pub mod pipeline;
pub mod publish;
pub mod render;
pub mod report;
pub mod richtext;

pub use config::Config;
pub use error::ReportError;
pub use pipeline::{Pipeline, PipelineOutcome};
pub use report::{Region, RegionSection, Report};
