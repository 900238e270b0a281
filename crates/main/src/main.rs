use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use clap::Parser;
use investory_report::config::{
    AssetConfig, ContentConfig, NewsConfig, PublishConfig, DEFAULT_API_BASE, DEFAULT_MODEL,
    DEFAULT_NEWS_API_BASE,
};
use investory_report::{Config, Pipeline};
use log::info;

/// Generates the daily investment report PDF and publishes it to the media library.
///
/// Every option can also be provided through the environment variable shown in
/// its help text.
#[derive(Parser)]
#[command(author, version, about = "Daily investment report generator")]
struct Cli {
    /// Base URL of the media library (e.g. https://example.com).
    #[arg(long, env = "INV_WP_BASE_URL")]
    wp_base_url: Option<String>,

    /// Username for basic authentication against the media library.
    #[arg(long, env = "INV_WP_USER")]
    wp_user: Option<String>,

    /// Application password for basic authentication.
    #[arg(long, env = "INV_WP_APP_PASSWORD", hide_env_values = true)]
    wp_app_password: Option<String>,

    /// URL of the logo image placed in the header.
    #[arg(long, env = "INV_LOGO_URL")]
    logo_url: Option<String>,

    /// URL of the regular brand font (TrueType).
    #[arg(long, env = "INV_POPPINS_REG_URL")]
    font_regular_url: Option<String>,

    /// URL of the bold brand font (TrueType).
    #[arg(long, env = "INV_POPPINS_BOLD_URL")]
    font_bold_url: Option<String>,

    /// API key of the chat-completion service; a static report is used without it.
    #[arg(long, env = "INV_OAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Base URL of the chat-completion API.
    #[arg(long, env = "INV_OAI_BASE_URL", default_value = DEFAULT_API_BASE)]
    openai_base_url: String,

    /// Chat-completion model.
    #[arg(long, env = "INV_OAI_MODEL", default_value = DEFAULT_MODEL)]
    openai_model: String,

    /// News search API key; recent articles are passed to the model as context.
    #[arg(long, env = "SERPAPI_KEY", hide_env_values = true)]
    serpapi_key: Option<String>,

    /// Base URL of the news search API.
    #[arg(long, env = "INV_SERPAPI_BASE_URL", default_value = DEFAULT_NEWS_API_BASE)]
    serpapi_base_url: String,

    /// Directory receiving the rendered PDF [default: system temp dir].
    #[arg(long, env = "INV_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Directory receiving downloaded font files.
    #[arg(long, env = "INV_SCRATCH_DIR")]
    scratch_dir: Option<PathBuf>,

    /// Additional directory searched for fallback font metrics.
    #[arg(long, env = "INV_FALLBACK_FONTS_DIR")]
    fallback_fonts_dir: Option<PathBuf>,

    /// IANA time zone of the report timestamp.
    #[arg(long, env = "INV_TIMEZONE", default_value = "Europe/Zurich")]
    timezone: Tz,

    /// Timeout in seconds for every HTTP request.
    #[arg(long, env = "INV_HTTP_TIMEOUT_SECS", default_value_t = 60)]
    timeout_secs: u64,

    /// Title of the uploaded media item [default: dated report title].
    #[arg(long, env = "INV_UPLOAD_TITLE")]
    title: Option<String>,

    /// Render the PDF without uploading it.
    #[arg(long)]
    skip_upload: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let defaults = Config::default();
        Config {
            publish: PublishConfig {
                base_url: self.wp_base_url,
                username: self.wp_user,
                app_password: self.wp_app_password,
            },
            assets: AssetConfig {
                logo_url: self.logo_url,
                font_regular_url: self.font_regular_url,
                font_bold_url: self.font_bold_url,
            },
            content: ContentConfig {
                api_key: self.openai_api_key,
                api_base: self.openai_base_url,
                model: self.openai_model,
            },
            news: NewsConfig {
                api_key: self.serpapi_key,
                api_base: self.serpapi_base_url,
            },
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
            scratch_dir: self.scratch_dir.unwrap_or(defaults.scratch_dir),
            fallback_fonts_dir: self.fallback_fonts_dir,
            http_timeout: Duration::from_secs(self.timeout_secs),
            timezone: self.timezone,
            upload_title: self.title,
        }
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[INVESTORY] {:<5} {}", record.level(), record.args()))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let skip_upload = cli.skip_upload;
    let config = cli.into_config();

    let result =
        Pipeline::new(&config).and_then(|pipeline| pipeline.skip_upload(skip_upload).run());

    match result {
        Ok(outcome) => {
            info!(
                "report finished (fallback content: {}, fallback typeface: {})",
                outcome.content.is_fallback(),
                outcome.typeface.is_fallback()
            );
            match outcome.upload {
                Some(upload) => println!("PUBLIC_PDF_URL: {}", upload.public_url),
                None => println!("PDF_PATH: {}", outcome.pdf_path.display()),
            }
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            print_error_sources(&err);
            std::process::exit(1);
        }
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
