//! Draws the planned report into a PDF file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use genpdf::elements::{Break, BulletPoint, LinearLayout, Paragraph, TableLayout};
use genpdf::style::{Color, Style};
use genpdf::{Alignment, Document, Element, Margins, PaperSize};
use log::info;

use crate::builder::DocumentBuilder;
use crate::config::Config;
use crate::elements::{mm_from_f64, scaled_image, HorizontalRule, LinkText};
use crate::error::RenderError;
use crate::fonts::{self, Typeface};
use crate::http::HttpClient;
use crate::layout;
use crate::model::{Block, ReportLayout};
use crate::report::Report;
use crate::richtext::RichParagraph;

pub const REPORT_TITLE: &str = "Daily Investment Report";
pub const HEADLINES_TITLE: &str = "What matters today";
pub const FOOTER_NOTICE: &str = "© INVESTORY — Alle Angaben ohne Gewähr.";
pub const TIMESTAMP_FORMAT: &str = "%d.%m.%Y, %H:%M";

const LOGO_WIDTH_MM: f64 = 50.0;
/// Header column weights: logo plus gutter, then the title.
const HEADER_COLUMNS: [usize; 2] = [56, 124];
const FOOTER_BAND_MM: f64 = 6.0;
const BASE_FONT_SIZE: u8 = 9;
const LINE_SPACING: f64 = 1.35;
const RULE_COLOR: Color = Color::Rgb(0xe6, 0xe6, 0xe6);
const MUTED_COLOR: Color = Color::Rgb(0x80, 0x80, 0x80);

/// What a successful render produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSummary {
    pub path: PathBuf,
    pub typeface: Typeface,
}

/// Renders reports with the configured brand assets.
pub struct ReportRenderer<'a> {
    client: &'a HttpClient,
    config: &'a Config,
    generated_at: DateTime<Tz>,
}

impl<'a> ReportRenderer<'a> {
    /// Creates a renderer stamping documents with the current local time.
    pub fn new(client: &'a HttpClient, config: &'a Config) -> Self {
        Self {
            client,
            config,
            generated_at: Utc::now().with_timezone(&config.timezone),
        }
    }

    /// Overrides the generation timestamp printed in the header.
    pub fn with_generated_at(mut self, generated_at: DateTime<Tz>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Lays out `report` and writes the PDF to `output`.
    ///
    /// Brand font problems are tolerated and reported through
    /// [`RenderSummary::typeface`]; every other failure aborts. With the
    /// built-in typeface, text outside Windows-1252 is replaced first.
    pub fn render(
        &self,
        output: &Path,
        logo: &[u8],
        report: &Report,
    ) -> Result<RenderSummary, RenderError> {
        let (family, typeface) = fonts::resolve_font_family(
            self.client,
            &self.config.assets,
            &self.config.scratch_dir,
            self.config.fallback_fonts_dir.as_deref(),
        )
        .map_err(|err| RenderError::Fonts(err.to_string()))?;

        let mut plan = layout::plan(report);
        if typeface.is_fallback() {
            plan = plan.map_text(|text| fonts::builtin_safe_text(text).into_owned());
        }
        let mut document = document_builder().build(family);
        push_header(&mut document, logo, &self.generated_at)?;
        push_body(&mut document, &plan);
        push_closing(&mut document);

        if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| RenderError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        document.render_to_file(output).map_err(RenderError::Pdf)?;
        info!("rendered {} ({:?})", output.display(), typeface);

        Ok(RenderSummary {
            path: output.to_path_buf(),
            typeface,
        })
    }
}

fn document_builder() -> DocumentBuilder {
    let builder = DocumentBuilder::new()
        .with_title(REPORT_TITLE)
        .with_paper_size(PaperSize::A4)
        .with_margins(Margins::trbl(15, 17, 16, 17))
        .with_font_size(BASE_FONT_SIZE)
        .with_line_spacing(LINE_SPACING)
        .with_footer(mm_from_f64(FOOTER_BAND_MM), |page| {
            Paragraph::new(format!("INVESTORY · Page {page}"))
                .aligned(Alignment::Right)
                .styled(Style::new().with_font_size(7).with_color(MUTED_COLOR))
        });

    #[cfg(feature = "hyphenation")]
    let builder = with_german_hyphenation(builder);

    builder
}

#[cfg(feature = "hyphenation")]
fn with_german_hyphenation(builder: DocumentBuilder) -> DocumentBuilder {
    use hyphenation::{Language, Load, Standard};

    match Standard::from_embedded(Language::German1996) {
        Ok(dictionary) => builder.with_hyphenator(dictionary),
        Err(err) => {
            log::warn!("German hyphenation unavailable: {}", err);
            builder
        }
    }
}

fn title_style() -> Style {
    Style::new().bold().with_font_size(15)
}

fn heading_style() -> Style {
    Style::new().bold().with_font_size(12)
}

fn push_header(
    document: &mut Document,
    logo: &[u8],
    generated_at: &DateTime<Tz>,
) -> Result<(), RenderError> {
    let logo = scaled_image(logo, LOGO_WIDTH_MM).map_err(RenderError::Logo)?;

    let mut header = TableLayout::new(HEADER_COLUMNS.to_vec());
    header
        .row()
        .element(logo)
        .element(
            Paragraph::new(REPORT_TITLE)
                .aligned(Alignment::Right)
                .styled(title_style()),
        )
        .push()
        .map_err(RenderError::Pdf)?;
    document.push(header);

    document.push(
        Paragraph::new(generated_at.format(TIMESTAMP_FORMAT).to_string())
            .aligned(Alignment::Right)
            .styled(Style::new().with_color(MUTED_COLOR)),
    );
    document.push(HorizontalRule::new(RULE_COLOR, 2.0));
    Ok(())
}

fn rich_paragraph(rich: &RichParagraph) -> Paragraph {
    let mut paragraph = Paragraph::default();
    for span in rich.spans() {
        paragraph.push(span);
    }
    paragraph
}

fn bullet(element: impl Element + 'static) -> impl Element {
    BulletPoint::new(element)
        .with_bullet("•")
        .padded(Margins::trbl(0, 0, mm_from_f64(1.5), 0))
}

fn push_block(document: &mut Document, block: &Block) {
    match block {
        Block::Bullet(paragraph) => document.push(bullet(rich_paragraph(paragraph))),
        Block::News { text, link } => {
            let mut layout = LinearLayout::vertical();
            layout.push(rich_paragraph(text));
            layout.push(LinkText::new(link.label.as_str(), link.url.as_str()));
            document.push(bullet(layout));
        }
    }
}

fn push_body(document: &mut Document, plan: &ReportLayout) {
    document.push(Paragraph::new(HEADLINES_TITLE).styled(heading_style()));
    for headline in &plan.headlines {
        document.push(bullet(rich_paragraph(headline)));
    }
    document.push(Break::new(1));

    for section in &plan.sections {
        document.push(
            Paragraph::new(section.title())
                .styled(heading_style())
                .padded(Margins::trbl(mm_from_f64(2.0), 0, mm_from_f64(1.0), 0)),
        );
        for block in section.blocks() {
            push_block(document, block);
        }
    }
}

fn push_closing(document: &mut Document) {
    document.push(Break::new(1));
    document.push(HorizontalRule::new(RULE_COLOR, 1.5));
    document.push(Paragraph::new(FOOTER_NOTICE).styled(Style::new().with_color(MUTED_COLOR)));
}
