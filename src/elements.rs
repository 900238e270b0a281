//! Element implementations built on top of `genpdf` primitives.
//!
//! `genpdf` ships neither rules nor links, and its image element rejects alpha
//! channels, so this module adds what the report layout needs: a scaled logo,
//! a horizontal rule and a wrapped, underlined link line.

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

use genpdf::elements::Image;
use genpdf::error::{Context as _, Error};
use genpdf::fonts::FontCache;
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Element, Mm, Position, RenderResult, Scale, Size};

use crate::richtext::{Span, StyledSpan, LINK_COLOR};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;
const DEFAULT_UNDERLINE_OFFSET_MM: f64 = 0.4;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn estimated_image_size(image: &DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Loads an image from in-memory bytes using the [`image`] crate with descriptive errors.
pub fn decode_image_from_bytes(bytes: impl AsRef<[u8]>) -> Result<DynamicImage, Error> {
    image::load_from_memory(bytes.as_ref()).context("Failed to decode logo image")
}

/// Composites the image onto a white background and drops the alpha channel.
pub fn flatten_onto_white(image: DynamicImage) -> DynamicImage {
    if let DynamicImage::ImageRgb8(_) = image {
        return image;
    }
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let flattened = RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |channel: u8| ((u16::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    });
    DynamicImage::ImageRgb8(flattened)
}

/// Decodes `bytes` into an image element scaled to `width_mm`, keeping the aspect ratio.
pub fn scaled_image(bytes: impl AsRef<[u8]>, width_mm: f64) -> Result<Image, Error> {
    let decoded = flatten_onto_white(decode_image_from_bytes(bytes)?);
    let natural = mm_to_f64(estimated_image_size(&decoded, DEFAULT_IMAGE_DPI).width);
    let mut image = Image::from_dynamic_image(decoded)?;
    if natural > f64::EPSILON {
        let scale = width_mm / natural;
        image.set_scale(Scale::new(scale, scale));
    }
    Ok(image)
}

/// A thin full-width line with equal spacing above and below.
pub struct HorizontalRule {
    color: Color,
    spacing: Mm,
}

impl HorizontalRule {
    pub fn new(color: Color, spacing_mm: f64) -> Self {
        Self {
            color,
            spacing: mm_from_f64(spacing_mm),
        }
    }
}

impl Element for HorizontalRule {
    fn render(
        &mut self,
        _context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let mut result = RenderResult::default();
        let height = self.spacing + self.spacing;
        if height > area.size().height {
            result.has_more = true;
            return Ok(result);
        }

        let width = area.size().width;
        area.draw_line(
            vec![Position::new(0, self.spacing), Position::new(width, self.spacing)],
            Style::new().with_color(self.color),
        );
        result.size = Size::new(width, height);
        Ok(result)
    }
}

/// An underlined link label followed by its target URL.
///
/// The URL is broken at character boundaries so it never overflows the column;
/// continuation lines start at the left edge. Rendering resumes on the next page
/// when the area runs out of height.
pub struct LinkText {
    label: StyledSpan,
    target: StyledString,
    underline_offset: Mm,
    lines: Option<Vec<String>>,
    rendered: usize,
}

impl LinkText {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: StyledSpan::from(&Span::new(label).colored(LINK_COLOR).underline()),
            target: StyledString::new(url.into(), Style::new().with_color(LINK_COLOR)),
            underline_offset: mm_from_f64(DEFAULT_UNDERLINE_OFFSET_MM),
            lines: None,
            rendered: 0,
        }
    }
}

fn wrap_characters(
    text: &str,
    style: Style,
    font_cache: &FontCache,
    first_width: Mm,
    width: Mm,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = Mm::default();
    let mut budget = first_width;

    for ch in text.chars() {
        let char_width = StyledString::new(ch.to_string(), style).width(font_cache);
        let overflows = current_width + char_width > budget;
        if overflows && (!current.is_empty() || lines.is_empty()) {
            lines.push(std::mem::take(&mut current));
            current_width = Mm::default();
            budget = width;
        }
        current.push(ch);
        current_width += char_width;
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

impl Element for LinkText {
    fn render(
        &mut self,
        context: &genpdf::Context,
        mut area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let font_cache = &context.font_cache;
        let label_style = style.and(self.label.string.style);
        let target_style = style.and(self.target.style);
        let label_width =
            StyledString::new(self.label.string.s.clone(), label_style).width(font_cache);
        let gap = StyledString::new(" ", target_style).width(font_cache);
        let line_height = style
            .line_height(font_cache)
            .max(label_style.line_height(font_cache))
            .max(target_style.line_height(font_cache));
        let width = area.size().width;

        if self.lines.is_none() {
            self.lines = Some(wrap_characters(
                &self.target.s,
                target_style,
                font_cache,
                width - label_width - gap,
                width,
            ));
        }
        let lines = self.lines.clone().unwrap_or_default();

        let mut result = RenderResult::default();
        while self.rendered < lines.len() {
            if line_height > area.size().height {
                result.has_more = true;
                return Ok(result);
            }

            let first = self.rendered == 0;
            if let Some(mut section) = area.text_section(font_cache, Position::new(0, 0), style) {
                if first {
                    section.print_str(&self.label.string.s, label_style)?;
                    section.print_str(" ", target_style)?;
                }
                section.print_str(&lines[self.rendered], target_style)?;
            } else {
                result.has_more = true;
                return Ok(result);
            }

            if first && self.label.underline {
                let glyph_height = label_style
                    .font(font_cache)
                    .glyph_height(label_style.font_size());
                let baseline = glyph_height + self.underline_offset;
                let mut line_style = Style::new();
                if let Some(color) = label_style.color() {
                    line_style = line_style.with_color(color);
                }
                area.draw_line(
                    vec![Position::new(0, baseline), Position::new(label_width, baseline)],
                    line_style,
                );
            }

            area.add_offset(Position::new(0, line_height));
            result.size = result.size.stack_vertical(Size::new(width, line_height));
            self.rendered += 1;
        }

        Ok(result)
    }
}
