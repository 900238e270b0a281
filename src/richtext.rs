//! Styled text fragments used by the layout plan.
//!
//! A [`Span`] carries the subset of styling the report needs (bold, colour and
//! underline) without depending on a loaded font. The conversion helpers turn
//! spans into [`genpdf`][genpdf] styled strings; underline is not supported by
//! [`StyledString`] so it travels separately in [`StyledSpan`].
//!
//! [genpdf]: https://docs.rs/genpdf/

use genpdf::style::{Color, Style, StyledString};

/// Colour used for link labels and targets.
pub const LINK_COLOR: Color = Color::Rgb(11, 91, 211);

/// A slice of text together with inline style attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    color: Option<Color>,
    underline: bool,
}

impl Span {
    /// Creates a new span with the provided text and no styles applied.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Returns the raw text contained in this span.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns whether the span should be rendered in bold.
    pub fn is_bold(&self) -> bool {
        self.bold
    }

    /// Returns the configured color for the span, if any.
    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// Returns whether the span is marked as underlined.
    pub fn is_underlined(&self) -> bool {
        self.underline
    }

    /// Convenience shorthand that marks the span as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Convenience shorthand that marks the span as underlined.
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Convenience shorthand that assigns a color to the span.
    pub fn colored(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    fn to_style(&self) -> Style {
        let mut style = Style::new();
        if let Some(color) = self.color {
            style.set_color(color);
        }
        if self.bold {
            style.set_bold();
        }
        style
    }

    /// Returns the span with its text replaced by `f(text)`.
    pub fn map_text(self, f: impl FnOnce(&str) -> String) -> Self {
        Self {
            text: f(&self.text),
            ..self
        }
    }

    /// Converts the span to a [`StyledString`], dropping the underline flag.
    pub fn to_styled_string(&self) -> StyledString {
        StyledString::new(self.text.clone(), self.to_style())
    }
}

impl From<&Span> for StyledString {
    fn from(span: &Span) -> Self {
        span.to_styled_string()
    }
}

/// A styled span ready to be consumed by `genpdf` elements together with the underline flag.
#[derive(Clone, Debug)]
pub struct StyledSpan {
    pub string: StyledString,
    pub underline: bool,
}

impl From<&Span> for StyledSpan {
    fn from(span: &Span) -> Self {
        StyledSpan {
            string: span.to_styled_string(),
            underline: span.underline,
        }
    }
}

/// A paragraph made of spans.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RichParagraph {
    spans: Vec<Span>,
}

impl RichParagraph {
    pub fn new(spans: impl Into<Vec<Span>>) -> Self {
        Self {
            spans: spans.into(),
        }
    }

    /// A paragraph whose text starts with a bold `prefix`.
    pub fn prefixed(prefix: &str, text: impl Into<String>) -> Self {
        Self::new(vec![Span::new(format!("{prefix} ")).bold(), Span::new(text)])
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn map_text(self, f: &impl Fn(&str) -> String) -> Self {
        Self {
            spans: self.spans.into_iter().map(|span| span.map_text(f)).collect(),
        }
    }

    /// Concatenated text of all spans.
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(Span::text).collect()
    }
}
