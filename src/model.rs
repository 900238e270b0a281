//! Renderer-independent description of the report document.
//!
//! [`crate::layout`] plans a [`ReportLayout`] from a [`Report`][crate::report::Report];
//! [`crate::render`] turns the plan into `genpdf` elements. Keeping the plan as
//! plain data lets the structure of the document be inspected without drawing it.

use crate::report::Region;
use crate::richtext::RichParagraph;

/// A hyperlink shown under a news bullet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub label: String,
    pub url: String,
}

/// Individual bullets that make up a section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    /// A bulleted paragraph.
    Bullet(RichParagraph),
    /// A bulleted news item followed by its source link.
    News { text: RichParagraph, link: Link },
}

impl Block {
    /// Text of the bullet, without the link.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Bullet(paragraph) | Block::News { text: paragraph, .. } => {
                paragraph.plain_text()
            }
        }
    }

    fn map_text(self, f: &impl Fn(&str) -> String) -> Self {
        match self {
            Block::Bullet(paragraph) => Block::Bullet(paragraph.map_text(f)),
            Block::News { text, link } => Block::News {
                text: text.map_text(f),
                link: Link {
                    label: f(&link.label),
                    url: f(&link.url),
                },
            },
        }
    }
}

/// One regional section of the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    region: Region,
    blocks: Vec<Block>,
}

impl Section {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            blocks: Vec::new(),
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn title(&self) -> &'static str {
        self.region.title()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Appends a block and returns the updated section.
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }
}

/// The planned body of the report: headline bullets and regional sections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportLayout {
    pub headlines: Vec<RichParagraph>,
    pub sections: Vec<Section>,
}

impl ReportLayout {
    /// Returns the planned section of `region`, if it is rendered.
    pub fn section(&self, region: Region) -> Option<&Section> {
        self.sections.iter().find(|section| section.region() == region)
    }

    /// Rewrites every piece of planned text with `f`, keeping styles and structure.
    pub fn map_text(self, f: impl Fn(&str) -> String) -> Self {
        Self {
            headlines: self
                .headlines
                .into_iter()
                .map(|headline| headline.map_text(&f))
                .collect(),
            sections: self
                .sections
                .into_iter()
                .map(|section| Section {
                    region: section.region,
                    blocks: section.blocks.into_iter().map(|block| block.map_text(&f)).collect(),
                })
                .collect(),
        }
    }
}
