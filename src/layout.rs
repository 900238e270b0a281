//! Plans the body of the report from its content.

use crate::model::{Block, Link, ReportLayout, Section};
use crate::report::{RegionSection, Report};
use crate::richtext::{RichParagraph, Span};

/// Headlines shown under "What matters today".
pub const HEADLINE_LIMIT: usize = 5;
/// News entries considered per region.
pub const NEWS_LIMIT: usize = 8;
/// Maximum characters of a joined bullet.
pub const JOINED_TEXT_LIMIT: usize = 400;

pub const TLDR_PREFIX: &str = "TL;DR:";
pub const MOVES_PREFIX: &str = "Top Moves:";
pub const NEWS_PREFIX: &str = "Company news:";
pub const ANALYST_PREFIX: &str = "Analyst highlights:";
pub const MACRO_PREFIX: &str = "Macro/Sector:";
pub const SOURCE_LABEL: &str = "Source";

/// Plans headline bullets and one section per region present in `report`.
pub fn plan(report: &Report) -> ReportLayout {
    let headlines = report
        .headline
        .iter()
        .take(HEADLINE_LIMIT)
        .map(|headline| RichParagraph::new(vec![Span::new(headline.as_str())]))
        .collect();

    let sections = report
        .regions
        .iter()
        .map(|(region, content)| plan_section(Section::new(*region), content))
        .collect();

    ReportLayout { headlines, sections }
}

fn plan_section(mut section: Section, content: &RegionSection) -> Section {
    if let Some(block) = joined_bullet(TLDR_PREFIX, &content.tldr, "; ") {
        section.push(block);
    }
    if let Some(block) = joined_bullet(MOVES_PREFIX, &content.moves, "; ") {
        section.push(block);
    }
    for (text, url) in content
        .news
        .iter()
        .take(NEWS_LIMIT)
        .filter_map(|item| item.as_link())
    {
        section.push(Block::News {
            text: RichParagraph::prefixed(NEWS_PREFIX, text),
            link: Link {
                label: SOURCE_LABEL.to_owned(),
                url: url.to_owned(),
            },
        });
    }
    if let Some(block) = joined_bullet(ANALYST_PREFIX, &content.analyst, "; ") {
        section.push(block);
    }
    if let Some(block) = joined_bullet(MACRO_PREFIX, &content.macro_notes, " ") {
        section.push(block);
    }
    section
}

fn joined_bullet(prefix: &str, entries: &[String], separator: &str) -> Option<Block> {
    if entries.is_empty() {
        return None;
    }
    let joined = truncate_chars(&entries.join(separator), JOINED_TEXT_LIMIT);
    Some(Block::Bullet(RichParagraph::prefixed(prefix, joined)))
}

/// Returns the first `limit` characters of `text`.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((index, _)) => text[..index].to_owned(),
        None => text.to_owned(),
    }
}
