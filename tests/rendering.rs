use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;

use chrono::TimeZone;
use investory_report::config::Config;
use investory_report::fonts::Typeface;
use investory_report::http::HttpClient;
use investory_report::render::ReportRenderer;
use investory_report::report::NewsItem;
use investory_report::{Region, RegionSection, Report};
use sha2::{Digest, Sha256};

mod common;

fn sample_report() -> Report {
    let mut regions = BTreeMap::new();
    regions.insert(
        Region::Switzerland,
        RegionSection {
            tldr: vec!["SMI fester".into(), "Franken stabil".into()],
            moves: vec!["Nestlé +2.1%".into()],
            news: vec![
                NewsItem::link(
                    "UBS meldet Quartalszahlen",
                    "https://example.com/news/ubs/quarterly-results-with-a-rather-long-path-that-has-to-wrap-somewhere",
                ),
                NewsItem::Malformed(serde_json::json!({"text": "ohne Link"})),
            ],
            analyst: vec!["Roche: Kursziel erhöht".into()],
            macro_notes: vec!["SNB".into(), "Inflation rückläufig".into()],
        },
    );
    regions.insert(
        Region::Usa,
        RegionSection {
            moves: vec!["S&P 500 +0.4%".into()],
            ..RegionSection::default()
        },
    );
    Report::new(vec!["Märkte im Plus".into(), "Zinsen im Fokus".into()], regions)
}

fn render_pdf(report: &Report) -> Vec<u8> {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = Config {
        scratch_dir: dir.path().join("fonts"),
        ..Config::default()
    };
    let client = HttpClient::new(Duration::from_secs(5)).expect("client");
    let generated_at = config
        .timezone
        .with_ymd_and_hms(2024, 6, 3, 7, 30, 0)
        .single()
        .expect("unambiguous local time");
    let output = dir.path().join("report.pdf");

    let summary = ReportRenderer::new(&client, &config)
        .with_generated_at(generated_at)
        .render(&output, &common::logo_png(), report)
        .expect("render pdf");
    assert!(matches!(summary.typeface, Typeface::Builtin { .. }));

    fs::read(&summary.path).expect("read rendered pdf")
}

fn render_sample_pdf() -> Vec<u8> {
    render_pdf(&sample_report())
}

fn scrub_pdf(bytes: &[u8]) -> Vec<u8> {
    fn scrub_segment(data: &mut [u8], tag: &[u8], terminator: u8) {
        let mut index = 0;
        while index + tag.len() < data.len() {
            if data[index..].starts_with(tag) {
                let mut cursor = index + tag.len();
                while cursor < data.len() {
                    let byte = data[cursor];
                    if byte == terminator {
                        break;
                    }
                    if terminator == b')' {
                        data[cursor] = b'0';
                    } else if !matches!(byte, b'<' | b'>' | b' ' | b'\n' | b'\r' | b'\t') {
                        data[cursor] = b'0';
                    }
                    cursor += 1;
                }
                index = cursor;
            } else {
                index += 1;
            }
        }
    }

    fn scrub_xml(data: &mut [u8], start: &[u8], end: &[u8]) {
        let mut offset = 0;
        while offset + start.len() < data.len() {
            if let Some(start_pos) = data[offset..]
                .windows(start.len())
                .position(|window| window == start)
            {
                let start_index = offset + start_pos + start.len();
                if let Some(end_pos) = data[start_index..]
                    .windows(end.len())
                    .position(|window| window == end)
                {
                    for byte in &mut data[start_index..start_index + end_pos] {
                        if !matches!(*byte, b'<' | b'>' | b'/' | b' ' | b'\n' | b'\r' | b'\t') {
                            *byte = b'0';
                        }
                    }
                    offset = start_index + end_pos + end.len();
                } else {
                    break;
                }
            } else {
                break;
            }
        }
    }

    let mut normalized = bytes.to_vec();
    scrub_segment(&mut normalized, b"/CreationDate(", b')');
    scrub_segment(&mut normalized, b"/ModDate(", b')');
    scrub_segment(&mut normalized, b"/ID[", b']');
    scrub_segment(&mut normalized, b"/Producer(", b')');
    scrub_xml(&mut normalized, b"<xmp:CreateDate>", b"</xmp:CreateDate>");
    scrub_xml(&mut normalized, b"<xmp:ModifyDate>", b"</xmp:ModifyDate>");
    scrub_xml(
        &mut normalized,
        b"<xmp:MetadataDate>",
        b"</xmp:MetadataDate>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:DocumentID>",
        b"</xmpMM:DocumentID>",
    );
    scrub_xml(
        &mut normalized,
        b"<xmpMM:InstanceID>",
        b"</xmpMM:InstanceID>",
    );
    scrub_xml(&mut normalized, b"<xmpMM:VersionID>", b"</xmpMM:VersionID>");
    normalized
}

fn normalized_hash(bytes: &[u8]) -> [u8; 32] {
    let normalized = scrub_pdf(bytes);
    let digest = Sha256::digest(&normalized);
    digest.into()
}

#[test]
fn renders_non_empty_output() {
    let bytes = render_sample_pdf();
    assert!(bytes.starts_with(b"%PDF"), "rendered file should be a PDF");
    assert!(
        bytes.len() > 1024,
        "rendered PDF should contain the header, sections and closing notice"
    );
}

#[test]
fn rendering_is_deterministic() {
    let bytes_a = render_sample_pdf();
    let bytes_b = render_sample_pdf();

    assert_eq!(bytes_a.len(), bytes_b.len(), "PDF sizes should match");

    let hash_a = normalized_hash(&bytes_a);
    let hash_b = normalized_hash(&bytes_b);

    assert_eq!(
        hash_a, hash_b,
        "PDF renders must be deterministic after metadata normalization"
    );
}

#[test]
fn rendered_text_contains_every_section() {
    let text = common::pdf_text(&render_sample_pdf());

    for region in Region::ALL {
        assert!(text.contains(region.title()), "missing {} in {text:?}", region.title());
    }
    assert!(text.contains("TL;DR: SMI fester; Franken stabil"));
    assert!(text.contains("Märkte im Plus"));
    assert!(text.contains("Nestlé +2.1%"));
}

#[test]
fn text_outside_windows_1252_is_replaced() {
    let mut regions = BTreeMap::new();
    regions.insert(
        Region::Asia,
        RegionSection {
            tldr: vec!["Nikkei −1,2 % → 日経".into()],
            ..RegionSection::default()
        },
    );
    let report = Report::new(vec!["Yen ≈ 157 ↑".into()], regions);

    let text = common::pdf_text(&render_pdf(&report));

    assert!(text.contains("TL;DR: Nikkei -1,2 % -> ??"), "got {text:?}");
    assert!(text.contains("Yen ~ 157 ^"), "got {text:?}");
}

#[test]
fn empty_report_still_renders() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = Config {
        scratch_dir: dir.path().join("fonts"),
        ..Config::default()
    };
    let client = HttpClient::new(Duration::from_secs(5)).expect("client");
    let output = dir.path().join("nested/empty.pdf");

    let summary = ReportRenderer::new(&client, &config)
        .render(&output, &common::logo_png(), &Report::new(Vec::new(), BTreeMap::new()))
        .expect("render empty report");

    assert_eq!(summary.path, output);
    assert!(fs::metadata(&output).expect("pdf written").len() > 0);
}
