//! Data structures describing the market content of a report.
//!
//! The types mirror the JSON document requested from the content generator.
//! Deserialization is lenient where upstream output tends to wobble (missing
//! fields, `null` lists, lowercase region codes) and the resulting [`Report`]
//! always carries all four [`Region`]s.

use std::collections::BTreeMap;
use std::fmt;

use log::warn;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Market geography covered by the report.
///
/// The declaration order is the order in which sections are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    Switzerland,
    Europe,
    Usa,
    Asia,
}

impl Region {
    /// All regions in rendering order.
    pub const ALL: [Region; 4] = [Region::Switzerland, Region::Europe, Region::Usa, Region::Asia];

    /// Two-letter code used in the generator payload.
    pub fn code(self) -> &'static str {
        match self {
            Region::Switzerland => "CH",
            Region::Europe => "EU",
            Region::Usa => "US",
            Region::Asia => "AS",
        }
    }

    /// Section heading printed in the document.
    pub fn title(self) -> &'static str {
        match self {
            Region::Switzerland => "Switzerland",
            Region::Europe => "Europe ex-Switzerland",
            Region::Usa => "USA",
            Region::Asia => "Asia (Japan/Taiwan/Hong Kong)",
        }
    }

    /// Parses a payload code, ignoring case and surrounding whitespace.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Region::ALL
            .into_iter()
            .find(|region| region.code().eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A single upstream news entry.
///
/// Well-formed entries are `[text, url]` pairs; `{"text", "url"}` objects are
/// accepted too. Anything else is kept as [`NewsItem::Malformed`] so the layout
/// can skip it without failing the whole report.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NewsItem {
    Pair(String, String),
    Object { text: String, url: String },
    Malformed(serde_json::Value),
}

impl NewsItem {
    /// Convenience constructor for a well-formed entry.
    pub fn link(text: impl Into<String>, url: impl Into<String>) -> Self {
        NewsItem::Pair(text.into(), url.into())
    }

    /// Returns `(text, url)` for well-formed entries.
    pub fn as_link(&self) -> Option<(&str, &str)> {
        match self {
            NewsItem::Pair(text, url) | NewsItem::Object { text, url } => Some((text, url)),
            NewsItem::Malformed(_) => None,
        }
    }
}

/// Content of one regional section. Every list may be empty.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RegionSection {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tldr: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub moves: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub news: Vec<NewsItem>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub analyst: Vec<String>,
    #[serde(default, rename = "macro", deserialize_with = "null_as_empty")]
    pub macro_notes: Vec<String>,
}

impl RegionSection {
    /// Returns true when the section has nothing to render.
    pub fn is_empty(&self) -> bool {
        self.tldr.is_empty()
            && self.moves.is_empty()
            && self.news.is_empty()
            && self.analyst.is_empty()
            && self.macro_notes.is_empty()
    }
}

/// The market summary rendered into the PDF.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "JsonObject<RawReport>")]
pub struct Report {
    pub headline: Vec<String>,
    pub regions: BTreeMap<Region, RegionSection>,
}

impl Report {
    /// Creates a report and fills every missing region with an empty section.
    pub fn new(headline: Vec<String>, regions: BTreeMap<Region, RegionSection>) -> Self {
        Self { headline, regions }.normalized()
    }

    /// Parses a generator payload.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Ensures all four regions are present.
    pub fn normalized(mut self) -> Self {
        for region in Region::ALL {
            self.regions.entry(region).or_default();
        }
        self
    }

    /// Returns the section of `region`, if present.
    pub fn section(&self, region: Region) -> Option<&RegionSection> {
        self.regions.get(&region)
    }
}

/// Deserializes `T` from a JSON object only.
///
/// Derived struct impls also accept a sequence of field values, which would let
/// `[]` or `[["…"]]` pass as a report.
struct JsonObject<T>(T);

impl<'de, T: DeserializeOwned> Deserialize<'de> for JsonObject<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        serde_json::from_value(Value::Object(fields))
            .map(JsonObject)
            .map_err(de::Error::custom)
    }
}

#[derive(Deserialize)]
struct RawReport {
    #[serde(default, deserialize_with = "null_as_empty")]
    headline: Vec<String>,
    #[serde(default)]
    regions: Option<BTreeMap<String, JsonObject<RegionSection>>>,
}

impl From<JsonObject<RawReport>> for Report {
    fn from(JsonObject(raw): JsonObject<RawReport>) -> Self {
        let mut regions = BTreeMap::new();
        for (code, JsonObject(section)) in raw.regions.unwrap_or_default() {
            match Region::from_code(&code) {
                Some(region) => {
                    regions.insert(region, section);
                }
                None => warn!("ignoring unknown region code '{}'", code),
            }
        }
        Report::new(raw.headline, regions)
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
