//! Recent market articles gathered from a news search API.
//!
//! One search runs per source domain over the window from the previous
//! business day to today. Near-identical titles are merged, preferring Swiss
//! outlets. The result only serves as prompt context, so search failures are
//! logged and skipped.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use log::{debug, info, warn};
use serde::Deserialize;

use crate::config::NewsConfig;
use crate::error::HttpError;
use crate::http::{ensure_success, HttpClient};

/// Titles at least this similar are treated as the same story.
pub const DUPLICATE_TITLE_SIMILARITY: f64 = 0.85;

const SEARCH_PATH: &str = "/search.json";
const DATE_CHARS: usize = 10;

/// An outlet queried for articles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewsSource {
    pub name: &'static str,
    pub domain: &'static str,
    pub swiss: bool,
}

const fn source(name: &'static str, domain: &'static str, swiss: bool) -> NewsSource {
    NewsSource {
        name,
        domain,
        swiss,
    }
}

/// Outlets searched, in query order.
pub const NEWS_SOURCES: [NewsSource; 12] = [
    source("Bloomberg", "bloomberg.com", false),
    source("Financial Times", "ft.com", false),
    source("Reuters", "reuters.com", false),
    source("Wall Street Journal", "wsj.com", false),
    source("CNBC", "cnbc.com", false),
    source("Nikkei Asia", "asia.nikkei.com", false),
    source("Finanz und Wirtschaft", "fuw.ch", true),
    source("NZZ", "nzz.ch", true),
    source("Handelszeitung", "handelszeitung.ch", true),
    source("AGEFI", "agefi.com", true),
    source("finews.ch", "finews.ch", true),
    source("cash.ch", "cash.ch", true),
];

/// A news article passed to the content prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Article {
    pub source: String,
    pub title: String,
    pub url: String,
    /// `YYYY-MM-DD` when the search result carries a date, else empty.
    pub date: String,
    pub swiss: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news_results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    title: String,
    link: String,
    #[serde(default)]
    date: Option<String>,
}

/// Returns the `(from, to)` search window for `today`.
///
/// Monday looks back to Friday; every other day to the day before.
pub fn search_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let days_back = if today.weekday() == Weekday::Mon { 3 } else { 1 };
    (today - Duration::days(days_back), today)
}

/// Collects recent articles through the configured news search API.
pub struct NewsGatherer<'a> {
    client: &'a HttpClient,
    config: &'a NewsConfig,
}

impl<'a> NewsGatherer<'a> {
    pub fn new(client: &'a HttpClient, config: &'a NewsConfig) -> Self {
        Self { client, config }
    }

    /// Returns at most one article per source, deduplicated.
    ///
    /// Without an API key no request is made and the list is empty.
    pub fn gather(&self, today: NaiveDate) -> Vec<Article> {
        let Some(api_key) = self.config.api_key() else {
            debug!("no news API key configured; prompt gets no article context");
            return Vec::new();
        };

        let (from, to) = search_window(today);
        let mut articles = Vec::new();
        for outlet in &NEWS_SOURCES {
            match self.search(api_key, outlet, from, to) {
                Ok(Some(article)) => articles.push(article),
                Ok(None) => debug!("no article from {}", outlet.name),
                Err(err) => warn!("news search for {} failed: {}", outlet.name, err),
            }
        }

        let articles = dedupe(articles);
        info!("gathered {} news articles", articles.len());
        articles
    }

    fn search(
        &self,
        api_key: &str,
        outlet: &NewsSource,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Option<Article>, HttpError> {
        let url = format!("{}{}", self.config.api_base.trim_end_matches('/'), SEARCH_PATH);
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        let query = format!("site:{} Aktien Börse {}", outlet.domain, from);

        // The key travels in the query string, so reqwest errors drop their URL.
        let response = self
            .client
            .inner()
            .get(&url)
            .query(&[
                ("engine", "google_news"),
                ("q", query.as_str()),
                ("hl", "de"),
                ("num", "1"),
                ("after", from.as_str()),
                ("before", to.as_str()),
                ("sort_by", "date"),
                ("api_key", api_key),
            ])
            .send()
            .map_err(|err| HttpError::transport(&url, err.without_url()))?;
        let results: SearchResponse = ensure_success(&url, response)?
            .json()
            .map_err(|err| HttpError::transport(&url, err.without_url()))?;

        Ok(results.news_results.into_iter().next().map(|result| Article {
            source: outlet.name.to_owned(),
            title: result.title,
            url: result.link,
            date: result
                .date
                .unwrap_or_default()
                .chars()
                .take(DATE_CHARS)
                .collect(),
            swiss: outlet.swiss,
        }))
    }
}

/// Merges articles whose titles are near-identical.
///
/// The first article of a story keeps its position; a later Swiss duplicate
/// replaces it.
pub fn dedupe(articles: Vec<Article>) -> Vec<Article> {
    let mut unique: Vec<Article> = Vec::new();
    for article in articles {
        let duplicate = unique.iter_mut().find(|kept| {
            strsim::normalized_levenshtein(&kept.title, &article.title)
                >= DUPLICATE_TITLE_SIMILARITY
        });
        match duplicate {
            Some(kept) => {
                if article.swiss {
                    *kept = article;
                }
            }
            None => unique.push(article),
        }
    }
    unique
}
