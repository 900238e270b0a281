//! Market commentary from a chat-completion API, with static fallbacks.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::ContentConfig;
use crate::error::HttpError;
use crate::http::{ensure_success, HttpClient};
use crate::news::Article;
use crate::report::{Region, RegionSection, Report};

const SYSTEM_PROMPT: &str = "Du bist ein präziser Finanzredakteur.";
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 2000;

/// Which path produced the report.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentOutcome {
    /// The API answered with a usable payload.
    Generated(Report),
    /// No API key is configured; the static payload was used without a network call.
    NoCredential(Report),
    /// The API answered successfully but the payload could not be used.
    Unparseable { report: Report, reason: String },
}

impl ContentOutcome {
    /// Borrows the report regardless of the path taken.
    pub fn report(&self) -> &Report {
        match self {
            ContentOutcome::Generated(report)
            | ContentOutcome::NoCredential(report)
            | ContentOutcome::Unparseable { report, .. } => report,
        }
    }

    /// Returns the report regardless of the path taken.
    pub fn into_report(self) -> Report {
        match self {
            ContentOutcome::Generated(report)
            | ContentOutcome::NoCredential(report)
            | ContentOutcome::Unparseable { report, .. } => report,
        }
    }

    /// True when one of the static payloads was used.
    pub fn is_fallback(&self) -> bool {
        !matches!(self, ContentOutcome::Generated(_))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Requests the daily report from the configured chat-completion API.
pub struct ContentGenerator<'a> {
    client: &'a HttpClient,
    config: &'a ContentConfig,
    context: &'a [Article],
}

impl<'a> ContentGenerator<'a> {
    pub fn new(client: &'a HttpClient, config: &'a ContentConfig) -> Self {
        Self {
            client,
            config,
            context: &[],
        }
    }

    /// Lists `articles` in the prompt as source material.
    pub fn with_context(mut self, articles: &'a [Article]) -> Self {
        self.context = articles;
        self
    }

    /// Produces the report for `today`.
    ///
    /// HTTP failures propagate; an unusable payload from a successful response
    /// is replaced by [`generation_error_fallback`].
    pub fn generate(&self, today: NaiveDate) -> Result<ContentOutcome, HttpError> {
        let Some(api_key) = self.config.api_key() else {
            info!("no content API key configured; using static report");
            return Ok(ContentOutcome::NoCredential(no_credential_fallback()));
        };

        let url = format!(
            "{}/chat/completions",
            self.config.api_base.trim_end_matches('/')
        );
        let prompt = build_prompt(today, self.context);
        let request = ChatRequest {
            model: &self.config.model,
            response_format: ResponseFormat { kind: "json_object" },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        info!("requesting report content from {} ({})", url, self.config.model);
        let response = self
            .client
            .inner()
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .map_err(|err| HttpError::transport(&url, err))?;
        let body = ensure_success(&url, response)?
            .text()
            .map_err(|err| HttpError::transport(&url, err))?;

        Ok(match parse_completion(&body) {
            Ok(report) => ContentOutcome::Generated(report),
            Err(reason) => {
                warn!("content API returned an unusable payload: {}", reason);
                ContentOutcome::Unparseable {
                    report: generation_error_fallback(),
                    reason,
                }
            }
        })
    }
}

/// Extracts the report from a chat-completion response body.
pub fn parse_completion(body: &str) -> Result<Report, String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|err| format!("response is not a chat completion: {err}"))?;
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| "response carries no message content".to_owned())?;
    Report::from_json(&content).map_err(|err| format!("message content is not a report: {err}"))
}

/// Builds the German user prompt for `today`, listing `articles` as sources.
pub fn build_prompt(today: NaiveDate, articles: &[Article]) -> String {
    let sources = if articles.is_empty() {
        String::new()
    } else {
        let lines: Vec<String> = articles
            .iter()
            .map(|article| {
                format!(
                    "* {} | {} | {} | {}",
                    article.source, article.title, article.url, article.date
                )
            })
            .collect();
        format!(
            "**Ausgangsartikel**\n{}\n\nNutze diese Artikel als Quellen für \"news\".\n\n",
            lines.join("\n")
        )
    };

    format!(
        r#"Du bist Finanzjournalist und schreibst den täglichen Marktbericht vom {date}.

{sources}**Aufgabe**
• Formuliere 2-5 prägnante Schlagzeilen (max. 120 Zeichen) zu den wichtigsten
  Marktthemen des Tages.
• Fasse für jede Region zusammen: CH (Schweiz), EU (Europa ohne Schweiz), US (USA),
  AS (Japan, Taiwan, Hongkong).
  - "tldr": 1-3 kurze Kernaussagen
  - "moves": auffällige Kurs- und Indexbewegungen
  - "news": Unternehmensnews als Paare [Text, URL]; nur aufnehmen, wenn eine
    plausible Quelle existiert
  - "analyst": Analystenstimmen, Rating-Änderungen
  - "macro": Makro- und Sektorthemen

**Rückgabe**
Gib **nur** ein JSON-Objekt in exakt diesem Format zurück:
{{
  "headline": ["…", "…"],
  "regions": {{
    "CH": {{"tldr": ["…"], "moves": ["…"], "news": [["…", "https://…"]],
            "analyst": ["…"], "macro": ["…"]}},
    "EU": {{…}},
    "US": {{…}},
    "AS": {{…}}
  }}
}}

Datum heute: {iso}"#,
        date = today.format("%d.%m.%Y"),
        iso = today.format("%Y-%m-%d"),
    )
}

/// Static report used when no API key is configured.
pub fn no_credential_fallback() -> Report {
    static_report(
        "Kein API-Schlüssel konfiguriert – statischer Bericht.",
        "Keine generierten Inhalte verfügbar.",
    )
}

/// Static report used when the API answered with an unusable payload.
pub fn generation_error_fallback() -> Report {
    static_report(
        "(Generierungsfehler) Marktbericht konnte nicht erstellt werden.",
        "Die Antwort des Sprachmodells war nicht lesbar.",
    )
}

fn static_report(headline: &str, tldr: &str) -> Report {
    let regions: BTreeMap<Region, RegionSection> = Region::ALL
        .into_iter()
        .map(|region| {
            let section = RegionSection {
                tldr: vec![tldr.to_owned()],
                ..RegionSection::default()
            };
            (region, section)
        })
        .collect();
    Report::new(vec![headline.to_owned()], regions)
}
