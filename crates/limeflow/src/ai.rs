//! AI slide-writing capability.
//!
//! The session only consumes the text an AI returns; [`ContentGenerator`] is the
//! seam, and [`GeminiGenerator`] talks to Google's Gemini REST API.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use ureq::Agent;

use crate::deck::{Slide, SlideType};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// How many items the content prompt asks for.
const MAX_GENERATED_ITEMS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AiError {
    #[error("no AI API key configured (set ai.api_key or GEMINI_API_KEY)")]
    Unavailable,

    #[error("AI request failed: {0}")]
    Request(String),

    #[error("the AI returned nothing usable")]
    Empty,

    #[error("the AI returned malformed slide data: {0}")]
    Malformed(String),
}

pub trait ContentGenerator {
    /// Newline-delimited replacement content for a slide.
    fn fill_content(
        &self,
        existing: &[String],
        title: &str,
        subtitle: &str,
    ) -> Result<String, AiError>;

    /// A slide-shaped JSON object redesigning the slide per `instruction`.
    fn redesign_slide(&self, title: &str, instruction: &str) -> Result<String, AiError>;
}

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s*").expect("valid bullet regex"));

/// Turn generated text into content items: one per non-empty line, list
/// markers stripped.
pub fn parse_content_lines(text: &str) -> Result<Vec<String>, AiError> {
    let items: Vec<String> = text
        .lines()
        .map(|line| BULLET.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();
    if items.is_empty() {
        Err(AiError::Empty)
    } else {
        Ok(items)
    }
}

/// The instruction sent for a redesign: the slide's current content followed
/// by what the user asked for.
pub fn redesign_request(slide: &Slide, instruction: &str) -> String {
    format!(
        "Current content: {}. Request: {}",
        slide.content.join(", "),
        instruction.trim()
    )
}

/// The fields an AI redesign may change. The id is always kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlidePatch {
    #[serde(rename = "type")]
    pub kind: SlideType,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub content: Vec<String>,
}

impl SlidePatch {
    pub fn apply_to(&self, slide: &Slide) -> Slide {
        Slide {
            id: slide.id.clone(),
            kind: self.kind,
            title: self.title.clone(),
            subtitle: self.subtitle.clone().filter(|s| !s.is_empty()),
            content: self.content.clone(),
            footer: slide.footer.clone(),
        }
    }
}

pub fn parse_slide_patch(json: &str) -> Result<SlidePatch, AiError> {
    let trimmed = strip_code_fence(json.trim());
    if trimmed.is_empty() {
        return Err(AiError::Empty);
    }
    let patch: SlidePatch =
        serde_json::from_str(trimmed).map_err(|e| AiError::Malformed(e.to_string()))?;
    if patch.title.trim().is_empty() && patch.content.is_empty() {
        return Err(AiError::Empty);
    }
    Ok(patch)
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

pub struct GeminiGenerator {
    agent: Agent,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(60)))
            .build();
        Self {
            agent: Agent::new_with_config(config),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn generate(&self, prompt: &str, json: bool) -> Result<String, AiError> {
        let mut body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });
        if json {
            body["generationConfig"] = serde_json::json!({
                "responseMimeType": "application/json"
            });
        }

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        tracing::debug!(model = %self.model, "calling Gemini");
        let response: serde_json::Value = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .send_json(&body)
            .map_err(|e| AiError::Request(e.to_string()))?
            .body_mut()
            .read_json()
            .map_err(|e| AiError::Request(e.to_string()))?;

        let text = response_text(&response);
        if text.trim().is_empty() {
            Err(AiError::Empty)
        } else {
            Ok(text)
        }
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(response: &serde_json::Value) -> String {
    response["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

impl ContentGenerator for GeminiGenerator {
    fn fill_content(
        &self,
        existing: &[String],
        title: &str,
        subtitle: &str,
    ) -> Result<String, AiError> {
        let prompt = format!(
            "You are a professional presentation designer.\n\
             Section title: \"{title}\"\n\
             Current content: \"{}\"\n\
             Extra context: \"{subtitle}\"\n\n\
             Write concise, professional lines for a presentation slide based on the above.\n\
             - Keep to the essentials and drop filler words.\n\
             - Put each item on its own line (at most {MAX_GENERATED_ITEMS} items).",
            existing.join("\n")
        );
        self.generate(&prompt, false)
    }

    fn redesign_slide(&self, title: &str, instruction: &str) -> Result<String, AiError> {
        let prompt = format!(
            "Create one presentation slide optimised for the user's request.\n\
             Topic: \"{title}\"\n\
             Request: \"{instruction}\"\n\n\
             Layouts:\n\
             - TITLE: title slide, project kick-off\n\
             - CONTENT_LIST: a general list\n\
             - TWO_COLUMN: comparison or two areas\n\
             - GRID_FOUR: four key elements, e.g. a SWOT analysis\n\
             - QUOTE: a quote, key message or vision\n\n\
             Answer with JSON only, in this shape:\n\
             {{\"type\": \"TITLE\" | \"CONTENT_LIST\" | \"TWO_COLUMN\" | \"GRID_FOUR\" | \"QUOTE\", \
             \"title\": \"...\", \"subtitle\": \"...\", \"content\": [\"...\"]}}"
        );
        self.generate(&prompt, true)
    }
}
