use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{CommentType, Quality, SummaryRecord};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Summaries stay within this range regardless of configuration.
const MIN_SUMMARY_CHARS: usize = 30;
const MAX_SUMMARY_CHARS: usize = 120;

/// Body text sent to the model is cut to this many chars to save tokens.
const BODY_SNIPPET_CHARS: usize = 4000;

const TEMPERATURE: f32 = 0.2;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// One configured OpenAI client shared by every summarizer call in the
/// process, injected by the caller rather than held in a global.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            api_key,
            model,
        }
    }

    /// Send one chat completion in JSON mode and return the raw message text.
    async fn complete_json(&self, system: String, user: String) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system,
                },
                Message {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            temperature: TEMPERATURE,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let response = self
            .client
            .post(OPENAI_API_URL)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::OpenAiApi(format!("API error: {}", error_text)));
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::OpenAiApi("No choices returned from API".to_string()))
    }
}

/// Capability seam for the ingestion pipeline. Implementations may fail on
/// transport or parse errors; the pipeline degrades the item instead of
/// aborting the batch.
#[async_trait]
pub trait Summarize: Send + Sync {
    async fn summarize(&self, title: &str, source: &str, body: &str) -> Result<SummaryRecord>;
}

/// Legacy three-field summarizer: summary, keywords, quality.
pub struct BasicSummarizer {
    client: Arc<OpenAiClient>,
    max_chars: usize,
}

impl BasicSummarizer {
    pub fn new(client: Arc<OpenAiClient>, max_chars: usize) -> Self {
        Self { client, max_chars }
    }
}

#[async_trait]
impl Summarize for BasicSummarizer {
    async fn summarize(&self, title: &str, source: &str, body: &str) -> Result<SummaryRecord> {
        let hard_limit = clamp_summary_limit(self.max_chars);

        let system = format!(
            "You are a news headline summarization assistant. Rules: \
             1) The summary is 1-2 sentences, at most {hard_limit} characters, no exaggeration. \
             2) Prefer specific facts. 3) It must stand on the headline alone. \
             Always answer in JSON with keys ['summary','keywords','quality']. \
             'keywords' is an array, 'quality' is one of 'ok'|'shortened'|'fallback'."
        );
        let user = build_user_prompt(title, source, body);

        let raw = self.client.complete_json(system, user).await?;
        Ok(parse_summary_payload(&raw, hard_limit, None))
    }
}

/// "Plus" summarizer: adds an editorial comment and its type
/// (insight / caution / impact) on top of the basic three fields.
pub struct EnrichedSummarizer {
    client: Arc<OpenAiClient>,
    max_chars: usize,
    comment_max_chars: usize,
}

impl EnrichedSummarizer {
    pub fn new(client: Arc<OpenAiClient>, max_chars: usize, comment_max_chars: usize) -> Self {
        Self {
            client,
            max_chars,
            comment_max_chars,
        }
    }
}

#[async_trait]
impl Summarize for EnrichedSummarizer {
    async fn summarize(&self, title: &str, source: &str, body: &str) -> Result<SummaryRecord> {
        let hard_limit = clamp_summary_limit(self.max_chars);

        let system = format!(
            "You are a news headline summarization assistant. Rules: \
             1) The summary is 1-2 sentences, at most {hard_limit} characters, no exaggeration. \
             2) Prefer specific facts. 3) It must stand on the headline alone. \
             4) Add one editorial remark of at most {comment_max} characters. \
             Always answer in JSON with keys \
             ['summary','keywords','comment','comment_type','quality']. \
             'keywords' is an array, 'comment_type' is one of 'insight'|'caution'|'impact', \
             'quality' is one of 'ok'|'shortened'|'fallback'.",
            hard_limit = hard_limit,
            comment_max = self.comment_max_chars,
        );
        let user = build_user_prompt(title, source, body);

        let raw = self.client.complete_json(system, user).await?;
        Ok(parse_summary_payload(
            &raw,
            hard_limit,
            Some(self.comment_max_chars),
        ))
    }
}

fn build_user_prompt(title: &str, source: &str, body: &str) -> String {
    if body.is_empty() {
        format!("Source: {source}\n[Headline]\n{title}\n\nJSON only.")
    } else {
        let snippet = truncate_chars(body, BODY_SNIPPET_CHARS);
        format!(
            "Source: {source}\n[Headline]\n{title}\n\n\
             Below is an excerpt of the article body. Prefer facts absent from \
             the headline (numbers, names, places, times, causes).\n\
             [Body]\n{snippet}\n\nJSON only."
        )
    }
}

/// Keep a caller-supplied summary length inside sane bounds.
pub fn clamp_summary_limit(max_chars: usize) -> usize {
    max_chars.clamp(MIN_SUMMARY_CHARS, MAX_SUMMARY_CHARS)
}

fn truncate_chars(s: &str, limit: usize) -> String {
    s.chars().take(limit).collect()
}

/// Parse a model reply into a `SummaryRecord`, defensively.
///
/// The model occasionally returns plain text, keywords as a JSON-encoded or
/// comma-joined string, or a comment type outside the known set; none of
/// those may surface as errors. `comment_limit` is `None` for the basic
/// variant, which never emits comment fields.
pub fn parse_summary_payload(
    raw: &str,
    hard_limit: usize,
    comment_limit: Option<usize>,
) -> SummaryRecord {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => {
            // Plain text slipped through JSON mode; keep it as the summary.
            return SummaryRecord {
                summary: truncate_chars(raw.trim(), hard_limit),
                keywords: Vec::new(),
                comment: None,
                comment_type: None,
                quality: Quality::Fallback,
            };
        }
    };

    let summary_full = value
        .get("summary")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .trim()
        .to_string();
    let summary = truncate_chars(&summary_full, hard_limit);
    let truncated = summary.chars().count() < summary_full.chars().count();

    let mut keywords = parse_keywords(value.get("keywords"));
    keywords.truncate(6);

    let (comment, comment_type) = match comment_limit {
        Some(limit) => {
            let comment = value
                .get("comment")
                .and_then(|v| v.as_str())
                .map(|c| truncate_chars(c.trim(), limit))
                .filter(|c| !c.is_empty());
            let comment_type = value
                .get("comment_type")
                .and_then(|v| v.as_str())
                .and_then(CommentType::parse);
            (comment, comment_type)
        }
        None => (None, None),
    };

    let mut quality = value
        .get("quality")
        .and_then(|v| v.as_str())
        .and_then(Quality::parse)
        .unwrap_or(Quality::Ok);
    if truncated && quality == Quality::Ok {
        quality = Quality::Shortened;
    }

    SummaryRecord {
        summary,
        keywords,
        comment,
        comment_type,
        quality,
    }
}

fn parse_keywords(value: Option<&serde_json::Value>) -> Vec<String> {
    match value {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(serde_json::Value::String(s)) => {
            // Sometimes the array comes back JSON-encoded inside a string.
            if let Ok(serde_json::Value::Array(items)) = serde_json::from_str(s) {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect()
            } else {
                s.split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect()
            }
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_payload() {
        let raw = r#"{"summary":"BOJ holds rates steady, trims outlook.","keywords":["BOJ","rates"],"quality":"ok"}"#;
        let record = parse_summary_payload(raw, 60, None);

        assert_eq!(record.summary, "BOJ holds rates steady, trims outlook.");
        assert_eq!(record.keywords, vec!["BOJ", "rates"]);
        assert_eq!(record.quality, Quality::Ok);
        assert_eq!(record.comment, None);
        assert_eq!(record.comment_type, None);
    }

    #[test]
    fn plain_text_reply_becomes_fallback() {
        let record = parse_summary_payload("Sorry, I cannot answer that.", 60, None);

        assert_eq!(record.quality, Quality::Fallback);
        assert_eq!(record.summary, "Sorry, I cannot answer that.");
        assert!(record.keywords.is_empty());
    }

    #[test]
    fn overlong_summary_is_truncated_and_marked_shortened() {
        let long = "a".repeat(200);
        let raw = format!(r#"{{"summary":"{long}","keywords":[],"quality":"ok"}}"#);
        let record = parse_summary_payload(&raw, 60, None);

        assert_eq!(record.summary.chars().count(), 60);
        assert_eq!(record.quality, Quality::Shortened);
    }

    #[test]
    fn keywords_accepted_as_comma_string() {
        let raw = r#"{"summary":"s","keywords":"tokyo, rain , ","quality":"ok"}"#;
        let record = parse_summary_payload(raw, 60, None);
        assert_eq!(record.keywords, vec!["tokyo", "rain"]);
    }

    #[test]
    fn keywords_accepted_as_json_encoded_string() {
        let raw = r#"{"summary":"s","keywords":"[\"tokyo\",\"rain\"]","quality":"ok"}"#;
        let record = parse_summary_payload(raw, 60, None);
        assert_eq!(record.keywords, vec!["tokyo", "rain"]);
    }

    #[test]
    fn keywords_capped_at_six() {
        let raw = r#"{"summary":"s","keywords":["a","b","c","d","e","f","g","h"],"quality":"ok"}"#;
        let record = parse_summary_payload(raw, 60, None);
        assert_eq!(record.keywords.len(), 6);
    }

    #[test]
    fn enriched_payload_fills_comment_fields() {
        let raw = r#"{"summary":"s","keywords":[],"comment":"Watch the yen.","comment_type":"caution","quality":"ok"}"#;
        let record = parse_summary_payload(raw, 60, Some(80));

        assert_eq!(record.comment.as_deref(), Some("Watch the yen."));
        assert_eq!(record.comment_type, Some(CommentType::Caution));
    }

    #[test]
    fn unknown_comment_type_becomes_none() {
        let raw = r#"{"summary":"s","keywords":[],"comment":"c","comment_type":"opinion","quality":"ok"}"#;
        let record = parse_summary_payload(raw, 60, Some(80));
        assert_eq!(record.comment_type, None);
    }

    #[test]
    fn basic_variant_drops_comment_fields_even_if_present() {
        let raw = r#"{"summary":"s","keywords":[],"comment":"c","comment_type":"insight","quality":"ok"}"#;
        let record = parse_summary_payload(raw, 60, None);
        assert_eq!(record.comment, None);
        assert_eq!(record.comment_type, None);
    }

    #[test]
    fn summary_limit_is_clamped() {
        assert_eq!(clamp_summary_limit(5), 30);
        assert_eq!(clamp_summary_limit(60), 60);
        assert_eq!(clamp_summary_limit(500), 120);
    }
}
