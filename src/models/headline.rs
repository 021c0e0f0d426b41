use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One persisted row: a collected article reference plus its derived
/// enrichment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Headline {
    pub id: i64,
    pub source: String,
    pub title: String,
    pub url: String,
    /// Collection date, not publish date.
    pub date: NaiveDate,
    pub category: Option<String>,
    pub summary: Option<String>,
    /// Comma-joined keyword list.
    pub keywords: Option<String>,
    pub comment: Option<String>,
    pub comment_type: Option<CommentType>,
    pub quality: Quality,
    pub body: Option<String>,
}

/// A headline staged for insertion, before an id is assigned.
#[derive(Debug, Clone)]
pub struct NewHeadline {
    pub source: String,
    pub title: String,
    pub url: String,
    pub date: NaiveDate,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub keywords: Option<String>,
    pub comment: Option<String>,
    pub comment_type: Option<CommentType>,
    pub quality: Quality,
    pub body: Option<String>,
}

/// How much of the enrichment pipeline succeeded for a record.
/// Always populated, even for failed enrichment attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Ok,
    Shortened,
    Fallback,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Ok => "ok",
            Quality::Shortened => "shortened",
            Quality::Fallback => "fallback",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ok" => Some(Quality::Ok),
            "shortened" => Some(Quality::Shortened),
            "fallback" => Some(Quality::Fallback),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentType {
    Insight,
    Caution,
    Impact,
}

impl CommentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentType::Insight => "insight",
            CommentType::Caution => "caution",
            CommentType::Impact => "impact",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "insight" => Some(CommentType::Insight),
            "caution" => Some(CommentType::Caution),
            "impact" => Some(CommentType::Impact),
            _ => None,
        }
    }
}

/// Structured summarizer output. The basic summarizer leaves the comment
/// fields empty; the enriched one fills all five.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub summary: String,
    pub keywords: Vec<String>,
    pub comment: Option<String>,
    pub comment_type: Option<CommentType>,
    pub quality: Quality,
}

impl SummaryRecord {
    /// The record used when summarization fails outright: every enrichment
    /// field absent, quality forced to fallback.
    pub fn fallback() -> Self {
        Self {
            summary: String::new(),
            keywords: Vec::new(),
            comment: None,
            comment_type: None,
            quality: Quality::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_round_trips_through_strings() {
        for q in [Quality::Ok, Quality::Shortened, Quality::Fallback] {
            assert_eq!(Quality::parse(q.as_str()), Some(q));
        }
        assert_eq!(Quality::parse("great"), None);
    }

    #[test]
    fn comment_type_parse_is_lenient_about_case() {
        assert_eq!(CommentType::parse(" Insight "), Some(CommentType::Insight));
        assert_eq!(CommentType::parse("IMPACT"), Some(CommentType::Impact));
        assert_eq!(CommentType::parse("opinion"), None);
    }
}
