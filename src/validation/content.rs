//! Structural checks on generated content.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::ScoringConfig;
use crate::content::GeneratedContent;
use crate::lexicon::count_phrase;
use crate::seo::readability::{split_sentences, word_count};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[a-z_]+\}").expect("valid placeholder regex"));

/// Sentences shorter than this may repeat without being flagged.
const MIN_REPEATED_SENTENCE_WORDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentIssue {
    pub level: IssueLevel,
    /// Section the issue was found in, if it is local to one
    pub section: Option<String>,
    pub message: String,
}

impl ContentIssue {
    fn error(section: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            section: section.map(str::to_string),
            message: message.into(),
        }
    }

    fn warning(section: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            section: section.map(str::to_string),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentValidation {
    /// True when no error-level issue was found
    pub is_valid: bool,
    pub issues: Vec<ContentIssue>,
    pub score: f64,
}

impl ContentValidation {
    pub fn errors(&self) -> impl Iterator<Item = &ContentIssue> {
        self.issues.iter().filter(|i| i.level == IssueLevel::Error)
    }
}

/// Checks generated content for template leftovers and thin or repetitive
/// copy.
#[derive(Debug, Clone)]
pub struct ContentQualityValidator {
    min_word_count: usize,
    min_location_mentions: usize,
    error_penalty: f64,
    warning_penalty: f64,
}

impl ContentQualityValidator {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            min_word_count: config.min_word_count,
            min_location_mentions: config.min_location_mentions,
            error_penalty: config.content_error_penalty,
            warning_penalty: config.content_warning_penalty,
        }
    }

    pub fn validate(&self, content: &GeneratedContent) -> ContentValidation {
        let mut issues = Vec::new();
        let sections = &content.sections;

        for (name, text) in sections.named() {
            if text.trim().is_empty() {
                issues.push(ContentIssue::error(Some(name), format!("{name} section is empty")));
            }
            if let Some(found) = PLACEHOLDER.find(text) {
                issues.push(ContentIssue::error(
                    Some(name),
                    format!("unreplaced placeholder {}", found.as_str()),
                ));
            }
        }
        for entry in &sections.faq {
            if PLACEHOLDER.is_match(&entry.question) || PLACEHOLDER.is_match(&entry.answer) {
                issues.push(ContentIssue::error(
                    Some("faq"),
                    format!("unreplaced placeholder in FAQ \"{}\"", entry.question),
                ));
            }
        }
        if sections.faq.is_empty() {
            issues.push(ContentIssue::warning(Some("faq"), "page has no FAQ entries"));
        }
        for (field, value) in [
            ("title", &content.seo.title),
            ("description", &content.seo.description),
            ("h1", &content.seo.h1),
        ] {
            if PLACEHOLDER.is_match(value) {
                issues.push(ContentIssue::error(
                    None,
                    format!("unreplaced placeholder in {field}"),
                ));
            }
        }

        let body = content.body_text();
        let words = word_count(&body);
        if words < self.min_word_count {
            issues.push(ContentIssue::error(
                None,
                format!("content is too short ({words} < {} words)", self.min_word_count),
            ));
        }

        let mentions = count_phrase(&body, &content.location);
        if mentions < self.min_location_mentions {
            issues.push(ContentIssue::warning(
                None,
                format!(
                    "location mentioned {mentions} times (expected at least {})",
                    self.min_location_mentions
                ),
            ));
        }

        for sentence in repeated_sentences(&body) {
            issues.push(ContentIssue::warning(
                None,
                format!("repeated sentence: \"{sentence}\""),
            ));
        }

        let penalty: f64 = issues
            .iter()
            .map(|issue| match issue.level {
                IssueLevel::Error => self.error_penalty,
                IssueLevel::Warning => self.warning_penalty,
            })
            .sum();

        ContentValidation {
            is_valid: !issues.iter().any(|i| i.level == IssueLevel::Error),
            issues,
            score: (100.0 - penalty).clamp(0.0, 100.0),
        }
    }
}

/// Sentences of five or more words that appear more than once, in order of
/// first appearance.
fn repeated_sentences(body: &str) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut repeated = Vec::new();
    for sentence in split_sentences(body) {
        if word_count(sentence) < MIN_REPEATED_SENTENCE_WORDS {
            continue;
        }
        let count = seen.entry(sentence.to_lowercase()).or_insert(0);
        *count += 1;
        if *count == 2 {
            repeated.push(sentence.to_string());
        }
    }
    repeated
}
