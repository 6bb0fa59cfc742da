//! Keyword density and LSI coverage.

use serde::{Deserialize, Serialize};

use super::readability::word_count;
use crate::lexicon::{contains_phrase, count_phrase};

/// Occurrences and density of one keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordStat {
    pub keyword: String,
    pub occurrences: usize,
    /// Share of body words taken by this keyword, in percent
    pub density: f64,
}

/// Keyword density across a set of keywords.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeywordDensityReport {
    pub total_words: usize,
    pub keywords: Vec<KeywordStat>,
    /// Combined density of all keywords, in percent
    pub overall_density: f64,
}

impl KeywordDensityReport {
    pub fn get(&self, keyword: &str) -> Option<&KeywordStat> {
        self.keywords
            .iter()
            .find(|stat| stat.keyword.eq_ignore_ascii_case(keyword))
    }
}

/// Which LSI keywords a text uses.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LsiCoverage {
    pub found: Vec<String>,
    pub missing: Vec<String>,
    /// Fraction of LSI keywords found (0.0 - 1.0)
    pub ratio: f64,
}

pub struct KeywordAnalyzer;

impl KeywordAnalyzer {
    /// Density of one keyword: `occurrences x words in keyword / total
    /// words x 100`. Matching is whole-word and case-insensitive.
    pub fn keyword_density(content: &str, keyword: &str) -> f64 {
        let total = word_count(content);
        if total == 0 {
            return 0.0;
        }
        let occurrences = count_phrase(content, keyword);
        occurrences as f64 * word_count(keyword) as f64 / total as f64 * 100.0
    }

    /// Density for each keyword plus the combined density.
    pub fn analyze_keyword_density<S: AsRef<str>>(
        content: &str,
        keywords: &[S],
    ) -> KeywordDensityReport {
        let total_words = word_count(content);
        let keywords: Vec<KeywordStat> = keywords
            .iter()
            .map(|keyword| {
                let keyword = keyword.as_ref();
                let occurrences = count_phrase(content, keyword);
                let density = if total_words == 0 {
                    0.0
                } else {
                    occurrences as f64 * word_count(keyword) as f64 / total_words as f64 * 100.0
                };
                KeywordStat {
                    keyword: keyword.to_string(),
                    occurrences,
                    density,
                }
            })
            .collect();
        let overall_density = keywords.iter().map(|stat| stat.density).sum();

        KeywordDensityReport {
            total_words,
            keywords,
            overall_density,
        }
    }

    /// Split LSI keywords into found and missing.
    pub fn lsi_coverage<S: AsRef<str>>(content: &str, lsi_keywords: &[S]) -> LsiCoverage {
        let (found, missing): (Vec<String>, Vec<String>) = lsi_keywords
            .iter()
            .map(|k| k.as_ref().to_string())
            .partition(|k| contains_phrase(content, k));
        let ratio = if lsi_keywords.is_empty() {
            1.0
        } else {
            found.len() as f64 / lsi_keywords.len() as f64
        };
        LsiCoverage {
            found,
            missing,
            ratio,
        }
    }

    /// How many occurrences must go for `keyword` to drop to `max_density`.
    pub fn excess_occurrences(content: &str, keyword: &str, max_density: f64) -> usize {
        let total = word_count(content) as f64;
        let per_occurrence = word_count(keyword).max(1) as f64;
        let allowed = (max_density / 100.0 * total / per_occurrence).floor() as usize;
        count_phrase(content, keyword).saturating_sub(allowed)
    }
}
