//! Flesch Reading Ease with a vowel-group syllable heuristic.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+(?:\s+|$)|\n\s*\n").expect("valid sentence regex"));

/// Coarse reading-difficulty band for a Flesch score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadabilityBand {
    VeryEasy,
    Easy,
    FairlyEasy,
    Standard,
    FairlyDifficult,
    Difficult,
    VeryDifficult,
}

impl ReadabilityBand {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 90.0 => Self::VeryEasy,
            s if s >= 80.0 => Self::Easy,
            s if s >= 70.0 => Self::FairlyEasy,
            s if s >= 60.0 => Self::Standard,
            s if s >= 50.0 => Self::FairlyDifficult,
            s if s >= 30.0 => Self::Difficult,
            _ => Self::VeryDifficult,
        }
    }
}

/// Readability figures for a block of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityReport {
    pub sentences: usize,
    pub words: usize,
    pub syllables: usize,
    pub avg_sentence_length: f64,
    pub avg_syllables_per_word: f64,
    pub flesch_score: f64,
    pub band: ReadabilityBand,
}

/// Words in the text: whitespace-separated tokens with at least one
/// alphanumeric character, stripped of surrounding punctuation.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|token| !token.is_empty())
}

pub fn word_count(text: &str) -> usize {
    words(text).count()
}

/// Split text into sentences on terminal punctuation and blank lines.
pub fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|sentence| word_count(sentence) > 0)
        .collect()
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Approximate syllable count for an English word.
///
/// Drops a silent trailing "e"/"es"/"ed", ignores a leading "y" and counts
/// vowel groups, where a group longer than two letters counts once per
/// two letters. Every word has at least one syllable.
pub fn count_syllables(word: &str) -> usize {
    let word: String = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    if word.is_empty() {
        return 0;
    }
    if word.len() <= 3 {
        return 1;
    }

    let chars: Vec<char> = word.chars().collect();
    let n = chars.len();
    let keeps_e = |c: char| c == 'l' || is_vowel(c);
    let trimmed = if word.ends_with("ed") {
        &chars[..n - 2]
    } else if word.ends_with("es") && !keeps_e(chars[n - 3]) {
        &chars[..n - 2]
    } else if word.ends_with('e') && !keeps_e(chars[n - 2]) {
        &chars[..n - 1]
    } else {
        &chars[..]
    };
    let trimmed = match trimmed.first() {
        Some('y') => &trimmed[1..],
        _ => trimmed,
    };

    let mut count = 0;
    let mut run: usize = 0;
    for &c in trimmed {
        if is_vowel(c) {
            run += 1;
        } else if run > 0 {
            count += run.div_ceil(2);
            run = 0;
        }
    }
    count += run.div_ceil(2);
    count.max(1)
}

/// Raw Flesch Reading Ease formula, unclamped.
pub fn flesch_formula(words: usize, sentences: usize, syllables: usize) -> f64 {
    if words == 0 {
        return 0.0;
    }
    let sentences = sentences.max(1) as f64;
    let words_f = words as f64;
    206.835 - 1.015 * (words_f / sentences) - 84.6 * (syllables as f64 / words_f)
}

/// Analyze text readability. The Flesch score is clamped to [0, 100].
pub fn analyze(text: &str) -> ReadabilityReport {
    let word_list: Vec<&str> = words(text).collect();
    let sentences = split_sentences(text).len();
    let syllables: usize = word_list.iter().map(|w| count_syllables(w)).sum();
    let word_total = word_list.len();

    let flesch_score = flesch_formula(word_total, sentences, syllables).clamp(0.0, 100.0);
    let (avg_sentence_length, avg_syllables_per_word) = if word_total == 0 {
        (0.0, 0.0)
    } else {
        (
            word_total as f64 / sentences.max(1) as f64,
            syllables as f64 / word_total as f64,
        )
    };

    ReadabilityReport {
        sentences,
        words: word_total,
        syllables,
        avg_sentence_length,
        avg_syllables_per_word,
        flesch_score,
        band: ReadabilityBand::from_score(flesch_score),
    }
}

/// Clamped Flesch Reading Ease for a text.
pub fn flesch_reading_ease(text: &str) -> f64 {
    analyze(text).flesch_score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_syllables() {
        assert_eq!(count_syllables("the"), 1);
        assert_eq!(count_syllables("make"), 1);
        assert_eq!(count_syllables("table"), 2);
        assert_eq!(count_syllables("readability"), 5);
        assert_eq!(count_syllables("pregnancy"), 3);
        assert_eq!(count_syllables("yellow"), 2);
        assert_eq!(count_syllables("rhythm"), 1);
        assert_eq!(count_syllables("123"), 0);
    }

    #[test]
    fn test_word_count_ignores_punctuation_tokens() {
        assert_eq!(word_count("Hello, world! -- it's me."), 4);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_split_sentences() {
        let sentences = split_sentences("One two. Three four! Five?\n\nSix seven");
        assert_eq!(sentences, vec!["One two", "Three four", "Five", "Six seven"]);
    }

    #[test]
    fn test_decimal_point_is_not_a_sentence_break() {
        assert_eq!(split_sentences("Rated 4.5 by patients. Open daily.").len(), 2);
    }

    #[test]
    fn test_flesch_formula_exact() {
        let score = flesch_formula(100, 5, 150);
        assert!((score - 59.635).abs() < 1e-9);
    }

    #[test]
    fn test_flesch_formula_empty() {
        assert_eq!(flesch_formula(0, 0, 0), 0.0);
    }

    #[test]
    fn test_analyze_clamps_and_bands() {
        let report = analyze("The cat sat on the mat.");
        assert_eq!(report.words, 6);
        assert_eq!(report.sentences, 1);
        assert_eq!(report.flesch_score, 100.0);
        assert_eq!(report.band, ReadabilityBand::VeryEasy);
    }

    #[test]
    fn test_band_boundaries() {
        assert_eq!(ReadabilityBand::from_score(60.0), ReadabilityBand::Standard);
        assert_eq!(ReadabilityBand::from_score(59.9), ReadabilityBand::FairlyDifficult);
        assert_eq!(ReadabilityBand::from_score(0.0), ReadabilityBand::VeryDifficult);
    }
}
