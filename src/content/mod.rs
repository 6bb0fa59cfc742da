//! Location page content generation.
//!
//! This module turns research data into page prose: section templates are
//! filled with research facts, then passed through brand-voice and
//! sensitivity substitutions.

pub mod engine;
pub mod templates;

pub use engine::ContentGenerationEngine;
pub use templates::{render_template, slugify, TemplateContext};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lexicon::{count_phrase, Lexicon};
use crate::seo::keywords::KeywordAnalyzer;
use crate::seo::readability::{flesch_reading_ease, word_count};

/// Register of the page copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Professional,
    Warm,
    Clinical,
}

/// How much reassurance the opening copy carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmpathyLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl EmpathyLevel {
    /// Index into `Lexicon::opening_phrases`.
    pub fn index(self) -> usize {
        match self {
            EmpathyLevel::Low => 0,
            EmpathyLevel::Medium => 1,
            EmpathyLevel::High => 2,
        }
    }
}

/// Brand voice settings for generated copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandVoice {
    pub tone: Tone,
    pub empathy: EmpathyLevel,
    /// Seed for the opening phrase picker; random per engine when unset
    pub seed: Option<u64>,
}

/// A question and answer shown in the page FAQ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Named prose sections of a location page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSections {
    pub hero: String,
    pub demographics: String,
    pub services: String,
    pub why_choose_us: String,
    pub accessibility: String,
    pub competitive_edge: String,
    pub cta: String,
    pub faq: Vec<FaqEntry>,
}

impl ContentSections {
    /// Prose sections in page order, with their names.
    pub fn named(&self) -> [(&'static str, &str); 7] {
        [
            ("hero", &self.hero),
            ("demographics", &self.demographics),
            ("services", &self.services),
            ("why_choose_us", &self.why_choose_us),
            ("accessibility", &self.accessibility),
            ("competitive_edge", &self.competitive_edge),
            ("cta", &self.cta),
        ]
    }

    /// Mutable access to a prose section by name.
    pub fn section_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "hero" => Some(&mut self.hero),
            "demographics" => Some(&mut self.demographics),
            "services" => Some(&mut self.services),
            "why_choose_us" => Some(&mut self.why_choose_us),
            "accessibility" => Some(&mut self.accessibility),
            "competitive_edge" => Some(&mut self.competitive_edge),
            "cta" => Some(&mut self.cta),
            _ => None,
        }
    }

    /// Mutable access to every prose string, FAQ answers included.
    pub fn texts_mut(&mut self) -> Vec<&mut String> {
        let mut texts: Vec<&mut String> = vec![
            &mut self.hero,
            &mut self.demographics,
            &mut self.services,
            &mut self.why_choose_us,
            &mut self.accessibility,
            &mut self.competitive_edge,
            &mut self.cta,
        ];
        texts.extend(self.faq.iter_mut().map(|entry| &mut entry.answer));
        texts
    }

    /// All section prose joined into one body, FAQ last.
    pub fn body_text(&self) -> String {
        let mut body: Vec<&str> = self
            .named()
            .into_iter()
            .map(|(_, text)| text)
            .filter(|text| !text.trim().is_empty())
            .collect();
        for entry in &self.faq {
            body.push(&entry.question);
            body.push(&entry.answer);
        }
        body.join("\n\n")
    }
}

/// Title, description and keywords for the page head.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoMetadata {
    pub title: String,
    pub description: String,
    pub h1: String,
    pub keywords: Vec<String>,
}

/// Figures computed from the generated prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub word_count: usize,
    pub readability_score: f64,
    /// Density of the focus keyword, in percent
    pub keyword_density: f64,
    pub location_mentions: usize,
    pub generated_at: DateTime<Utc>,
}

impl Default for ContentMetadata {
    fn default() -> Self {
        Self {
            word_count: 0,
            readability_score: 0.0,
            keyword_density: 0.0,
            location_mentions: 0,
            generated_at: Utc::now(),
        }
    }
}

/// Everything generated for one location page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub location: String,
    pub city: String,
    pub slug: String,
    pub sections: ContentSections,
    pub seo: SeoMetadata,
    pub metadata: ContentMetadata,
}

impl GeneratedContent {
    /// Full page body text.
    pub fn body_text(&self) -> String {
        self.sections.body_text()
    }

    /// Recompute word count, readability and focus keyword density.
    ///
    /// `generated_at` is left untouched.
    pub fn refresh_metadata(&mut self, lexicon: &Lexicon) {
        let body = self.body_text();
        self.metadata.word_count = word_count(&body);
        self.metadata.readability_score = flesch_reading_ease(&body);
        self.metadata.location_mentions = count_phrase(&body, &self.location);
        self.metadata.keyword_density = lexicon
            .primary_keywords
            .first()
            .map(|focus| KeywordAnalyzer::keyword_density(&body, focus))
            .unwrap_or(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections() -> ContentSections {
        ContentSections {
            hero: "Hero text.".to_string(),
            services: "Services text.".to_string(),
            faq: vec![FaqEntry {
                question: "Where?".to_string(),
                answer: "Here.".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_body_text_skips_empty_sections() {
        let body = sections().body_text();
        assert_eq!(body, "Hero text.\n\nServices text.\n\nWhere?\n\nHere.");
    }

    #[test]
    fn test_texts_mut_includes_faq_answers() {
        let mut sections = sections();
        for text in sections.texts_mut() {
            text.push('!');
        }
        assert_eq!(sections.hero, "Hero text.!");
        assert_eq!(sections.faq[0].answer, "Here.!");
        assert_eq!(sections.faq[0].question, "Where?");
    }

    #[test]
    fn test_refresh_metadata() {
        let mut content = GeneratedContent {
            location: "Domlur".to_string(),
            sections: ContentSections {
                hero: "A gynecologist in Domlur. Visit Domlur today.".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        content.refresh_metadata(&Lexicon::default());
        assert_eq!(content.metadata.word_count, 7);
        assert_eq!(content.metadata.location_mentions, 2);
        assert!((content.metadata.keyword_density - 100.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_empathy_index() {
        assert_eq!(EmpathyLevel::Low.index(), 0);
        assert_eq!(EmpathyLevel::High.index(), 2);
    }
}
