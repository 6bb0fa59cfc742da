//! Shared vocabulary for content generation, scoring and validation.
//!
//! Every component that matches or rewrites words receives a `Lexicon`
//! explicitly, so the generator, the SEO scorer, the optimizer and the QA
//! checks all agree on the same keyword lists.

use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::content::Tone;

/// Canonical terms, synonyms and rule lists used across the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    /// Service keywords the pages target, localised with the location name
    pub primary_keywords: Vec<String>,
    /// Related phrases expected to co-occur with the primary keywords
    pub lsi_keywords: Vec<String>,
    /// Word substitutions for the professional tone
    pub professional_voice: Vec<(String, String)>,
    /// Word substitutions for the warm tone
    pub warm_voice: Vec<(String, String)>,
    /// Word substitutions for the clinical tone
    pub clinical_voice: Vec<(String, String)>,
    /// Replacements applied to every page regardless of tone
    pub sensitivity_replacements: Vec<(String, String)>,
    /// Synonyms used to thin out over-used keywords
    pub synonyms: Vec<(String, String)>,
    /// Simpler alternatives for long words, used to lift readability
    pub simpler_words: Vec<(String, String)>,
    /// Claims a medical page must never make
    pub prohibited_claims: Vec<String>,
    /// Superlatives that need a qualifier or source
    pub unqualified_superlatives: Vec<String>,
    /// Phrases that count as a medical disclaimer
    pub disclaimer_markers: Vec<String>,
    /// Phrases that reference a qualified professional
    pub professional_references: Vec<String>,
    /// Clinical vocabulary that triggers the professional-reference rule
    pub medical_terms: Vec<String>,
    /// Site paths with their anchor text; bare mentions of these paths in
    /// prose count as internal links
    pub internal_links: Vec<(String, String)>,
    /// Opening phrases for low, medium and high empathy
    pub opening_phrases: [Vec<String>; 3],
    /// Words that break the brand register
    pub informal_words: Vec<String>,
    /// Standard disclaimer appended to generated pages
    pub disclaimer: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

impl Default for Lexicon {
    fn default() -> Self {
        Self {
            primary_keywords: owned(&[
                "gynecologist",
                "obstetrician",
                "pregnancy care",
                "fertility treatment",
                "women's health",
            ]),
            lsi_keywords: owned(&[
                "prenatal checkup",
                "high-risk pregnancy",
                "PCOS treatment",
                "laparoscopic surgery",
                "menstrual health",
                "infertility specialist",
                "normal delivery",
                "antenatal care",
            ]),
            professional_voice: pairs(&[
                ("help", "assist"),
                ("big", "significant"),
                ("lots of", "many"),
                ("kids", "children"),
                ("worried", "concerned"),
            ]),
            warm_voice: pairs(&[
                ("patients", "women and families"),
                ("assist", "support"),
                ("concerned", "worried"),
            ]),
            clinical_voice: pairs(&[
                ("checkup", "clinical assessment"),
                ("help", "manage"),
                ("worried", "concerned"),
            ]),
            sensitivity_replacements: pairs(&[
                ("infertile", "facing fertility challenges"),
                ("barren", "facing fertility challenges"),
                ("failed pregnancy", "pregnancy loss"),
                ("old mothers", "mothers over 35"),
                ("abnormal", "atypical"),
            ]),
            synonyms: pairs(&[
                ("gynecologist", "women's health specialist"),
                ("obstetrician", "pregnancy specialist"),
                ("pregnancy care", "maternity care"),
                ("fertility treatment", "fertility care"),
            ]),
            simpler_words: pairs(&[
                ("comprehensive", "complete"),
                ("individualized", "personal"),
                ("consultation", "visit"),
                ("approximately", "about"),
                ("additionally", "also"),
                ("utilize", "use"),
                ("facilitate", "help"),
                ("accessibility", "access"),
            ]),
            prohibited_claims: owned(&[
                "guaranteed results",
                "100% success",
                "guaranteed pregnancy",
                "cure infertility",
                "miracle",
                "risk-free",
                "no side effects",
            ]),
            unqualified_superlatives: owned(&[
                "best gynecologist",
                "number one",
                "#1",
                "top-rated in the world",
                "most successful",
            ]),
            disclaimer_markers: owned(&[
                "consult",
                "individual results may vary",
                "medical advice",
                "results vary",
            ]),
            professional_references: owned(&[
                "dr.",
                "doctor",
                "specialist",
                "board-certified",
                "qualified",
            ]),
            medical_terms: owned(&[
                "pcos",
                "laparoscopy",
                "hysteroscopy",
                "ivf",
                "iui",
                "endometriosis",
                "fibroids",
                "c-section",
            ]),
            internal_links: pairs(&[
                ("/services/pregnancy-care", "pregnancy care"),
                ("/services/fertility", "fertility treatment"),
                ("/services/pcos", "PCOS treatment"),
                ("/services/surgery", "gynecologic surgery"),
                ("/book-appointment", "book an appointment"),
                ("/about", "about our clinic"),
            ]),
            opening_phrases: [
                owned(&[
                    "Experienced gynecologist",
                    "Specialist gynecologist care",
                    "Consult a gynecologist",
                ]),
                owned(&[
                    "Trusted care from a gynecologist",
                    "Personal attention from a gynecologist",
                    "Compassionate support from a gynecologist",
                ]),
                owned(&[
                    "Gentle, unhurried care from a gynecologist",
                    "A caring gynecologist close to home",
                    "A gynecologist who listens, right here",
                ]),
            ],
            informal_words: owned(&["gonna", "wanna", "awesome", "super cheap", "lol"]),
            disclaimer: "This page is for general information and is not medical advice. \
                         Please consult our doctor for guidance specific to you; \
                         individual results may vary."
                .to_string(),
        }
    }
}

impl Lexicon {
    /// Substitution table for a brand tone.
    pub fn voice_for(&self, tone: Tone) -> &[(String, String)] {
        match tone {
            Tone::Professional => &self.professional_voice,
            Tone::Warm => &self.warm_voice,
            Tone::Clinical => &self.clinical_voice,
        }
    }

    /// Paths of the known internal pages.
    pub fn internal_paths(&self) -> Vec<String> {
        self.internal_links.iter().map(|(path, _)| path.clone()).collect()
    }

    /// Primary keywords localised with the location name, e.g.
    /// "gynecologist in Indira Nagar".
    pub fn localized_keywords(&self, location: &str) -> Vec<String> {
        self.primary_keywords
            .iter()
            .map(|k| format!("{k} in {location}"))
            .collect()
    }
}

/// Build a case-insensitive whole-word pattern for a phrase.
pub fn word_pattern(phrase: &str) -> Option<Regex> {
    // `\b` does not anchor next to non-word characters such as '#'
    let escaped = regex::escape(phrase);
    let starts_word = phrase.chars().next().is_some_and(|c| c.is_alphanumeric());
    let ends_word = phrase.chars().last().is_some_and(|c| c.is_alphanumeric());
    let pattern = format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        escaped,
        if ends_word { r"\b" } else { "" }
    );
    RegexBuilder::new(&pattern).case_insensitive(true).build().ok()
}

/// Count whole-word, case-insensitive occurrences of a phrase.
pub fn count_phrase(text: &str, phrase: &str) -> usize {
    if phrase.trim().is_empty() {
        return 0;
    }
    word_pattern(phrase).map_or(0, |re| re.find_iter(text).count())
}

/// Whether the text contains the phrase as a whole word.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    count_phrase(text, phrase) > 0
}

/// Replace whole-word occurrences of each `from` with `to`.
///
/// Matching is case-insensitive and a capitalised match keeps a capital
/// first letter in the replacement. Substrings of longer words are left
/// alone, so replacing "help" does not touch "Helpline".
pub fn apply_replacements(text: &str, replacements: &[(String, String)]) -> String {
    let mut out = text.to_string();
    for (from, to) in replacements {
        let Some(re) = word_pattern(from) else {
            continue;
        };
        out = re
            .replace_all(&out, |caps: &Captures| match_case(&caps[0], to))
            .into_owned();
    }
    out
}

/// Replace at most `limit` whole-word occurrences of `from`, starting from
/// the last one so the earliest mentions stay intact.
pub fn replace_trailing(text: &str, from: &str, to: &str, limit: usize) -> String {
    let Some(re) = word_pattern(from) else {
        return text.to_string();
    };
    let matches: Vec<_> = re.find_iter(text).collect();
    let mut out = text.to_string();
    for m in matches.iter().rev().take(limit) {
        let replacement = match_case(m.as_str(), to);
        out.replace_range(m.start()..m.end(), &replacement);
    }
    out
}

fn match_case(matched: &str, replacement: &str) -> String {
    let capitalised = matched.chars().next().is_some_and(|c| c.is_uppercase());
    if !capitalised {
        return replacement.to_string();
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replacements_respect_word_boundaries() {
        let table = pairs(&[("help", "assist")]);
        let out = apply_replacements("Call our Helpline and we will help you.", &table);
        assert_eq!(out, "Call our Helpline and we will assist you.");
    }

    #[test]
    fn test_replacements_keep_leading_capital() {
        let table = pairs(&[("help", "assist")]);
        assert_eq!(apply_replacements("Help is here", &table), "Assist is here");
    }

    #[test]
    fn test_multi_word_replacement() {
        let table = pairs(&[("failed pregnancy", "pregnancy loss")]);
        assert_eq!(
            apply_replacements("Support after a failed pregnancy.", &table),
            "Support after a pregnancy loss."
        );
    }

    #[test]
    fn test_count_phrase_case_insensitive() {
        assert_eq!(count_phrase("Gynecologist, gynecologist! GYNECOLOGIST", "gynecologist"), 3);
        assert_eq!(count_phrase("gynecologists", "gynecologist"), 0);
        assert_eq!(count_phrase("anything", ""), 0);
    }

    #[test]
    fn test_count_phrase_with_symbol() {
        assert_eq!(count_phrase("We are #1 in town", "#1"), 1);
    }

    #[test]
    fn test_replace_trailing_keeps_first_mentions() {
        let out = replace_trailing("a gynecologist, a gynecologist, a gynecologist", "gynecologist", "specialist", 1);
        assert_eq!(out, "a gynecologist, a gynecologist, a specialist");
    }

    #[test]
    fn test_localized_keywords() {
        let lexicon = Lexicon::default();
        let keywords = lexicon.localized_keywords("Indira Nagar");
        assert_eq!(keywords[0], "gynecologist in Indira Nagar");
        assert_eq!(keywords.len(), lexicon.primary_keywords.len());
    }
}
