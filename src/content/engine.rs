//! Content generation engine.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::templates::{self, join_list, render_template, slugify, TemplateContext};
use super::{
    BrandVoice, ContentMetadata, ContentSections, FaqEntry, GeneratedContent, SeoMetadata,
};
use crate::lexicon::{apply_replacements, Lexicon};
use crate::location::ClinicProfile;
use crate::research::ResearchResult;

/// Number of LSI keywords added to the meta keyword list.
const META_LSI_KEYWORDS: usize = 4;

/// Fills section templates from research data in the configured brand voice.
///
/// Generation is deterministic for a given engine: the opening phrase is
/// drawn from an RNG seeded by the engine seed and the location slug.
#[derive(Debug, Clone)]
pub struct ContentGenerationEngine {
    lexicon: Lexicon,
    clinic: ClinicProfile,
    voice: BrandVoice,
    seed: u64,
}

impl ContentGenerationEngine {
    /// Create an engine. A random seed is drawn when the voice has none.
    pub fn new(lexicon: Lexicon, clinic: ClinicProfile, voice: BrandVoice) -> Self {
        let seed = voice.seed.unwrap_or_else(rand::random);
        Self {
            lexicon,
            clinic,
            voice,
            seed,
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn voice(&self) -> &BrandVoice {
        &self.voice
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generate all sections and SEO metadata for a location.
    pub fn generate_location_content(
        &self,
        research: &ResearchResult,
        location: &str,
    ) -> GeneratedContent {
        let slug = slugify(location);
        let city = if research.city.trim().is_empty() {
            location.to_string()
        } else {
            research.city.clone()
        };

        let ctx = self.build_context(research, location, &city, &slug);
        let render = |template: &str| self.apply_voice(&render_template(template, &ctx));

        let faq = templates::FAQ
            .into_iter()
            .map(|(question, answer)| FaqEntry {
                question: render_template(question, &ctx),
                answer: render(answer),
            })
            .collect();

        let sections = ContentSections {
            hero: render(templates::HERO),
            demographics: render(templates::DEMOGRAPHICS),
            services: render(templates::SERVICES),
            why_choose_us: render(templates::WHY_CHOOSE_US),
            accessibility: render(templates::ACCESSIBILITY),
            competitive_edge: render(templates::COMPETITIVE_EDGE),
            cta: format!("{} {}", render(templates::CTA), self.lexicon.disclaimer),
            faq,
        };

        let mut content = GeneratedContent {
            location: location.to_string(),
            city: city.clone(),
            slug,
            sections,
            seo: self.build_seo_metadata(location, &city),
            metadata: ContentMetadata {
                generated_at: Utc::now(),
                ..Default::default()
            },
        };
        content.refresh_metadata(&self.lexicon);

        debug!(
            location,
            words = content.metadata.word_count,
            readability = content.metadata.readability_score,
            "generated location content"
        );
        content
    }

    /// Apply tone substitutions, then sensitivity replacements.
    pub fn apply_voice(&self, text: &str) -> String {
        let voiced = apply_replacements(text, self.lexicon.voice_for(self.voice.tone));
        apply_replacements(&voiced, &self.lexicon.sensitivity_replacements)
    }

    /// Pick an opening phrase for the hero section.
    pub fn pick_opening(&self, slug: &str) -> String {
        let phrases = &self.lexicon.opening_phrases[self.voice.empathy.index()];
        if phrases.is_empty() {
            return capitalize(self.focus_keyword());
        }
        let mut rng = StdRng::seed_from_u64(self.seed ^ fnv1a(slug));
        phrases[rng.random_range(0..phrases.len())].clone()
    }

    fn focus_keyword(&self) -> &str {
        self.lexicon
            .primary_keywords
            .first()
            .map(String::as_str)
            .unwrap_or("gynecologist")
    }

    fn build_context(
        &self,
        research: &ResearchResult,
        location: &str,
        city: &str,
        slug: &str,
    ) -> TemplateContext {
        let population = if research.population.trim().is_empty() {
            "a large residential community".to_string()
        } else {
            format!("around {} residents", research.population.trim())
        };
        let competitor_count = match research.competitors.len() {
            0 => "several".to_string(),
            n => n.to_string(),
        };

        TemplateContext::new()
            .with("opening", self.pick_opening(slug))
            .with("location", location)
            .with("city", city)
            .with("clinic", self.clinic.name.as_str())
            .with("doctor", self.clinic.doctor.as_str())
            .with("population", population)
            .with(
                "languages",
                join_list(
                    &research.demographics.primary_languages,
                    3,
                    "English and the main local languages",
                ),
            )
            .with(
                "nearby",
                join_list(&research.nearby_areas, 4, "the surrounding neighbourhoods"),
            )
            .with(
                "hospitals",
                join_list(
                    &research.hospitals,
                    2,
                    &format!("leading multispeciality hospitals in {city}"),
                ),
            )
            .with(
                "landmarks",
                join_list(&research.landmarks, 3, &format!("the main roads of {location}")),
            )
            .with(
                "metro",
                join_list(&research.transport.metro_stations, 2, "the station closest to you"),
            )
            .with(
                "bus_routes",
                join_list(&research.transport.bus_routes, 3, "the main city routes"),
            )
            .with(
                "roads",
                join_list(&research.transport.major_roads, 2, &format!("central {location}")),
            )
            .with("competitor_count", competitor_count)
            .with("hours", self.clinic.opening_hours.as_str())
    }

    fn build_seo_metadata(&self, location: &str, city: &str) -> SeoMetadata {
        let focus = capitalize(self.focus_keyword());
        let mut keywords = self.lexicon.localized_keywords(location);
        keywords.extend(
            self.lexicon
                .lsi_keywords
                .iter()
                .take(META_LSI_KEYWORDS)
                .cloned(),
        );

        SeoMetadata {
            title: format!("{focus} in {location} | {}", self.clinic.name),
            description: format!(
                "Trusted {} in {location}, {city}. Pregnancy care, fertility treatment and PCOS \
                 care at {}. Book an appointment today.",
                self.focus_keyword(),
                self.clinic.name
            ),
            h1: format!("{focus} in {location}"),
            keywords,
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// FNV-1a, used to derive a per-location seed that is stable across runs.
fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{EmpathyLevel, Tone};
    use crate::research::{Competitor, TransportInfo};

    fn engine(seed: u64) -> ContentGenerationEngine {
        ContentGenerationEngine::new(
            Lexicon::default(),
            ClinicProfile::default(),
            BrandVoice {
                seed: Some(seed),
                ..Default::default()
            },
        )
    }

    fn research() -> ResearchResult {
        ResearchResult {
            location: "Indira Nagar".to_string(),
            city: "Bangalore".to_string(),
            landmarks: vec!["100 Feet Road".to_string(), "CMH Road".to_string()],
            nearby_areas: vec!["Domlur".to_string(), "HAL".to_string()],
            competitors: vec![Competitor::default(), Competitor::default()],
            transport: TransportInfo {
                metro_stations: vec!["Indiranagar Metro".to_string()],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_generation_is_idempotent() {
        let engine = engine(7);
        let first = engine.generate_location_content(&research(), "Indira Nagar");
        let second = engine.generate_location_content(&research(), "Indira Nagar");
        assert_eq!(first.sections, second.sections);
        assert_eq!(first.seo, second.seo);
    }

    #[test]
    fn test_empty_research_still_mentions_location() {
        let engine = engine(1);
        let research = ResearchResult::fallback("Indira Nagar", "");
        let content = engine.generate_location_content(&research, "Indira Nagar");

        assert!(content.sections.hero.contains("Indira Nagar"));
        assert!(content.sections.services.contains("Indira Nagar"));
        assert_eq!(content.city, "Indira Nagar");
        assert!(!content.body_text().contains('{'));
    }

    #[test]
    fn test_research_facts_are_interpolated() {
        let content = engine(3).generate_location_content(&research(), "Indira Nagar");
        assert!(content.sections.accessibility.contains("100 Feet Road and CMH Road"));
        assert!(content.sections.accessibility.contains("Indiranagar Metro"));
        assert!(content.sections.competitive_edge.starts_with("There are 2 "));
        assert!(content.sections.demographics.contains("Domlur and HAL"));
    }

    #[test]
    fn test_metadata_and_disclaimer() {
        let content = engine(3).generate_location_content(&research(), "Indira Nagar");
        assert_eq!(content.slug, "indira-nagar");
        assert_eq!(content.seo.h1, "Gynecologist in Indira Nagar");
        assert!(content.seo.keywords.contains(&"gynecologist in Indira Nagar".to_string()));
        assert!(content.sections.cta.contains("individual results may vary"));
        assert_eq!(content.sections.faq.len(), 5);
        assert!(content.metadata.word_count > 300);
        assert!(content.metadata.location_mentions >= 5);
    }

    #[test]
    fn test_opening_follows_empathy_level() {
        let lexicon = Lexicon::default();
        let engine = ContentGenerationEngine::new(
            lexicon.clone(),
            ClinicProfile::default(),
            BrandVoice {
                tone: Tone::Warm,
                empathy: EmpathyLevel::High,
                seed: Some(11),
            },
        );
        let opening = engine.pick_opening("indira-nagar");
        assert!(lexicon.opening_phrases[2].contains(&opening));
        assert_eq!(opening, engine.pick_opening("indira-nagar"));
    }

    #[test]
    fn test_professional_voice_replaces_whole_words() {
        let engine = engine(1);
        assert_eq!(
            engine.apply_voice("Our Helpline can help."),
            "Our Helpline can assist."
        );
    }

    #[test]
    fn test_sensitivity_replacements_always_apply() {
        let engine = engine(1);
        assert_eq!(
            engine.apply_voice("Support after a failed pregnancy."),
            "Support after a pregnancy loss."
        );
    }

    #[test]
    fn test_fnv1a_is_stable() {
        assert_eq!(fnv1a(""), 0xcbf2_9ce4_8422_2325);
        assert_ne!(fnv1a("indira-nagar"), fnv1a("domlur"));
    }
}
