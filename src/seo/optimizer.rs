//! Bounded content optimization loop.
//!
//! Each pass reads the recommendations of the last accepted score and
//! applies text edits to a clone of the content. A pass is kept only when
//! it raises the score. The loop stops when the target score is reached,
//! when a pass improves the score by less than the configured minimum,
//! when no edit applies, or after the configured number of passes.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use super::keywords::KeywordAnalyzer;
use super::meta::MetaTagOptimizer;
use super::scorer::{SeoCategory, SeoOptimizationResult, SeoScorer};
use crate::config::OptimizerConfig;
use crate::content::templates::{self, join_list, render_template, TemplateContext};
use crate::content::{FaqEntry, GeneratedContent};
use crate::lexicon::{apply_replacements, contains_phrase, count_phrase, replace_trailing};
use crate::location::LocationSeoData;
use crate::research::ResearchResult;

static CLAUSE_BREAK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:;|, (and|so|but)) ([a-z])").expect("valid clause regex")
});

/// Why the optimization loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    TargetReached,
    MinimalImprovement,
    MaxIterations,
    NoActions,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::TargetReached => write!(f, "target score reached"),
            StopReason::MinimalImprovement => write!(f, "minimal improvement"),
            StopReason::MaxIterations => write!(f, "max iterations reached"),
            StopReason::NoActions => write!(f, "no applicable edits"),
        }
    }
}

/// One optimization pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// Pass number (1-indexed)
    pub iteration: u32,
    pub score_before: f64,
    pub score_after: f64,
    pub improvement: f64,
    pub actions: Vec<String>,
    /// Whether the edited content replaced the previous best
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    /// Best-scoring content seen
    pub content: GeneratedContent,
    /// Score of `content`
    pub result: SeoOptimizationResult,
    pub initial_score: f64,
    pub iterations: Vec<IterationRecord>,
    pub stop_reason: StopReason,
}

impl OptimizationOutcome {
    pub fn improvement(&self) -> f64 {
        self.result.overall_score - self.initial_score
    }
}

/// Applies heuristic edit passes until the score settles.
#[derive(Debug, Clone)]
pub struct ContentOptimizer {
    scorer: SeoScorer,
    meta: MetaTagOptimizer,
    config: OptimizerConfig,
    brand_name: String,
}

impl ContentOptimizer {
    pub fn new(scorer: SeoScorer, config: OptimizerConfig, brand_name: impl Into<String>) -> Self {
        let meta = MetaTagOptimizer::new(scorer.config().into());
        Self {
            scorer,
            meta,
            config,
            brand_name: brand_name.into(),
        }
    }

    pub fn scorer(&self) -> &SeoScorer {
        &self.scorer
    }

    /// Optimize a copy of `content`. The input is never modified.
    pub fn optimize(
        &self,
        content: &GeneratedContent,
        research: &ResearchResult,
        location_data: Option<&LocationSeoData>,
    ) -> OptimizationOutcome {
        let mode = self.config.mode;
        let mut best = content.clone();
        let mut best_result = self.scorer.score(mode, &best, research, location_data);
        let initial_score = best_result.overall_score;
        let mut iterations = Vec::new();

        let stop_reason = loop {
            if best_result.overall_score >= self.config.target_score {
                break StopReason::TargetReached;
            }
            if iterations.len() as u32 >= self.config.max_iterations {
                break StopReason::MaxIterations;
            }

            let mut candidate = best.clone();
            let actions = self.apply_passes(&mut candidate, &best_result, research);
            if actions.is_empty() {
                break StopReason::NoActions;
            }
            candidate.refresh_metadata(self.scorer.lexicon());

            let result = self.scorer.score(mode, &candidate, research, location_data);
            let score_before = best_result.overall_score;
            let improvement = result.overall_score - score_before;
            let accepted = improvement > 0.0;
            debug!(
                location = %content.location,
                iteration = iterations.len() + 1,
                score_before,
                score_after = result.overall_score,
                ?actions,
                "optimization pass"
            );
            iterations.push(IterationRecord {
                iteration: iterations.len() as u32 + 1,
                score_before,
                score_after: result.overall_score,
                improvement,
                actions,
                accepted,
            });
            if accepted {
                best = candidate;
                best_result = result;
            }
            if improvement < self.config.min_improvement {
                break StopReason::MinimalImprovement;
            }
        };

        info!(
            location = %content.location,
            initial_score,
            final_score = best_result.overall_score,
            passes = iterations.len(),
            %stop_reason,
            "optimization finished"
        );
        OptimizationOutcome {
            content: best,
            result: best_result,
            initial_score,
            iterations,
            stop_reason,
        }
    }

    /// Apply every edit the recommendations call for. Returns a description
    /// of each edit made.
    fn apply_passes(
        &self,
        content: &mut GeneratedContent,
        result: &SeoOptimizationResult,
        research: &ResearchResult,
    ) -> Vec<String> {
        let mut actions = Vec::new();
        let ctx = self.context(content, research);

        if result.has(SeoCategory::Keywords) {
            self.insert_keywords(content, result, &mut actions);
        }
        if result.has(SeoCategory::KeywordStuffing) {
            self.thin_keyword(content, result, &mut actions);
        }
        if result.has(SeoCategory::Readability) {
            self.simplify(content, &mut actions);
        }
        if result.has(SeoCategory::Meta) || result.has(SeoCategory::Headings) {
            self.regenerate_meta(content, result, &mut actions);
        }
        if result.has(SeoCategory::Links) {
            self.insert_links(content, result, &mut actions);
        }
        if result.has(SeoCategory::ContentLength) {
            extend_content(content, &ctx, &mut actions);
        }
        if result.has(SeoCategory::LocalSignals) {
            insert_local_signals(content, result, research, &mut actions);
        }
        if result.has(SeoCategory::Lsi) {
            insert_lsi_terms(content, result, &mut actions);
        }
        if result.has(SeoCategory::Faq) {
            add_faq_entries(content, &ctx, self.scorer.config().min_faq_entries, &mut actions);
        }
        if result.has(SeoCategory::Competition) {
            let sentence = format!(
                "Unlike many clinics near {}, {} offers same-week appointments, clear package \
                 pricing and the same doctor at every visit.",
                content.location, self.brand_name
            );
            if append_sentence(&mut content.sections.competitive_edge, &sentence) {
                actions.push("expanded competitive edge".to_string());
            }
        }
        actions
    }

    fn context(&self, content: &GeneratedContent, research: &ResearchResult) -> TemplateContext {
        TemplateContext::new()
            .with("location", content.location.as_str())
            .with("city", content.city.as_str())
            .with("clinic", self.brand_name.as_str())
            .with(
                "nearby",
                join_list(&research.nearby_areas, 3, "the neighbouring areas"),
            )
    }

    fn insert_keywords(
        &self,
        content: &mut GeneratedContent,
        result: &SeoOptimizationResult,
        actions: &mut Vec<String>,
    ) {
        let keywords = &result.metrics.keywords;
        let location = content.location.clone();
        if keywords.focus_density < self.scorer.config().keyword_density_min {
            let focus = &keywords.focus_keyword;
            let candidates = [
                ("demographics", format!("Women in {location} can see our {focus} without a long wait.")),
                ("accessibility", format!("Our {focus} in {location} is a short trip from most homes in the area.")),
                ("competitive_edge", format!("Choosing a {focus} close to home in {location} makes regular visits easier.")),
            ];
            for (section, sentence) in candidates {
                let Some(text) = content.sections.section_mut(section) else {
                    continue;
                };
                if append_sentence(text, &sentence) {
                    actions.push(format!("inserted focus keyword into {section}"));
                    break;
                }
            }
        }
        if !keywords.missing.is_empty() {
            let localized: Vec<String> = keywords
                .missing
                .iter()
                .map(|keyword| format!("{keyword} in {location}"))
                .collect();
            let sentence = format!(
                "Women searching for {} will find the right care here.",
                join_list(&localized, localized.len(), "")
            );
            if append_sentence(&mut content.sections.services, &sentence) {
                actions.push(format!("mentioned keywords: {}", keywords.missing.join(", ")));
            }
        }
    }

    fn thin_keyword(
        &self,
        content: &mut GeneratedContent,
        result: &SeoOptimizationResult,
        actions: &mut Vec<String>,
    ) {
        let focus = &result.metrics.keywords.focus_keyword;
        let Some((_, synonym)) = self
            .scorer
            .lexicon()
            .synonyms
            .iter()
            .find(|(word, _)| word.eq_ignore_ascii_case(focus))
        else {
            return;
        };
        let body = content.body_text();
        let mut excess = KeywordAnalyzer::excess_occurrences(
            &body,
            focus,
            self.scorer.config().keyword_density_max,
        );
        let total = excess;
        // Later sections first so the hero keeps its keyword
        for text in content.sections.texts_mut().into_iter().rev() {
            if excess == 0 {
                break;
            }
            let before = count_phrase(text, focus);
            let take = before.min(excess);
            if take > 0 {
                *text = replace_trailing(text, focus, synonym, take);
                excess -= take;
            }
        }
        if total > excess {
            actions.push(format!(
                "replaced {} uses of \"{focus}\" with \"{synonym}\"",
                total - excess
            ));
        }
    }

    fn simplify(&self, content: &mut GeneratedContent, actions: &mut Vec<String>) {
        let simpler = &self.scorer.lexicon().simpler_words;
        let max_words = self.config.long_sentence_words;
        let mut changed = false;
        for text in content.sections.texts_mut() {
            let simplified = split_long_sentences(&apply_replacements(text, simpler), max_words);
            if simplified != *text {
                *text = simplified;
                changed = true;
            }
        }
        if changed {
            actions.push("simplified wording and split long sentences".to_string());
        }
    }

    fn regenerate_meta(
        &self,
        content: &mut GeneratedContent,
        result: &SeoOptimizationResult,
        actions: &mut Vec<String>,
    ) {
        let meta = &result.metrics.meta;
        let focus = capitalize(&result.metrics.keywords.focus_keyword);
        let location = content.location.clone();

        if !meta.title.is_optimal || !meta.title_has_location {
            let title = self.meta.optimize_title(&focus, &location, &self.brand_name);
            if title != content.seo.title {
                content.seo.title = title;
                actions.push("rewrote title".to_string());
            }
        }
        if !meta.description.is_optimal {
            let description = self.meta.optimize_description(
                &result.metrics.keywords.focus_keyword,
                &location,
                &content.city,
                &self.brand_name,
            );
            if description != content.seo.description {
                content.seo.description = description;
                actions.push("rewrote meta description".to_string());
            }
        }
        let h1_ok = meta.h1_has_location
            && contains_phrase(&content.seo.h1, &result.metrics.keywords.focus_keyword);
        if !h1_ok {
            content.seo.h1 = format!("{focus} in {location}");
            actions.push("rewrote H1".to_string());
        }
        if !meta.has_keywords {
            content.seo.keywords = self.scorer.lexicon().localized_keywords(&location);
            actions.push("added meta keywords".to_string());
        }
    }

    fn insert_links(
        &self,
        content: &mut GeneratedContent,
        result: &SeoOptimizationResult,
        actions: &mut Vec<String>,
    ) {
        let links = &result.metrics.links;
        let needed = self
            .scorer
            .config()
            .min_internal_links
            .saturating_sub(links.internal_count());
        let anchors: Vec<String> = self
            .scorer
            .lexicon()
            .internal_links
            .iter()
            .filter(|(path, _)| !links.links_to(path))
            .take(needed)
            .map(|(path, label)| format!("[{label}]({path})"))
            .collect();
        if anchors.is_empty() {
            return;
        }
        let sentence = format!("Read more about {}.", join_list(&anchors, anchors.len(), ""));
        if append_sentence(&mut content.sections.services, &sentence) {
            actions.push(format!("added {} internal links", anchors.len()));
        }
    }
}

/// Append a sentence unless the text already contains it.
fn append_sentence(text: &mut String, sentence: &str) -> bool {
    if text.contains(sentence) {
        return false;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(sentence);
    true
}

fn extend_content(content: &mut GeneratedContent, ctx: &TemplateContext, actions: &mut Vec<String>) {
    for (section, template) in templates::AREA_PARAGRAPHS {
        let paragraph = render_template(template, ctx);
        let Some(text) = content.sections.section_mut(section) else {
            continue;
        };
        if append_sentence(text, &paragraph) {
            actions.push(format!("extended {section}"));
            return;
        }
    }
}

fn insert_local_signals(
    content: &mut GeneratedContent,
    result: &SeoOptimizationResult,
    research: &ResearchResult,
    actions: &mut Vec<String>,
) {
    let local = &result.metrics.local;
    let location = content.location.clone();
    let sections = &mut content.sections;

    let sentence = format!("Many of our patients live in {location} and the nearby areas.");
    if append_sentence(&mut sections.accessibility, &sentence) {
        actions.push("added location mention".to_string());
    }
    if local.landmarks_mentioned.is_empty() {
        if let Some(landmark) = research.landmarks.first() {
            let sentence = format!("The clinic is easy to find from {landmark}.");
            if append_sentence(&mut sections.accessibility, &sentence) {
                actions.push("mentioned a landmark".to_string());
            }
        }
    }
    if !local.mentions_transport {
        let sentence = format!("Buses and autos from across {} stop close to the clinic.", content.city);
        if append_sentence(&mut sections.accessibility, &sentence) {
            actions.push("described transport access".to_string());
        }
    }
}

fn insert_lsi_terms(
    content: &mut GeneratedContent,
    result: &SeoOptimizationResult,
    actions: &mut Vec<String>,
) {
    let Some(advanced) = &result.metrics.advanced else {
        return;
    };
    if advanced.lsi.missing.is_empty() {
        return;
    }
    let terms: Vec<String> = advanced.lsi.missing.iter().take(3).cloned().collect();
    let sentence = format!("Patients also ask us about {}.", join_list(&terms, terms.len(), ""));
    if append_sentence(&mut content.sections.services, &sentence) {
        actions.push(format!("added related terms: {}", terms.join(", ")));
    }
}

fn add_faq_entries(
    content: &mut GeneratedContent,
    ctx: &TemplateContext,
    min_entries: usize,
    actions: &mut Vec<String>,
) {
    for (question, answer) in templates::EXTRA_FAQ {
        if content.sections.faq.len() >= min_entries {
            break;
        }
        let question = render_template(question, ctx);
        if content.sections.faq.iter().any(|entry| entry.question == question) {
            continue;
        }
        content.sections.faq.push(FaqEntry {
            question,
            answer: render_template(answer, ctx),
        });
        actions.push("added FAQ entry".to_string());
    }
}

/// Split sentences longer than `max_words` at clause boundaries
/// ("; ", ", and ", ", so ", ", but ").
pub fn split_long_sentences(text: &str, max_words: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while !rest.is_empty() {
        let end = rest
            .find(|c: char| matches!(c, '.' | '!' | '?'))
            .map_or(rest.len(), |idx| idx + 1);
        let (sentence, tail) = rest.split_at(end);
        if super::readability::word_count(sentence) > max_words {
            out.push_str(&CLAUSE_BREAK.replace_all(sentence, |caps: &Captures| {
                match caps.get(1) {
                    Some(conjunction) => {
                        format!(". {} {}", capitalize(conjunction.as_str()), &caps[2])
                    }
                    None => format!(". {}", caps[2].to_uppercase()),
                }
            }));
        } else {
            out.push_str(sentence);
        }
        rest = tail;
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::content::{BrandVoice, ContentGenerationEngine, ContentSections, SeoMetadata};
    use crate::lexicon::Lexicon;
    use crate::location::ClinicProfile;
    use crate::seo::ScoringMode;

    fn optimizer(config: OptimizerConfig) -> ContentOptimizer {
        ContentOptimizer::new(
            SeoScorer::new(Lexicon::default(), ScoringConfig::default()),
            config,
            "Motherhood Women's Clinic",
        )
    }

    fn generated(research: &ResearchResult) -> GeneratedContent {
        ContentGenerationEngine::new(
            Lexicon::default(),
            ClinicProfile::default(),
            BrandVoice {
                seed: Some(2),
                ..Default::default()
            },
        )
        .generate_location_content(research, "Indira Nagar")
    }

    fn thin_content() -> GeneratedContent {
        GeneratedContent {
            location: "Domlur".to_string(),
            city: "Bangalore".to_string(),
            slug: "domlur".to_string(),
            sections: ContentSections {
                hero: "We care for women in Domlur.".to_string(),
                ..Default::default()
            },
            seo: SeoMetadata {
                title: "Clinic".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_optimizer_never_lowers_the_score() {
        let research = ResearchResult::fallback("Domlur", "Bangalore");
        let outcome = optimizer(OptimizerConfig::default()).optimize(&thin_content(), &research, None);
        assert!(outcome.result.overall_score >= outcome.initial_score);
        assert!(outcome.iterations.len() as u32 <= 3);
    }

    #[test]
    fn test_optimizer_improves_thin_content() {
        let research = ResearchResult::fallback("Domlur", "Bangalore");
        let original = thin_content();
        let outcome = optimizer(OptimizerConfig::default()).optimize(&original, &research, None);

        assert!(outcome.improvement() > 0.0);
        assert!(outcome.content.seo.title.contains("Domlur"));
        assert_eq!(outcome.content.seo.h1, "Gynecologist in Domlur");
        // input untouched
        assert_eq!(original.seo.title, "Clinic");
    }

    #[test]
    fn test_zero_iterations_returns_input() {
        let research = ResearchResult::fallback("Domlur", "Bangalore");
        let config = OptimizerConfig {
            max_iterations: 0,
            ..Default::default()
        };
        let outcome = optimizer(config).optimize(&thin_content(), &research, None);
        assert_eq!(outcome.stop_reason, StopReason::MaxIterations);
        assert!(outcome.iterations.is_empty());
        assert_eq!(outcome.content.sections, thin_content().sections);
    }

    #[test]
    fn test_reached_target_stops_immediately() {
        let research = ResearchResult::fallback("Domlur", "Bangalore");
        let config = OptimizerConfig {
            target_score: 0.0,
            ..Default::default()
        };
        let outcome = optimizer(config).optimize(&thin_content(), &research, None);
        assert_eq!(outcome.stop_reason, StopReason::TargetReached);
        assert!(outcome.iterations.is_empty());
    }

    #[test]
    fn test_minimal_improvement_stops_loop() {
        let research = ResearchResult::fallback("Indira Nagar", "Bangalore");
        let config = OptimizerConfig {
            target_score: 101.0,
            max_iterations: 10,
            ..Default::default()
        };
        let outcome = optimizer(config).optimize(&generated(&research), &research, None);
        let (last, earlier) = outcome.iterations.split_last().unwrap();
        // the loop only continues after a pass that gained at least 2 points
        assert!(earlier.iter().all(|record| record.improvement >= 2.0));
        match outcome.stop_reason {
            StopReason::MinimalImprovement => assert!(last.improvement < 2.0),
            StopReason::NoActions => assert!(last.improvement >= 2.0),
            other => panic!("unexpected stop reason: {other}"),
        }
    }

    #[test]
    fn test_generated_page_gains_internal_links() {
        let research = ResearchResult::fallback("Indira Nagar", "Bangalore");
        let content = generated(&research);
        let optimizer = optimizer(OptimizerConfig::default());
        let before = optimizer
            .scorer()
            .score(ScoringMode::Advanced, &content, &research, None);
        assert!(before.metrics.links.internal_count() < 3);

        let outcome = optimizer.optimize(&content, &research, None);
        assert!(outcome.result.metrics.links.internal_count() >= 3);
        assert!(outcome.content.sections.services.contains("](/services/"));
    }

    #[test]
    fn test_split_long_sentences() {
        let long = "We see women from many parts of the city for routine care and for complex \
                    needs alike, and our team explains each plan in plain words; nothing is rushed.";
        let split = split_long_sentences(long, 20);
        assert!(split.contains("alike. And our team"));
        assert!(split.contains("words. Nothing is rushed."));

        let short = "Short and simple, and clear.";
        assert_eq!(split_long_sentences(short, 20), short);
        // A higher limit leaves the long sentence alone
        assert_eq!(split_long_sentences(long, 40), long);
    }

    #[test]
    fn test_append_sentence_is_idempotent() {
        let mut text = "One.".to_string();
        assert!(append_sentence(&mut text, "Two."));
        assert!(!append_sentence(&mut text, "Two."));
        assert_eq!(text, "One. Two.");
    }
}
