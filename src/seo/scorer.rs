//! Heuristic SEO scoring.
//!
//! The scorer measures a page against the thresholds in
//! [`ScoringConfig`] and emits one [`Recommendation`] per failed check.
//! The overall score is `100 - sum(severity penalties)`, clamped to
//! `[0, 100]`, so it only carries meaning relative to other pages scored
//! with the same configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::keywords::{KeywordAnalyzer, KeywordDensityReport, LsiCoverage};
use super::links::{LinkAnalyzer, LinkReport};
use super::meta::{MetaLimits, MetaTagOptimizer, MetaValidation};
use super::readability::{self, ReadabilityReport};
use super::schema::{SchemaValidation, SchemaValidator};
use crate::config::ScoringConfig;
use crate::content::GeneratedContent;
use crate::lexicon::{contains_phrase, count_phrase, Lexicon};
use crate::location::LocationSeoData;
use crate::research::ResearchResult;

/// Which checks the scorer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    /// Keywords, meta tags, readability, links, length and local signals
    Basic,
    /// Basic checks plus LSI coverage, structure, schema and competition
    #[default]
    Advanced,
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringMode::Basic => write!(f, "basic"),
            ScoringMode::Advanced => write!(f, "advanced"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// Area of the page a recommendation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeoCategory {
    Keywords,
    KeywordStuffing,
    Meta,
    Readability,
    Links,
    ContentLength,
    LocalSignals,
    Lsi,
    Faq,
    Headings,
    Schema,
    Competition,
}

impl fmt::Display for SeoCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeoCategory::Keywords => "keywords",
            SeoCategory::KeywordStuffing => "keyword stuffing",
            SeoCategory::Meta => "meta tags",
            SeoCategory::Readability => "readability",
            SeoCategory::Links => "internal links",
            SeoCategory::ContentLength => "content length",
            SeoCategory::LocalSignals => "local signals",
            SeoCategory::Lsi => "LSI keywords",
            SeoCategory::Faq => "FAQ",
            SeoCategory::Headings => "headings",
            SeoCategory::Schema => "schema",
            SeoCategory::Competition => "competition",
        };
        write!(f, "{name}")
    }
}

/// One failed check and what to do about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: SeoCategory,
    pub severity: Severity,
    pub message: String,
}

impl Recommendation {
    fn new(category: SeoCategory, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            category,
            severity,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMetrics {
    pub focus_keyword: String,
    /// Density of the focus keyword, in percent
    pub focus_density: f64,
    pub report: KeywordDensityReport,
    /// Primary keywords that never appear in the body
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaMetrics {
    pub title: MetaValidation,
    pub description: MetaValidation,
    pub title_has_location: bool,
    pub h1_has_location: bool,
    pub has_keywords: bool,
    /// Points from the configured title/description/keyword weights
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSignalMetrics {
    pub location_mentions: usize,
    /// Research landmarks named in the body
    pub landmarks_mentioned: Vec<String>,
    pub nearby_areas_mentioned: usize,
    pub mentions_transport: bool,
}

/// Checks only the advanced mode runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedMetrics {
    pub lsi: LsiCoverage,
    pub faq_entries: usize,
    pub h1_has_focus_keyword: bool,
    /// `None` when no location data was supplied
    pub schema: Option<SchemaValidation>,
    pub competitor_count: usize,
    pub competitive_edge_words: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoMetrics {
    pub keywords: KeywordMetrics,
    pub meta: MetaMetrics,
    pub readability: ReadabilityReport,
    pub links: LinkReport,
    pub word_count: usize,
    pub local: LocalSignalMetrics,
    pub advanced: Option<AdvancedMetrics>,
}

/// Output of one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoOptimizationResult {
    pub mode: ScoringMode,
    pub overall_score: f64,
    pub metrics: SeoMetrics,
    pub recommendations: Vec<Recommendation>,
}

impl SeoOptimizationResult {
    /// Whether any recommendation falls in `category`.
    pub fn has(&self, category: SeoCategory) -> bool {
        self.recommendations.iter().any(|r| r.category == category)
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.recommendations
            .iter()
            .filter(|r| r.severity == severity)
            .count()
    }
}

/// Scores generated content against the configured SEO thresholds.
#[derive(Debug, Clone)]
pub struct SeoScorer {
    lexicon: Lexicon,
    config: ScoringConfig,
    meta: MetaTagOptimizer,
}

impl SeoScorer {
    pub fn new(lexicon: Lexicon, config: ScoringConfig) -> Self {
        let meta = MetaTagOptimizer::new(MetaLimits::from(&config));
        Self {
            lexicon,
            config,
            meta,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Score a page. Schema validity is only checked in advanced mode and
    /// only when `location_data` is supplied.
    pub fn score(
        &self,
        mode: ScoringMode,
        content: &GeneratedContent,
        research: &ResearchResult,
        location_data: Option<&LocationSeoData>,
    ) -> SeoOptimizationResult {
        let body = content.body_text();
        let mut recommendations = Vec::new();

        let keywords = self.keyword_metrics(&body, content, &mut recommendations);
        let meta = self.meta_metrics(content, &mut recommendations);
        let readability = self.readability_metrics(&body, &mut recommendations);
        let links = self.link_metrics(&body, location_data, &mut recommendations);
        let word_count = readability.words;
        if word_count < self.config.min_word_count {
            recommendations.push(Recommendation::new(
                SeoCategory::ContentLength,
                Severity::High,
                format!(
                    "Content has {word_count} words; aim for at least {}",
                    self.config.min_word_count
                ),
            ));
        }
        let local = self.local_metrics(&body, content, research, &mut recommendations);

        let advanced = match mode {
            ScoringMode::Basic => None,
            ScoringMode::Advanced => Some(self.advanced_metrics(
                &body,
                content,
                research,
                location_data,
                &mut recommendations,
            )),
        };

        let penalty: f64 = recommendations.iter().map(|r| self.penalty(r.severity)).sum();
        let overall_score = (100.0 - penalty).clamp(0.0, 100.0);
        debug!(
            location = %content.location,
            %mode,
            overall_score,
            recommendations = recommendations.len(),
            "scored content"
        );

        SeoOptimizationResult {
            mode,
            overall_score,
            metrics: SeoMetrics {
                keywords,
                meta,
                readability,
                links,
                word_count,
                local,
                advanced,
            },
            recommendations,
        }
    }

    /// Score deducted for a recommendation of the given severity.
    pub fn penalty(&self, severity: Severity) -> f64 {
        match severity {
            Severity::High => self.config.penalty_high,
            Severity::Medium => self.config.penalty_medium,
            Severity::Low => self.config.penalty_low,
        }
    }

    fn focus_keyword(&self) -> String {
        self.lexicon
            .primary_keywords
            .first()
            .cloned()
            .unwrap_or_default()
    }

    fn keyword_metrics(
        &self,
        body: &str,
        content: &GeneratedContent,
        out: &mut Vec<Recommendation>,
    ) -> KeywordMetrics {
        let focus_keyword = self.focus_keyword();
        let mut tracked = self.lexicon.primary_keywords.clone();
        tracked.extend(self.lexicon.localized_keywords(&content.location));
        let report = KeywordAnalyzer::analyze_keyword_density(body, &tracked);
        let focus_density = report.get(&focus_keyword).map_or(0.0, |stat| stat.density);

        if focus_density < self.config.keyword_density_min {
            out.push(Recommendation::new(
                SeoCategory::Keywords,
                Severity::High,
                format!(
                    "Focus keyword \"{focus_keyword}\" density is {focus_density:.2}%; raise it to at least {}%",
                    self.config.keyword_density_min
                ),
            ));
        } else if focus_density > self.config.keyword_density_max {
            out.push(Recommendation::new(
                SeoCategory::KeywordStuffing,
                Severity::Medium,
                format!(
                    "Focus keyword \"{focus_keyword}\" density is {focus_density:.2}%; keep it under {}%",
                    self.config.keyword_density_max
                ),
            ));
        }

        let missing: Vec<String> = self
            .lexicon
            .primary_keywords
            .iter()
            .filter(|k| report.get(k).map_or(true, |stat| stat.occurrences == 0))
            .cloned()
            .collect();
        if !missing.is_empty() {
            out.push(Recommendation::new(
                SeoCategory::Keywords,
                Severity::Low,
                format!("Mention the missing keywords: {}", missing.join(", ")),
            ));
        }

        KeywordMetrics {
            focus_keyword,
            focus_density,
            report,
            missing,
        }
    }

    fn meta_metrics(&self, content: &GeneratedContent, out: &mut Vec<Recommendation>) -> MetaMetrics {
        let seo = &content.seo;
        let title = self.meta.validate_title(&seo.title);
        let description = self.meta.validate_description(&seo.description);
        let title_has_location = contains_phrase(&seo.title, &content.location);
        let h1_has_location = contains_phrase(&seo.h1, &content.location);
        let has_keywords = !seo.keywords.is_empty();

        for issue in title.issues.iter().chain(&description.issues) {
            out.push(Recommendation::new(
                SeoCategory::Meta,
                Severity::Medium,
                format!("Meta {issue}"),
            ));
        }
        if !title_has_location {
            out.push(Recommendation::new(
                SeoCategory::Meta,
                Severity::Medium,
                "Include the location name in the page title",
            ));
        }
        if !h1_has_location {
            out.push(Recommendation::new(
                SeoCategory::Meta,
                Severity::Low,
                "Include the location name in the H1 heading",
            ));
        }
        if !has_keywords {
            out.push(Recommendation::new(
                SeoCategory::Meta,
                Severity::Low,
                "Add meta keywords",
            ));
        }

        let mut score = 0.0;
        if title.is_optimal {
            score += self.config.title_points;
        }
        if description.is_optimal {
            score += self.config.description_points;
        }
        if has_keywords {
            score += self.config.keywords_points;
        }

        MetaMetrics {
            title,
            description,
            title_has_location,
            h1_has_location,
            has_keywords,
            score,
        }
    }

    fn readability_metrics(&self, body: &str, out: &mut Vec<Recommendation>) -> ReadabilityReport {
        let report = readability::analyze(body);
        let target = self.config.readability_target;
        if report.flesch_score < target {
            let severe_below = target - self.config.readability_severe_margin;
            let severity = if report.flesch_score < severe_below {
                Severity::High
            } else {
                Severity::Medium
            };
            out.push(Recommendation::new(
                SeoCategory::Readability,
                severity,
                format!(
                    "Flesch Reading Ease is {:.1}; use shorter sentences and simpler words to reach {target}",
                    report.flesch_score
                ),
            ));
        }
        report
    }

    fn link_metrics(
        &self,
        body: &str,
        location_data: Option<&LocationSeoData>,
        out: &mut Vec<Recommendation>,
    ) -> LinkReport {
        let mut analyzer = LinkAnalyzer::new(self.lexicon.internal_paths());
        if let Some(data) = location_data {
            analyzer = analyzer.with_site_url(data.clinic.site_url.as_str());
        }
        let report = analyzer.analyze(body);
        if report.internal_count() < self.config.min_internal_links {
            out.push(Recommendation::new(
                SeoCategory::Links,
                Severity::Medium,
                format!(
                    "Found {} internal links; add at least {}",
                    report.internal_count(),
                    self.config.min_internal_links
                ),
            ));
        }
        report
    }

    fn local_metrics(
        &self,
        body: &str,
        content: &GeneratedContent,
        research: &ResearchResult,
        out: &mut Vec<Recommendation>,
    ) -> LocalSignalMetrics {
        let location_mentions = count_phrase(body, &content.location);
        let landmarks_mentioned: Vec<String> = research
            .landmarks
            .iter()
            .filter(|landmark| contains_phrase(body, landmark))
            .cloned()
            .collect();
        let nearby_areas_mentioned = research
            .nearby_areas
            .iter()
            .filter(|area| contains_phrase(body, area))
            .count();
        let mentions_transport = research
            .transport
            .metro_stations
            .iter()
            .chain(&research.transport.bus_routes)
            .any(|stop| contains_phrase(body, stop))
            || contains_phrase(body, "metro")
            || contains_phrase(body, "bus");

        if location_mentions < self.config.min_location_mentions {
            out.push(Recommendation::new(
                SeoCategory::LocalSignals,
                Severity::Medium,
                format!(
                    "\"{}\" is mentioned {location_mentions} times; mention it at least {} times",
                    content.location, self.config.min_location_mentions
                ),
            ));
        }
        if !research.landmarks.is_empty() && landmarks_mentioned.is_empty() {
            out.push(Recommendation::new(
                SeoCategory::LocalSignals,
                Severity::Low,
                "Mention at least one local landmark",
            ));
        }
        if !mentions_transport {
            out.push(Recommendation::new(
                SeoCategory::LocalSignals,
                Severity::Low,
                "Describe how to reach the clinic by public transport",
            ));
        }

        LocalSignalMetrics {
            location_mentions,
            landmarks_mentioned,
            nearby_areas_mentioned,
            mentions_transport,
        }
    }

    fn advanced_metrics(
        &self,
        body: &str,
        content: &GeneratedContent,
        research: &ResearchResult,
        location_data: Option<&LocationSeoData>,
        out: &mut Vec<Recommendation>,
    ) -> AdvancedMetrics {
        let lsi = KeywordAnalyzer::lsi_coverage(body, &self.lexicon.lsi_keywords);
        if lsi.ratio < self.config.min_lsi_coverage {
            out.push(Recommendation::new(
                SeoCategory::Lsi,
                Severity::Medium,
                format!(
                    "Only {:.0}% of related terms are used; consider adding: {}",
                    lsi.ratio * 100.0,
                    lsi.missing.join(", ")
                ),
            ));
        } else if !lsi.missing.is_empty() {
            out.push(Recommendation::new(
                SeoCategory::Lsi,
                Severity::Low,
                format!("Related terms not yet used: {}", lsi.missing.join(", ")),
            ));
        }

        let faq_entries = content.sections.faq.len();
        if faq_entries < self.config.min_faq_entries {
            out.push(Recommendation::new(
                SeoCategory::Faq,
                Severity::Low,
                format!(
                    "Page has {faq_entries} FAQ entries; add at least {}",
                    self.config.min_faq_entries
                ),
            ));
        }

        let h1_has_focus_keyword = contains_phrase(&content.seo.h1, &self.focus_keyword());
        if !h1_has_focus_keyword {
            out.push(Recommendation::new(
                SeoCategory::Headings,
                Severity::Low,
                "Use the focus keyword in the H1 heading",
            ));
        }

        let schema = location_data.map(SchemaValidator::validate_location_schema);
        if let Some(validation) = &schema {
            for error in &validation.errors {
                out.push(Recommendation::new(
                    SeoCategory::Schema,
                    Severity::High,
                    format!("Structured data: {error}"),
                ));
            }
        }

        let competitor_count = research.competitors.len();
        let competitive_edge_words = readability::word_count(&content.sections.competitive_edge);
        if competitor_count > 0
            && competitive_edge_words < self.config.min_competitive_edge_words
        {
            out.push(Recommendation::new(
                SeoCategory::Competition,
                Severity::Low,
                format!(
                    "{competitor_count} competitors nearby; explain what sets the clinic apart"
                ),
            ));
        }

        AdvancedMetrics {
            lsi,
            faq_entries,
            h1_has_focus_keyword,
            schema,
            competitor_count,
            competitive_edge_words,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{BrandVoice, ContentGenerationEngine, ContentSections, SeoMetadata};
    use crate::location::ClinicProfile;
    use crate::research::Coordinates;

    fn scorer() -> SeoScorer {
        SeoScorer::new(Lexicon::default(), ScoringConfig::default())
    }

    fn generated(research: &ResearchResult) -> GeneratedContent {
        ContentGenerationEngine::new(
            Lexicon::default(),
            ClinicProfile::default(),
            BrandVoice {
                seed: Some(9),
                ..Default::default()
            },
        )
        .generate_location_content(research, "Indira Nagar")
    }

    #[test]
    fn test_score_is_bounded() {
        let empty = GeneratedContent {
            location: "Nowhere".to_string(),
            ..Default::default()
        };
        let research = ResearchResult::default();
        for mode in [ScoringMode::Basic, ScoringMode::Advanced] {
            let result = scorer().score(mode, &empty, &research, None);
            assert!((0.0..=100.0).contains(&result.overall_score));
            assert!(result.has(SeoCategory::ContentLength));
            assert!(result.has(SeoCategory::Keywords));
        }
    }

    #[test]
    fn test_overall_is_100_minus_penalties() {
        let research = ResearchResult::fallback("Indira Nagar", "Bangalore");
        let content = generated(&research);
        let scorer = scorer();
        let result = scorer.score(ScoringMode::Advanced, &content, &research, None);
        let penalty: f64 = result
            .recommendations
            .iter()
            .map(|r| scorer.penalty(r.severity))
            .sum();
        assert!((result.overall_score - (100.0 - penalty).max(0.0)).abs() < 1e-9);
    }

    #[test]
    fn test_basic_mode_skips_advanced_checks() {
        let research = ResearchResult::fallback("Indira Nagar", "Bangalore");
        let content = generated(&research);
        let result = scorer().score(ScoringMode::Basic, &content, &research, None);
        assert!(result.metrics.advanced.is_none());
        assert!(!result.has(SeoCategory::Lsi));
        assert!(!result.has(SeoCategory::Schema));
    }

    #[test]
    fn test_generated_content_has_healthy_keyword_density() {
        let research = ResearchResult::fallback("Indira Nagar", "Bangalore");
        let content = generated(&research);
        let result = scorer().score(ScoringMode::Basic, &content, &research, None);
        let density = result.metrics.keywords.focus_density;
        assert!(density >= 0.5 && density <= 2.5, "density {density}");
        assert!(!result.has(SeoCategory::KeywordStuffing));
    }

    #[test]
    fn test_keyword_stuffing_is_flagged() {
        let content = GeneratedContent {
            location: "Domlur".to_string(),
            sections: ContentSections {
                hero: "gynecologist Domlur gynecologist clinic gynecologist".to_string(),
                ..Default::default()
            },
            seo: SeoMetadata {
                h1: "Gynecologist in Domlur".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let result = scorer().score(ScoringMode::Basic, &content, &ResearchResult::default(), None);
        assert!(result.has(SeoCategory::KeywordStuffing));
        assert!((result.metrics.keywords.focus_density - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_schema_is_high_severity() {
        let research = ResearchResult::fallback("Indira Nagar", "Bangalore");
        let content = generated(&research);
        let data = LocationSeoData::assemble(&research, &content, &ClinicProfile::default());
        let result = scorer().score(ScoringMode::Advanced, &content, &research, Some(&data));
        let schema_recs: Vec<_> = result
            .recommendations
            .iter()
            .filter(|r| r.category == SeoCategory::Schema)
            .collect();
        assert_eq!(schema_recs.len(), 2);
        assert!(schema_recs.iter().all(|r| r.severity == Severity::High));

        let research = ResearchResult {
            coordinates: Coordinates::new(12.97, 77.64),
            ..research
        };
        let data = LocationSeoData::assemble(&research, &content, &ClinicProfile::default());
        let result = scorer().score(ScoringMode::Advanced, &content, &research, Some(&data));
        assert!(!result.has(SeoCategory::Schema));
    }

    #[test]
    fn test_meta_points_follow_config() {
        let research = ResearchResult::fallback("Indira Nagar", "Bangalore");
        let content = generated(&research);
        let result = scorer().score(ScoringMode::Basic, &content, &research, None);
        let meta = &result.metrics.meta;
        let expected = if meta.title.is_optimal { 40.0 } else { 0.0 }
            + if meta.description.is_optimal { 40.0 } else { 0.0 }
            + 20.0;
        assert_eq!(meta.score, expected);
        assert!(meta.title_has_location);
    }
}
