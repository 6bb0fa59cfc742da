//! QA orchestrator: runs every category and aggregates the results.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::{debug, info};

use super::{
    certification_for, CategoryDelta, CategoryProgressUpdate, CategoryResult, ComplianceMatrix,
    ComprehensiveQaResult, QualityGateOutcome, TestCategory, TestResult, TestStatus,
};
use crate::config::{LocpageConfig, QaConfig, ScoringConfig};
use crate::content::GeneratedContent;
use crate::lexicon::{contains_phrase, count_phrase, Lexicon};
use crate::location::LocationSeoData;
use crate::seo::readability::{self, ReadabilityReport};
use crate::seo::{SchemaValidator, ScoringMode, SeoScorer};
use crate::validation::{ContentQualityValidator, MedicalAccuracyValidator, MedicalIssueKind};

static URL_SAFE_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"));
static MARKDOWN_LINK_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("valid link text regex"));

const VAGUE_LINK_TEXT: [&str; 4] = ["click here", "here", "read more", "link"];

/// Text the checks work on, computed once per run.
struct PageView<'a> {
    content: &'a GeneratedContent,
    data: &'a LocationSeoData,
    body: String,
    readability: ReadabilityReport,
}

/// Runs the eight QA categories over a finished page.
#[derive(Debug, Clone)]
pub struct QualityAssuranceOrchestrator {
    lexicon: Lexicon,
    scoring: ScoringConfig,
    qa: QaConfig,
    scorer: SeoScorer,
    medical: MedicalAccuracyValidator,
    content: ContentQualityValidator,
}

impl QualityAssuranceOrchestrator {
    pub fn new(lexicon: Lexicon, config: &LocpageConfig) -> Self {
        Self {
            scorer: SeoScorer::new(lexicon.clone(), config.scoring.clone()),
            medical: MedicalAccuracyValidator::new(lexicon.clone(), config.medical.clone()),
            content: ContentQualityValidator::new(&config.scoring),
            lexicon,
            scoring: config.scoring.clone(),
            qa: config.qa.clone(),
        }
    }

    /// Run all categories without progress reporting.
    pub fn run(
        &self,
        content: &GeneratedContent,
        location_data: &LocationSeoData,
        prior: Option<&ComprehensiveQaResult>,
    ) -> ComprehensiveQaResult {
        self.run_with_progress(content, location_data, prior, |_| {})
    }

    /// Run all categories, reporting each one's start and outcome.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let result = orchestrator.run_with_progress(&content, &data, None, |update| {
    ///     match update.state {
    ///         CategoryProgressState::Running => println!("Starting: {}", update.category),
    ///         _ => println!("{}: {:?}", update.category, update.state),
    ///     }
    /// });
    /// ```
    pub fn run_with_progress<F>(
        &self,
        content: &GeneratedContent,
        location_data: &LocationSeoData,
        prior: Option<&ComprehensiveQaResult>,
        mut callback: F,
    ) -> ComprehensiveQaResult
    where
        F: FnMut(CategoryProgressUpdate),
    {
        let body = content.body_text();
        let view = PageView {
            content,
            data: location_data,
            readability: readability::analyze(&body),
            body,
        };

        let mut categories = Vec::with_capacity(TestCategory::ALL.len());
        for category in TestCategory::ALL {
            callback(CategoryProgressUpdate::running(category));
            let start = Instant::now();
            let result = self.run_category(category, &view);
            let duration = start.elapsed();
            callback(match result.status {
                TestStatus::Passed => CategoryProgressUpdate::passed(category, duration),
                TestStatus::Failed => CategoryProgressUpdate::failed(category, duration),
                TestStatus::Skipped => CategoryProgressUpdate::skipped(category),
            });
            debug!(%category, score = ?result.score, status = ?result.status, "QA category");
            categories.push(result);
        }

        let scored: Vec<f64> = categories.iter().filter_map(|c| c.score).collect();
        let overall_score = if scored.is_empty() {
            0.0
        } else {
            (scored.iter().sum::<f64>() / scored.len() as f64).clamp(0.0, 100.0)
        };

        let compliant = |category: TestCategory| {
            categories
                .iter()
                .find(|c| c.category == category)
                .and_then(|c| c.score)
                .is_some_and(|score| score >= self.qa.compliance_threshold)
        };
        let compliance = ComplianceMatrix::new(
            compliant(TestCategory::MedicalAccuracy),
            compliant(TestCategory::Seo),
            compliant(TestCategory::ContentQuality),
            compliant(TestCategory::Accessibility),
        );

        let score_of = |category: TestCategory| {
            categories
                .iter()
                .find(|c| c.category == category)
                .and_then(|c| c.score)
                .unwrap_or(0.0)
        };
        let quality_gates = vec![
            QualityGateOutcome::at_least("overall", overall_score, self.qa.gate_overall),
            QualityGateOutcome::at_least(
                "medical_accuracy",
                score_of(TestCategory::MedicalAccuracy),
                self.qa.gate_medical,
            ),
            QualityGateOutcome::at_least("seo", score_of(TestCategory::Seo), self.qa.gate_seo),
            QualityGateOutcome::at_least(
                "readability",
                view.readability.flesch_score,
                self.qa.gate_readability,
            ),
            QualityGateOutcome::at_least(
                "word_count",
                view.readability.words as f64,
                self.scoring.min_word_count as f64,
            ),
        ];

        let certification =
            certification_for(overall_score, compliance.overall, &self.qa.certification);
        let deltas = prior.map(|prior| deltas(prior, &categories)).unwrap_or_default();
        let recommendations = categories
            .iter()
            .flat_map(|c| {
                c.tests
                    .iter()
                    .filter(|t| t.status == TestStatus::Failed)
                    .map(move |t| format!("{}: {} - {}", c.category, t.name, t.message))
            })
            .collect();

        info!(
            location = %content.location,
            overall_score,
            %certification,
            compliant = compliance.overall,
            "QA complete"
        );

        ComprehensiveQaResult {
            location: content.location.clone(),
            slug: content.slug.clone(),
            overall_score,
            categories,
            compliance,
            quality_gates,
            certification,
            deltas,
            recommendations,
            tested_at: Utc::now(),
        }
    }

    fn run_category(&self, category: TestCategory, view: &PageView<'_>) -> CategoryResult {
        let tests = match category {
            TestCategory::ContentQuality => self.content_quality(view),
            TestCategory::MedicalAccuracy => self.medical_accuracy(view),
            TestCategory::Seo => self.seo(view),
            TestCategory::LocalRelevance => self.local_relevance(view),
            TestCategory::Accessibility => self.accessibility(view),
            TestCategory::BrandConsistency => self.brand_consistency(view),
            TestCategory::Performance => {
                return CategoryResult::skipped(
                    category,
                    "static pages have no runtime instrumentation",
                )
            }
            TestCategory::TechnicalValidation => self.technical_validation(view),
        };
        CategoryResult::from_tests(category, tests, self.qa.category_pass_threshold)
    }

    fn content_quality(&self, view: &PageView<'_>) -> Vec<TestResult> {
        let validation = self.content.validate(view.content);
        let summary = match validation.issues.len() {
            0 => "no issues".to_string(),
            n => format!(
                "{n} issues: {}",
                validation
                    .issues
                    .iter()
                    .map(|i| i.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            ),
        };
        let words = view.readability.words;
        let min_words = self.scoring.min_word_count.max(1);
        let flesch = view.readability.flesch_score;
        let target = self.scoring.readability_target;
        vec![
            TestResult::scored(
                "content_validation",
                validation.score,
                self.qa.category_pass_threshold,
                summary,
            ),
            TestResult::scored(
                "word_count",
                words as f64 / min_words as f64 * 100.0,
                100.0,
                format!("{words} words (minimum {min_words})"),
            ),
            TestResult::scored(
                "readability",
                if target > 0.0 { flesch / target * 100.0 } else { 100.0 },
                100.0,
                format!("Flesch {flesch:.1} (target {target})"),
            ),
        ]
    }

    fn medical_accuracy(&self, view: &PageView<'_>) -> Vec<TestResult> {
        let validation = self.medical.validate(&view.body);
        let issues = validation
            .issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        let has_disclaimer = !validation
            .issues
            .iter()
            .any(|i| i.kind == MedicalIssueKind::MissingDisclaimer);
        vec![
            TestResult::scored(
                "medical_rules",
                validation.score,
                self.qa.gate_medical,
                if issues.is_empty() { "no issues".to_string() } else { issues },
            ),
            TestResult::check(
                "no_prohibited_claims",
                !validation.has_prohibited_claims(),
                "page must not promise outcomes",
            ),
            TestResult::check("disclaimer_present", has_disclaimer, "medical disclaimer"),
        ]
    }

    fn seo(&self, view: &PageView<'_>) -> Vec<TestResult> {
        let research = view.data.research_view();
        let result = self.scorer.score(
            ScoringMode::Advanced,
            view.content,
            &research,
            Some(view.data),
        );
        let meta = &result.metrics.meta;
        let schema = SchemaValidator::validate_location_schema(view.data);
        vec![
            TestResult::scored(
                "seo_score",
                result.overall_score,
                self.qa.gate_seo,
                format!("{} recommendations", result.recommendations.len()),
            ),
            TestResult::check(
                "title_length",
                meta.title.is_optimal,
                format!("{} characters", meta.title.length),
            ),
            TestResult::check(
                "description_length",
                meta.description.is_optimal,
                format!("{} characters", meta.description.length),
            ),
            TestResult::check(
                "structured_data",
                schema.is_valid,
                if schema.is_valid {
                    "valid".to_string()
                } else {
                    schema.errors.join("; ")
                },
            ),
        ]
    }

    fn local_relevance(&self, view: &PageView<'_>) -> Vec<TestResult> {
        let data = view.data;
        let body = &view.body;
        let mentions = count_phrase(body, &data.display_name);
        let min_mentions = self.scoring.min_location_mentions.max(1);

        let mut tests = vec![TestResult::scored(
            "location_mentions",
            mentions as f64 / min_mentions as f64 * 100.0,
            100.0,
            format!("{mentions} mentions (minimum {min_mentions})"),
        )];
        tests.push(mention_check("landmarks", body, &data.landmarks));
        tests.push(mention_check("nearby_areas", body, &data.nearby_areas));
        let transport: Vec<String> = data
            .transport
            .metro_stations
            .iter()
            .chain(&data.transport.bus_routes)
            .chain(&data.transport.major_roads)
            .cloned()
            .collect();
        tests.push(mention_check("transport", body, &transport));
        tests
    }

    fn accessibility(&self, view: &PageView<'_>) -> Vec<TestResult> {
        let seo = &view.content.seo;
        let flesch = view.readability.flesch_score;
        let plain = self.qa.plain_language_flesch;
        let vague_links: Vec<String> = MARKDOWN_LINK_TEXT
            .captures_iter(&view.body)
            .map(|caps| caps[1].trim().to_lowercase())
            .filter(|text| text.is_empty() || VAGUE_LINK_TEXT.contains(&text.as_str()))
            .collect();
        vec![
            TestResult::check("h1_present", !seo.h1.trim().is_empty(), "page has an H1"),
            TestResult::scored(
                "plain_language",
                flesch / plain * 100.0,
                100.0,
                format!("Flesch {flesch:.1} (plain language is {plain})"),
            ),
            TestResult::check(
                "descriptive_links",
                vague_links.is_empty(),
                if vague_links.is_empty() {
                    "all link text is descriptive".to_string()
                } else {
                    format!("vague link text: {}", vague_links.join(", "))
                },
            ),
            TestResult::check(
                "faq_present",
                !view.content.sections.faq.is_empty(),
                format!("{} FAQ entries", view.content.sections.faq.len()),
            ),
        ]
    }

    fn brand_consistency(&self, view: &PageView<'_>) -> Vec<TestResult> {
        let body = &view.body;
        let informal: Vec<&str> = self
            .lexicon
            .informal_words
            .iter()
            .filter(|w| contains_phrase(body, w))
            .map(String::as_str)
            .collect();
        let insensitive: Vec<&str> = self
            .lexicon
            .sensitivity_replacements
            .iter()
            .map(|(from, _)| from.as_str())
            .filter(|term| contains_phrase(body, term))
            .collect();
        let clinic = &view.data.clinic.name;
        let cta = &view.content.sections.cta;
        let has_booking_cta = cta.contains("/book-appointment") || contains_phrase(cta, "book");

        vec![
            TestResult::scored(
                "register",
                100.0 - self.qa.informal_word_penalty * informal.len() as f64,
                100.0,
                if informal.is_empty() {
                    "no informal words".to_string()
                } else {
                    format!("informal words: {}", informal.join(", "))
                },
            ),
            TestResult::scored(
                "sensitive_language",
                100.0 - self.qa.insensitive_term_penalty * insensitive.len() as f64,
                100.0,
                if insensitive.is_empty() {
                    "no insensitive terms".to_string()
                } else {
                    format!("insensitive terms: {}", insensitive.join(", "))
                },
            ),
            TestResult::check(
                "clinic_name",
                contains_phrase(body, clinic),
                format!("page names {clinic}"),
            ),
            TestResult::check("call_to_action", has_booking_cta, "CTA invites a booking"),
        ]
    }

    fn technical_validation(&self, view: &PageView<'_>) -> Vec<TestResult> {
        let data = view.data;
        let seo = &view.content.seo;
        let expected_url = data.clinic.page_url(&data.slug);
        let schema = SchemaValidator::validate_location_schema(data);
        let meta_complete = [&seo.title, &seo.description, &seo.h1]
            .iter()
            .all(|field| !field.trim().is_empty());
        vec![
            TestResult::check(
                "url_safe_slug",
                URL_SAFE_SLUG.is_match(&data.slug),
                format!("slug \"{}\"", data.slug),
            ),
            TestResult::check(
                "canonical_url",
                data.url == expected_url && data.url.starts_with("https://"),
                data.url.clone(),
            ),
            TestResult::check(
                "schema_valid",
                schema.is_valid,
                if schema.is_valid {
                    "JSON-LD is valid".to_string()
                } else {
                    schema.errors.join("; ")
                },
            ),
            TestResult::check("meta_complete", meta_complete, "title, description and H1 set"),
        ]
    }
}

/// Check that at least one of `items` is named in the body. Skipped when
/// research supplied no items.
fn mention_check(name: &str, body: &str, items: &[String]) -> TestResult {
    if items.is_empty() {
        return TestResult::skipped(name, "no research data");
    }
    let found = items.iter().filter(|item| contains_phrase(body, item)).count();
    TestResult::check(name, found > 0, format!("{found} of {} mentioned", items.len()))
}

fn deltas(prior: &ComprehensiveQaResult, current: &[CategoryResult]) -> Vec<CategoryDelta> {
    current
        .iter()
        .filter_map(|result| {
            let now = result.score?;
            let before = prior.score_of(result.category)?;
            Some(CategoryDelta {
                category: result.category,
                previous: before,
                current: now,
                delta: now - before,
            })
        })
        .collect()
}
