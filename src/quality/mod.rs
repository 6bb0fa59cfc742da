//! Quality assurance for generated location pages.
//!
//! The orchestrator runs eight test categories, aggregates their scores,
//! builds a compliance matrix and quality gates, and assigns a
//! certification level.

pub mod orchestrator;
pub mod progress;

pub use orchestrator::QualityAssuranceOrchestrator;
pub use progress::{CategoryProgressState, CategoryProgressUpdate};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::CertificationCutoffs;

/// A QA test category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCategory {
    ContentQuality,
    MedicalAccuracy,
    Seo,
    LocalRelevance,
    Accessibility,
    BrandConsistency,
    Performance,
    TechnicalValidation,
}

impl TestCategory {
    /// All categories in run order.
    pub const ALL: [TestCategory; 8] = [
        TestCategory::ContentQuality,
        TestCategory::MedicalAccuracy,
        TestCategory::Seo,
        TestCategory::LocalRelevance,
        TestCategory::Accessibility,
        TestCategory::BrandConsistency,
        TestCategory::Performance,
        TestCategory::TechnicalValidation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TestCategory::ContentQuality => "content_quality",
            TestCategory::MedicalAccuracy => "medical_accuracy",
            TestCategory::Seo => "seo",
            TestCategory::LocalRelevance => "local_relevance",
            TestCategory::Accessibility => "accessibility",
            TestCategory::BrandConsistency => "brand_consistency",
            TestCategory::Performance => "performance",
            TestCategory::TechnicalValidation => "technical_validation",
        }
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

/// The result of a single QA check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub status: TestStatus,
    /// Score in [0, 100]; ignored for skipped tests
    pub score: f64,
    pub message: String,
}

impl TestResult {
    /// A scored check that passes when `score` reaches `threshold`.
    pub fn scored(
        name: impl Into<String>,
        score: f64,
        threshold: f64,
        message: impl Into<String>,
    ) -> Self {
        let score = score.clamp(0.0, 100.0);
        Self {
            name: name.into(),
            status: if score >= threshold {
                TestStatus::Passed
            } else {
                TestStatus::Failed
            },
            score,
            message: message.into(),
        }
    }

    /// A yes/no check worth 100 or 0.
    pub fn check(name: impl Into<String>, passed: bool, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: if passed {
                TestStatus::Passed
            } else {
                TestStatus::Failed
            },
            score: if passed { 100.0 } else { 0.0 },
            message: message.into(),
        }
    }

    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: TestStatus::Skipped,
            score: 0.0,
            message: format!("Skipped: {}", reason.into()),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

/// Aggregated result of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: TestCategory,
    pub status: TestStatus,
    /// Mean of the non-skipped test scores, in [0, 100]; `None` when skipped
    pub score: Option<f64>,
    pub tests: Vec<TestResult>,
}

impl CategoryResult {
    /// Aggregate test results. The category is skipped when every test is.
    pub fn from_tests(category: TestCategory, tests: Vec<TestResult>, pass_threshold: f64) -> Self {
        let scores: Vec<f64> = tests
            .iter()
            .filter(|t| t.status != TestStatus::Skipped)
            .map(|t| t.score)
            .collect();
        let score = if scores.is_empty() {
            None
        } else {
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            Some(mean.clamp(0.0, 100.0))
        };
        let status = match score {
            None => TestStatus::Skipped,
            Some(s) if s >= pass_threshold => TestStatus::Passed,
            Some(_) => TestStatus::Failed,
        };
        Self {
            category,
            status,
            score,
            tests,
        }
    }

    pub fn skipped(category: TestCategory, reason: &str) -> Self {
        Self::from_tests(category, vec![TestResult::skipped(category.name(), reason)], 0.0)
    }
}

/// Whether the compliance-relevant categories reached the compliance
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComplianceMatrix {
    pub medical: bool,
    pub seo: bool,
    pub content: bool,
    pub accessibility: bool,
    /// AND of the flags above
    pub overall: bool,
}

impl ComplianceMatrix {
    pub fn new(medical: bool, seo: bool, content: bool, accessibility: bool) -> Self {
        Self {
            medical,
            seo,
            content,
            accessibility,
            overall: medical && seo && content && accessibility,
        }
    }
}

/// A named threshold comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityGateOutcome {
    pub name: String,
    pub actual: f64,
    pub threshold: f64,
    pub passed: bool,
}

impl QualityGateOutcome {
    pub fn at_least(name: impl Into<String>, actual: f64, threshold: f64) -> Self {
        Self {
            name: name.into(),
            actual,
            threshold,
            passed: actual >= threshold,
        }
    }
}

/// Certification label derived from the overall score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum CertificationLevel {
    #[default]
    None,
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl fmt::Display for CertificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CertificationLevel::None => "none",
            CertificationLevel::Bronze => "bronze",
            CertificationLevel::Silver => "silver",
            CertificationLevel::Gold => "gold",
            CertificationLevel::Platinum => "platinum",
        };
        write!(f, "{name}")
    }
}

/// Map an overall score to a certification level.
///
/// Cutoffs are inclusive lower bounds. Below the bronze cutoff the level is
/// `None` whatever the compliance flags say; without full compliance the
/// level is capped at silver.
pub fn certification_for(
    overall_score: f64,
    fully_compliant: bool,
    cutoffs: &CertificationCutoffs,
) -> CertificationLevel {
    let level = if overall_score >= cutoffs.platinum {
        CertificationLevel::Platinum
    } else if overall_score >= cutoffs.gold {
        CertificationLevel::Gold
    } else if overall_score >= cutoffs.silver {
        CertificationLevel::Silver
    } else if overall_score >= cutoffs.bronze {
        CertificationLevel::Bronze
    } else {
        CertificationLevel::None
    };
    if !fully_compliant && level > CertificationLevel::Silver {
        CertificationLevel::Silver
    } else {
        level
    }
}

/// Score change of one category against a prior run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDelta {
    pub category: TestCategory,
    pub previous: f64,
    pub current: f64,
    pub delta: f64,
}

/// Everything the orchestrator learned about one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComprehensiveQaResult {
    pub location: String,
    pub slug: String,
    pub overall_score: f64,
    pub categories: Vec<CategoryResult>,
    pub compliance: ComplianceMatrix,
    pub quality_gates: Vec<QualityGateOutcome>,
    pub certification: CertificationLevel,
    /// Per-category change against the prior result, when one was given
    pub deltas: Vec<CategoryDelta>,
    pub recommendations: Vec<String>,
    pub tested_at: DateTime<Utc>,
}

impl ComprehensiveQaResult {
    pub fn category(&self, category: TestCategory) -> Option<&CategoryResult> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn score_of(&self, category: TestCategory) -> Option<f64> {
        self.category(category).and_then(|c| c.score)
    }

    pub fn all_gates_passed(&self) -> bool {
        self.quality_gates.iter().all(|gate| gate.passed)
    }
}
