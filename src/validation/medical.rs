//! Rule-based medical accuracy checks.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::MedicalConfig;
use crate::lexicon::{contains_phrase, count_phrase, Lexicon};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicalIssueKind {
    ProhibitedClaim,
    UnqualifiedSuperlative,
    MissingDisclaimer,
    MissingProfessionalReference,
}

/// A rule violation and the score it cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalIssue {
    pub kind: MedicalIssueKind,
    pub message: String,
    pub penalty: f64,
}

impl fmt::Display for MedicalIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (-{})", self.message, self.penalty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalValidation {
    pub is_accurate: bool,
    pub issues: Vec<MedicalIssue>,
    /// 100 minus penalties, clamped to [0, 100]
    pub score: f64,
}

impl MedicalValidation {
    pub fn has_prohibited_claims(&self) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.kind == MedicalIssueKind::ProhibitedClaim)
    }
}

/// Linear checklist over the lexicon's claim and disclaimer lists.
#[derive(Debug, Clone)]
pub struct MedicalAccuracyValidator {
    lexicon: Lexicon,
    config: MedicalConfig,
}

impl MedicalAccuracyValidator {
    pub fn new(lexicon: Lexicon, config: MedicalConfig) -> Self {
        Self { lexicon, config }
    }

    /// Score `text` starting from 100.
    ///
    /// Each prohibited claim and each unqualified superlative is charged per
    /// occurrence. A missing disclaimer is charged once, as is clinical
    /// vocabulary without any reference to a qualified professional. The
    /// text is accurate iff it makes no prohibited claim and the score
    /// reaches the configured threshold.
    pub fn validate(&self, text: &str) -> MedicalValidation {
        let mut issues = Vec::new();

        for claim in &self.lexicon.prohibited_claims {
            for _ in 0..count_phrase(text, claim) {
                issues.push(MedicalIssue {
                    kind: MedicalIssueKind::ProhibitedClaim,
                    message: format!("prohibited claim \"{claim}\""),
                    penalty: self.config.prohibited_claim_penalty,
                });
            }
        }
        for superlative in &self.lexicon.unqualified_superlatives {
            for _ in 0..count_phrase(text, superlative) {
                issues.push(MedicalIssue {
                    kind: MedicalIssueKind::UnqualifiedSuperlative,
                    message: format!("unqualified superlative \"{superlative}\""),
                    penalty: self.config.superlative_penalty,
                });
            }
        }

        let has_disclaimer = self
            .lexicon
            .disclaimer_markers
            .iter()
            .any(|marker| contains_phrase(text, marker));
        if !has_disclaimer {
            issues.push(MedicalIssue {
                kind: MedicalIssueKind::MissingDisclaimer,
                message: "no medical disclaimer".to_string(),
                penalty: self.config.missing_disclaimer_penalty,
            });
        }

        let uses_medical_terms = self
            .lexicon
            .medical_terms
            .iter()
            .any(|term| contains_phrase(text, term));
        let references_professional = self
            .lexicon
            .professional_references
            .iter()
            .any(|reference| contains_phrase(text, reference));
        if uses_medical_terms && !references_professional {
            issues.push(MedicalIssue {
                kind: MedicalIssueKind::MissingProfessionalReference,
                message: "medical terms without a reference to a qualified professional"
                    .to_string(),
                penalty: self.config.missing_reference_penalty,
            });
        }

        let penalty: f64 = issues.iter().map(|issue| issue.penalty).sum();
        let score = (100.0 - penalty).clamp(0.0, 100.0);
        let has_prohibited = issues
            .iter()
            .any(|issue| issue.kind == MedicalIssueKind::ProhibitedClaim);

        MedicalValidation {
            is_accurate: !has_prohibited && score >= self.config.accuracy_threshold,
            issues,
            score,
        }
    }
}
