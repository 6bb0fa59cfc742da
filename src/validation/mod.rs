//! Content validators used by the QA orchestrator.

pub mod content;
pub mod medical;

pub use content::{ContentIssue, ContentQualityValidator, ContentValidation, IssueLevel};
pub use medical::{MedicalAccuracyValidator, MedicalIssue, MedicalIssueKind, MedicalValidation};
