//! Title and meta description checks.

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;

/// Inclusive character-length bounds for the page title and description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaLimits {
    pub title_min: usize,
    pub title_max: usize,
    pub description_min: usize,
    pub description_max: usize,
}

impl Default for MetaLimits {
    fn default() -> Self {
        Self::from(&ScoringConfig::default())
    }
}

impl From<&ScoringConfig> for MetaLimits {
    fn from(config: &ScoringConfig) -> Self {
        Self {
            title_min: config.title_min_length,
            title_max: config.title_max_length,
            description_min: config.description_min_length,
            description_max: config.description_max_length,
        }
    }
}

/// Result of checking one meta field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaValidation {
    /// Length in characters
    pub length: usize,
    pub is_optimal: bool,
    pub issues: Vec<String>,
}

/// Validates and rebuilds page titles and meta descriptions.
#[derive(Debug, Clone, Default)]
pub struct MetaTagOptimizer {
    limits: MetaLimits,
}

const DESCRIPTION_FILLER: &str = "Call or book online for a same-week appointment.";

impl MetaTagOptimizer {
    pub fn new(limits: MetaLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> MetaLimits {
        self.limits
    }

    /// A title is optimal iff its length lies in `[title_min, title_max]`.
    pub fn validate_title(&self, title: &str) -> MetaValidation {
        check_length("title", title, self.limits.title_min, self.limits.title_max)
    }

    /// A description is optimal iff its length lies in
    /// `[description_min, description_max]`.
    pub fn validate_description(&self, description: &str) -> MetaValidation {
        check_length(
            "description",
            description,
            self.limits.description_min,
            self.limits.description_max,
        )
    }

    /// Build a title for the page that fits the limits when possible.
    pub fn optimize_title(&self, focus: &str, location: &str, brand: &str) -> String {
        let candidates = [
            format!("{focus} in {location} | {brand}"),
            format!("{focus} in {location} | Book an Appointment"),
            format!("{focus} in {location} | Women's Health Clinic"),
            format!("{focus} in {location}"),
        ];
        if let Some(fit) = candidates
            .iter()
            .find(|candidate| self.validate_title(candidate).is_optimal)
        {
            return fit.clone();
        }
        truncate_at_word(&candidates[0], self.limits.title_max)
    }

    /// Build a meta description that fits the limits when possible.
    pub fn optimize_description(
        &self,
        focus: &str,
        location: &str,
        city: &str,
        brand: &str,
    ) -> String {
        let place = if city.is_empty() || city.eq_ignore_ascii_case(location) {
            location.to_string()
        } else {
            format!("{location}, {city}")
        };
        let candidates = [
            format!(
                "Looking for a {focus} in {place}? {brand} offers pregnancy care, fertility \
                 treatment and PCOS care. Book an appointment today."
            ),
            format!(
                "Trusted {focus} in {place}. {brand} offers pregnancy and fertility care. \
                 Book an appointment today."
            ),
            format!("See a {focus} in {place} at {brand}. Book an appointment today."),
        ];
        if let Some(fit) = candidates
            .iter()
            .find(|candidate| self.validate_description(candidate).is_optimal)
        {
            return fit.clone();
        }

        // Pad the shortest candidate, then trim to the upper bound.
        let mut description = candidates[candidates.len() - 1].clone();
        if description.chars().count() < self.limits.description_min {
            description = format!("{description} {DESCRIPTION_FILLER}");
        }
        truncate_at_word(&description, self.limits.description_max)
    }
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> MetaValidation {
    let length = value.trim().chars().count();
    let mut issues = Vec::new();
    if length == 0 {
        issues.push(format!("{field} is empty"));
    } else if length < min {
        issues.push(format!("{field} is too short ({length} < {min} characters)"));
    } else if length > max {
        issues.push(format!("{field} is too long ({length} > {max} characters)"));
    }
    MetaValidation {
        length,
        is_optimal: issues.is_empty(),
        issues,
    }
}

/// Cut text to at most `max` characters at a word boundary, dropping
/// dangling separators.
pub fn truncate_at_word(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut end = 0;
    for (count, (idx, ch)) in text.char_indices().enumerate() {
        if count > max {
            break;
        }
        if ch.is_whitespace() {
            end = idx;
        }
    }
    let cut: String = if end == 0 {
        text.chars().take(max).collect()
    } else {
        text[..end].to_string()
    };
    cut.trim_end_matches(|c: char| c.is_whitespace() || ",;:-|".contains(c))
        .to_string()
}
