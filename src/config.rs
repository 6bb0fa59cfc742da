//! Pipeline configuration.
//!
//! Every threshold and penalty used by the scorers lives here so that the
//! numbers can be tuned from `config/locpage.toml` or from environment
//! variables instead of being baked into the scoring code.

use config::{Config, ConfigError as SourceError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::content::BrandVoice;
use crate::location::ClinicProfile;
use crate::seo::ScoringMode;

/// SEO thresholds and recommendation penalties.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Shortest title considered optimal (inclusive)
    pub title_min_length: usize,
    /// Longest title considered optimal (inclusive)
    pub title_max_length: usize,
    /// Shortest meta description considered optimal (inclusive)
    pub description_min_length: usize,
    /// Longest meta description considered optimal (inclusive)
    pub description_max_length: usize,
    /// Lower bound for primary keyword density, in percent
    pub keyword_density_min: f64,
    /// Upper bound for primary keyword density, in percent
    pub keyword_density_max: f64,
    /// Minimum Flesch Reading Ease score
    pub readability_target: f64,
    /// Readability this far below the target is a high severity problem
    pub readability_severe_margin: f64,
    /// Minimum body word count
    pub min_word_count: usize,
    /// Minimum number of internal links
    pub min_internal_links: usize,
    /// Minimum number of location name mentions
    pub min_location_mentions: usize,
    /// Fraction of LSI keywords that should appear (0.0 - 1.0)
    pub min_lsi_coverage: f64,
    /// Minimum number of FAQ entries
    pub min_faq_entries: usize,
    /// Competitive edge section length below which a nearby competitor
    /// triggers a recommendation
    pub min_competitive_edge_words: usize,
    /// Content quality score deducted per error-level issue
    pub content_error_penalty: f64,
    /// Content quality score deducted per warning-level issue
    pub content_warning_penalty: f64,
    /// Score deducted for a high severity recommendation
    pub penalty_high: f64,
    /// Score deducted for a medium severity recommendation
    pub penalty_medium: f64,
    /// Score deducted for a low severity recommendation
    pub penalty_low: f64,
    /// Meta score awarded for an optimal title
    pub title_points: f64,
    /// Meta score awarded for an optimal description
    pub description_points: f64,
    /// Meta score awarded for a non-empty keyword list
    pub keywords_points: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            title_min_length: 30,
            title_max_length: 60,
            description_min_length: 120,
            description_max_length: 160,
            keyword_density_min: 0.5,
            keyword_density_max: 2.5,
            readability_target: 40.0,
            readability_severe_margin: 20.0,
            min_word_count: 600,
            min_internal_links: 3,
            min_location_mentions: 5,
            min_lsi_coverage: 0.5,
            min_faq_entries: 4,
            min_competitive_edge_words: 30,
            content_error_penalty: 20.0,
            content_warning_penalty: 5.0,
            penalty_high: 15.0,
            penalty_medium: 8.0,
            penalty_low: 3.0,
            title_points: 40.0,
            description_points: 40.0,
            keywords_points: 20.0,
        }
    }
}

/// Penalties applied by the medical accuracy validator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MedicalConfig {
    pub prohibited_claim_penalty: f64,
    pub superlative_penalty: f64,
    pub missing_disclaimer_penalty: f64,
    pub missing_reference_penalty: f64,
    /// Minimum score for content to count as accurate
    pub accuracy_threshold: f64,
}

impl Default for MedicalConfig {
    fn default() -> Self {
        Self {
            prohibited_claim_penalty: 30.0,
            superlative_penalty: 15.0,
            missing_disclaimer_penalty: 10.0,
            missing_reference_penalty: 5.0,
            accuracy_threshold: 70.0,
        }
    }
}

/// Score cutoffs for each certification level (inclusive lower bounds).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificationCutoffs {
    pub bronze: f64,
    pub silver: f64,
    pub gold: f64,
    pub platinum: f64,
}

impl Default for CertificationCutoffs {
    fn default() -> Self {
        Self {
            bronze: 70.0,
            silver: 80.0,
            gold: 90.0,
            platinum: 95.0,
        }
    }
}

/// Quality assurance thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    /// A category passes when its score reaches this value
    pub category_pass_threshold: f64,
    /// A compliance flag is set when its category score reaches this value
    pub compliance_threshold: f64,
    /// Certification level cutoffs
    pub certification: CertificationCutoffs,
    /// Quality gate: minimum overall score
    pub gate_overall: f64,
    /// Quality gate: minimum medical accuracy score
    pub gate_medical: f64,
    /// Quality gate: minimum SEO score
    pub gate_seo: f64,
    /// Quality gate: minimum Flesch Reading Ease
    pub gate_readability: f64,
    /// Flesch score that counts as plain language for accessibility
    pub plain_language_flesch: f64,
    /// Brand score deducted per informal word
    pub informal_word_penalty: f64,
    /// Brand score deducted per insensitive term
    pub insensitive_term_penalty: f64,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            category_pass_threshold: 70.0,
            compliance_threshold: 80.0,
            certification: CertificationCutoffs::default(),
            gate_overall: 75.0,
            gate_medical: 80.0,
            gate_seo: 70.0,
            gate_readability: 30.0,
            plain_language_flesch: 60.0,
            informal_word_penalty: 20.0,
            insensitive_term_penalty: 25.0,
        }
    }
}

/// Bounds for the content optimization loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Maximum optimization passes per location
    pub max_iterations: u32,
    /// Stop when a pass improves the score by less than this
    pub min_improvement: f64,
    /// Stop as soon as the score reaches this value
    pub target_score: f64,
    /// Pause between locations in a batch run, in milliseconds
    pub batch_delay_ms: u64,
    /// Scorer used inside the loop
    pub mode: ScoringMode,
    /// Sentences longer than this are split at clause boundaries
    pub long_sentence_words: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            min_improvement: 2.0,
            target_score: 85.0,
            batch_delay_ms: 1000,
            mode: ScoringMode::Advanced,
            long_sentence_words: 20,
        }
    }
}

/// Where generated files go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the website project
    pub root: PathBuf,
    /// Render files without writing them
    pub dry_run: bool,
    /// Copy existing files to `<name>.bak` before overwriting
    pub backups: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            dry_run: false,
            backups: true,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(#[from] SourceError),

    /// The configuration file path is invalid.
    #[error("invalid configuration path: {0}")]
    InvalidPath(String),

    /// The effective configuration could not be rendered.
    #[error("failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Root configuration for the location page pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocpageConfig {
    pub scoring: ScoringConfig,
    pub medical: MedicalConfig,
    pub qa: QaConfig,
    pub optimizer: OptimizerConfig,
    pub brand: BrandVoice,
    pub clinic: ClinicProfile,
    pub output: OutputConfig,
}

impl LocpageConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables override file values using the format
    /// `LOCPAGE__<SECTION>__<KEY>`, e.g. `LOCPAGE__OPTIMIZER__MAX_ITERATIONS=5`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, the path is not valid
    /// UTF-8, or the contents cannot be deserialized.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use locpage::config::LocpageConfig;
    ///
    /// let config = LocpageConfig::load("config/locpage.toml")?;
    /// # Ok::<(), locpage::config::ConfigError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::InvalidPath(format!("{:?}", path)))?;

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path_str.to_string()));
        }

        let config = Config::builder()
            .add_source(File::with_name(path_str))
            .add_source(
                Environment::with_prefix("LOCPAGE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load from a file when one is given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Tone;

    #[test]
    fn test_defaults_match_documented_constants() {
        let config = LocpageConfig::default();
        assert_eq!(config.scoring.title_min_length, 30);
        assert_eq!(config.scoring.title_max_length, 60);
        assert_eq!(config.medical.prohibited_claim_penalty, 30.0);
        assert_eq!(config.optimizer.max_iterations, 3);
        assert_eq!(config.optimizer.min_improvement, 2.0);
        assert_eq!(config.qa.certification.bronze, 70.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r#"
            [scoring]
            title_max_length = 65

            [brand]
            tone = "warm"
        "#;

        let config: LocpageConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.scoring.title_max_length, 65);
        assert_eq!(config.scoring.title_min_length, 30);
        assert_eq!(config.brand.tone, Tone::Warm);
        assert_eq!(config.qa.compliance_threshold, 80.0);
    }

    #[test]
    fn test_load_file_not_found() {
        let result = LocpageConfig::load("nonexistent/path/locpage.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_shipped_config() {
        let config = LocpageConfig::load("config/locpage.toml")
            .expect("shipped config should load");
        assert_eq!(config.qa.certification.platinum, 95.0);
        assert!(!config.clinic.name.is_empty());
        assert!(!config.clinic.insurance_accepted.is_empty());
    }

    #[test]
    fn test_to_toml_reloads() {
        let rendered = LocpageConfig::default().to_toml().unwrap();
        assert!(rendered.contains("[optimizer]"));

        let reloaded: LocpageConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(reloaded.optimizer.max_iterations, 3);
        assert_eq!(reloaded.clinic.packages.len(), 2);
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = LocpageConfig::load_or_default(None).unwrap();
        assert_eq!(config.optimizer.target_score, 85.0);
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::FileNotFound("locpage.toml".to_string());
        assert_eq!(err.to_string(), "configuration file not found: locpage.toml");
    }
}
