//! Configuration layering tests.
//!
//! Kept in their own binary so environment overrides never leak into
//! the unit tests that load the shipped config.

use std::path::PathBuf;

use locpage::config::LocpageConfig;
use locpage::content::{BrandVoice, ContentGenerationEngine};
use locpage::lexicon::Lexicon;
use locpage::location::{ClinicProfile, LocationSeoData};
use locpage::quality::{QualityAssuranceOrchestrator, TestCategory};
use locpage::research::{Coordinates, ResearchResult};

fn shipped_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("config")
        .join("locpage.toml")
}

fn register_score(config: &LocpageConfig) -> f64 {
    let research = ResearchResult {
        location: "Indira Nagar".to_string(),
        city: "Bangalore".to_string(),
        coordinates: Coordinates::new(12.9784, 77.6408),
        ..Default::default()
    };
    let engine = ContentGenerationEngine::new(
        Lexicon::default(),
        ClinicProfile::default(),
        BrandVoice {
            seed: Some(4),
            ..Default::default()
        },
    );
    let mut content = engine.generate_location_content(&research, "Indira Nagar");
    content.sections.hero.push_str(" Our care team is awesome.");
    let data = LocationSeoData::assemble(&research, &content, &ClinicProfile::default());

    let result = QualityAssuranceOrchestrator::new(Lexicon::default(), config)
        .run(&content, &data, None);
    result
        .category(TestCategory::BrandConsistency)
        .expect("brand category present")
        .tests
        .iter()
        .find(|t| t.name == "register")
        .expect("register test present")
        .score
}

#[test]
fn test_env_override_changes_informal_word_penalty() {
    let path = shipped_config();
    let shipped = LocpageConfig::load(&path).expect("shipped config should load");
    assert_eq!(shipped.qa.informal_word_penalty, 20.0);
    assert_eq!(register_score(&shipped), 80.0);

    std::env::set_var("LOCPAGE__QA__INFORMAL_WORD_PENALTY", "45");
    let overridden = LocpageConfig::load(&path);
    std::env::remove_var("LOCPAGE__QA__INFORMAL_WORD_PENALTY");
    let overridden = overridden.expect("overridden config should load");

    assert_eq!(overridden.qa.informal_word_penalty, 45.0);
    assert_eq!(overridden.qa.insensitive_term_penalty, 25.0);
    assert_eq!(register_score(&overridden), 55.0);
}
