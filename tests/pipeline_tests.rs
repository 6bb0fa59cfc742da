//! End-to-end tests for the location pipeline.
//!
//! These run research, generation, optimization, QA and file output
//! against a temporary website root.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use locpage::config::LocpageConfig;
use locpage::output::{FileGenerator, LocationStatus, Priority, RegistryManager};
use locpage::pipeline::{load_qa_report, LocationPipeline, PipelineStage};
use locpage::quality::TestCategory;
use locpage::research::FileResearchProvider;

fn research_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("research")
}

fn pipeline_at(root: &Path) -> LocationPipeline {
    let mut config = LocpageConfig::default();
    config.output.root = root.to_path_buf();
    config.optimizer.batch_delay_ms = 0;
    LocationPipeline::new(config, Arc::new(FileResearchProvider::new(research_dir())))
}

#[tokio::test]
async fn test_location_page_end_to_end() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let pipeline = pipeline_at(root.path());

    let run = pipeline
        .run_location("Indira Nagar", "Bangalore")
        .await
        .expect("pipeline should succeed");

    assert_eq!(run.slug, "indira-nagar");
    assert!(run.qa.overall_score >= 0.0 && run.qa.overall_score <= 100.0);
    assert_eq!(run.qa.score_of(TestCategory::Performance), None);
    let medical = run.qa.score_of(TestCategory::MedicalAccuracy).expect("medical is scored");
    assert!(medical >= 80.0, "generated copy should be medically safe, got {medical}");

    let generator = FileGenerator::new(root.path());
    let data_file = std::fs::read_to_string(generator.data_file_path("indira-nagar")).unwrap();
    assert!(data_file.contains("export const indiraNagarData: LocationSEOData"));

    let page = std::fs::read_to_string(generator.page_file_path("indira-nagar")).unwrap();
    assert!(page.contains("application/ld+json"));
    assert!(page.contains("GynecologistInIndiraNagarPage"));

    let sitemap = std::fs::read_to_string(generator.sitemap_path()).unwrap();
    assert!(sitemap.contains("/gynecologist-in-indira-nagar"));

    let entry = RegistryManager::new(root.path())
        .get("indira-nagar")
        .unwrap()
        .expect("registry entry should exist");
    assert_eq!(entry.status, LocationStatus::Draft);
    // 1300 searches is high demand, bumped down for high competition
    assert_eq!(entry.priority, Priority::Medium);

    let stored = load_qa_report(root.path(), "indira-nagar")
        .unwrap()
        .expect("QA report should be stored");
    assert_eq!(stored.overall_score, run.qa.overall_score);
}

#[tokio::test]
async fn test_rerun_keeps_registry_status_and_reports_deltas() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let pipeline = pipeline_at(root.path());

    pipeline.run_location("Koramangala", "Bangalore").await.unwrap();
    pipeline
        .registry()
        .update_status("koramangala", LocationStatus::Active)
        .unwrap();

    let second = pipeline.run_location("Koramangala", "Bangalore").await.unwrap();
    assert!(!second.qa.deltas.is_empty());

    let entries = pipeline.registry().list().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, LocationStatus::Active);
}

#[tokio::test]
async fn test_batch_collects_failures_without_stopping() {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    let pipeline = pipeline_at(root.path());

    let locations = vec![
        "Indira Nagar".to_string(),
        "???".to_string(),
        "Koramangala".to_string(),
    ];
    let report = pipeline.batch_optimize_locations(&locations, "Bangalore").await;

    assert_eq!(report.total(), 3);
    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].location, "???");
    assert_eq!(pipeline.registry().list().unwrap().len(), 2);

    let average = report.average_qa_score().unwrap();
    assert!(average > 0.0);
    assert_eq!(report.failed[0].stage, PipelineStage::Research);
}
