//! End-to-end location page pipeline.
//!
//! research -> generate -> optimize -> assemble -> QA -> persist
//!
//! Stages report progress through a [`PipelineObserver`] instead of
//! printing, so the same pipeline drives the CLI progress bars, plain
//! tracing output, and silent test runs.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LocpageConfig;
use crate::content::{ContentGenerationEngine, GeneratedContent};
use crate::lexicon::Lexicon;
use crate::location::LocationSeoData;
use crate::output::{
    write_atomic, FileGenerator, GenerationReport, OutputError, RegistryEntry, RegistryManager,
};
use crate::quality::{
    CategoryProgressUpdate, CertificationLevel, ComprehensiveQaResult,
    QualityAssuranceOrchestrator,
};
use crate::research::{ResearchError, ResearchProvider};
use crate::seo::{ContentOptimizer, OptimizationOutcome, SeoScorer};

/// Directory, relative to the site root, for pipeline state.
const STATE_DIR: &str = ".locpage";

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Research,
    Generate,
    Optimize,
    Assemble,
    QualityAssurance,
    Persist,
    Registry,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Research => "research",
            PipelineStage::Generate => "generate",
            PipelineStage::Optimize => "optimize",
            PipelineStage::Assemble => "assemble",
            PipelineStage::QualityAssurance => "quality assurance",
            PipelineStage::Persist => "persist",
            PipelineStage::Registry => "registry",
        };
        f.write_str(name)
    }
}

/// Errors that abort a location run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage failed; the location produced no output.
    #[error("{stage} failed for {location}: {source}")]
    Stage {
        location: String,
        stage: PipelineStage,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PipelineError {
    fn stage(
        location: &str,
        stage: PipelineStage,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Stage {
            location: location.to_string(),
            stage,
            source: Box::new(source),
        }
    }

    pub fn failed_stage(&self) -> PipelineStage {
        match self {
            Self::Stage { stage, .. } => *stage,
        }
    }
}

impl From<(&str, ResearchError)> for PipelineError {
    fn from((location, err): (&str, ResearchError)) -> Self {
        Self::stage(location, PipelineStage::Research, err)
    }
}

/// Events emitted while a pipeline runs.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    StageStarted {
        location: String,
        stage: PipelineStage,
    },
    StageCompleted {
        location: String,
        stage: PipelineStage,
        duration: Duration,
    },
    Optimized {
        location: String,
        initial_score: f64,
        final_score: f64,
        iterations: usize,
    },
    QaProgress {
        location: String,
        update: CategoryProgressUpdate,
    },
    LocationFinished {
        location: String,
        overall_score: f64,
        certification: CertificationLevel,
    },
    LocationFailed {
        location: String,
        error: String,
    },
    /// Pause between batch items.
    Throttled { delay: Duration },
}

/// Receives pipeline events.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {
    fn on_event(&self, _event: &PipelineEvent) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { location, stage } => {
                debug!(%location, %stage, "Stage started");
            }
            PipelineEvent::StageCompleted {
                location,
                stage,
                duration,
            } => {
                debug!(%location, %stage, ?duration, "Stage completed");
            }
            PipelineEvent::Optimized {
                location,
                initial_score,
                final_score,
                iterations,
            } => {
                info!(%location, initial_score, final_score, iterations, "Optimized content");
            }
            PipelineEvent::QaProgress { location, update } => {
                debug!(%location, category = %update.category, state = ?update.state, "QA");
            }
            PipelineEvent::LocationFinished {
                location,
                overall_score,
                certification,
            } => {
                info!(%location, overall_score, %certification, "Location finished");
            }
            PipelineEvent::LocationFailed { location, error } => {
                warn!(%location, %error, "Location failed");
            }
            PipelineEvent::Throttled { delay } => {
                debug!(?delay, "Waiting before next location");
            }
        }
    }
}

/// Everything one location run produced.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    pub location: String,
    pub slug: String,
    pub location_data: LocationSeoData,
    pub optimization: OptimizationOutcome,
    pub qa: ComprehensiveQaResult,
    /// Files rendered (and written unless dry run)
    pub files: GenerationReport,
    /// Stored registry entry; `None` in dry-run mode
    pub registry_entry: Option<RegistryEntry>,
}

impl PipelineRunResult {
    pub fn content(&self) -> &GeneratedContent {
        &self.optimization.content
    }

    pub fn summary(&self) -> LocationSummary {
        LocationSummary {
            location: self.location.clone(),
            slug: self.slug.clone(),
            seo_score: self.optimization.result.overall_score,
            qa_score: self.qa.overall_score,
            certification: self.qa.certification,
            files_written: self.files.written().count(),
        }
    }
}

/// Compact outcome of one location, as kept in a batch report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSummary {
    pub location: String,
    pub slug: String,
    pub seo_score: f64,
    pub qa_score: f64,
    pub certification: CertificationLevel,
    pub files_written: usize,
}

/// A location that failed in a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub location: String,
    pub stage: PipelineStage,
    pub error: String,
}

/// Per-location outcomes of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<LocationSummary>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn average_qa_score(&self) -> Option<f64> {
        if self.succeeded.is_empty() {
            return None;
        }
        let total: f64 = self.succeeded.iter().map(|s| s.qa_score).sum();
        Some(total / self.succeeded.len() as f64)
    }
}

/// Runs the full pipeline for one location or a batch.
pub struct LocationPipeline {
    config: LocpageConfig,
    provider: Arc<dyn ResearchProvider>,
    engine: ContentGenerationEngine,
    optimizer: ContentOptimizer,
    qa: QualityAssuranceOrchestrator,
    files: FileGenerator,
    registry: RegistryManager,
    observer: Arc<dyn PipelineObserver>,
}

impl LocationPipeline {
    pub fn new(config: LocpageConfig, provider: Arc<dyn ResearchProvider>) -> Self {
        let lexicon = Lexicon::default();
        let engine =
            ContentGenerationEngine::new(lexicon.clone(), config.clinic.clone(), config.brand.clone());
        let scorer = SeoScorer::new(lexicon.clone(), config.scoring.clone());
        let optimizer =
            ContentOptimizer::new(scorer, config.optimizer.clone(), config.clinic.name.clone());
        let qa = QualityAssuranceOrchestrator::new(lexicon, &config);
        let files = FileGenerator::from_config(&config.output);
        let registry =
            RegistryManager::new(&config.output.root).with_backups(config.output.backups);
        Self {
            config,
            provider,
            engine,
            optimizer,
            qa,
            files,
            registry,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &LocpageConfig {
        &self.config
    }

    pub fn registry(&self) -> &RegistryManager {
        &self.registry
    }

    pub fn is_dry_run(&self) -> bool {
        self.files.is_dry_run()
    }

    /// Path of the stored QA report for a slug.
    pub fn qa_report_path(&self, slug: &str) -> PathBuf {
        qa_report_path(&self.config.output.root, slug)
    }

    /// Run every stage for one location.
    ///
    /// Surrounding whitespace is dropped from the location and city
    /// before any stage sees them. The previous QA report for the slug, when present, is used for
    /// score deltas. Files, the registry and the QA report are written
    /// unless the pipeline is in dry-run mode.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Stage`] naming the stage that failed.
    /// Nothing is written for a location that fails before persisting.
    pub async fn run_location(
        &self,
        name: &str,
        city: &str,
    ) -> Result<PipelineRunResult, PipelineError> {
        let name = name.trim();
        let city = city.trim();
        let result = self.run_stages(name, city).await;
        match &result {
            Ok(run) => self.emit(PipelineEvent::LocationFinished {
                location: name.to_string(),
                overall_score: run.qa.overall_score,
                certification: run.qa.certification,
            }),
            Err(e) => self.emit(PipelineEvent::LocationFailed {
                location: name.to_string(),
                error: e.to_string(),
            }),
        }
        result
    }

    async fn run_stages(&self, name: &str, city: &str) -> Result<PipelineRunResult, PipelineError> {
        let started = self.start(name, PipelineStage::Research);
        let research = self
            .provider
            .research(name, city)
            .await
            .map_err(|e| PipelineError::from((name, e)))?;
        self.finish(name, PipelineStage::Research, started);

        let started = self.start(name, PipelineStage::Generate);
        let content = self.engine.generate_location_content(&research, name);
        self.finish(name, PipelineStage::Generate, started);

        let started = self.start(name, PipelineStage::Optimize);
        let draft = LocationSeoData::assemble(&research, &content, &self.config.clinic);
        let optimization = self.optimizer.optimize(&content, &research, Some(&draft));
        self.emit(PipelineEvent::Optimized {
            location: name.to_string(),
            initial_score: optimization.initial_score,
            final_score: optimization.result.overall_score,
            iterations: optimization.iterations.len(),
        });
        self.finish(name, PipelineStage::Optimize, started);

        let started = self.start(name, PipelineStage::Assemble);
        let location_data =
            LocationSeoData::assemble(&research, &optimization.content, &self.config.clinic);
        self.finish(name, PipelineStage::Assemble, started);

        let started = self.start(name, PipelineStage::QualityAssurance);
        let prior = self.load_prior_qa(&location_data.slug);
        let qa = self.qa.run_with_progress(
            &optimization.content,
            &location_data,
            prior.as_ref(),
            |update| {
                self.emit(PipelineEvent::QaProgress {
                    location: name.to_string(),
                    update,
                })
            },
        );
        self.finish(name, PipelineStage::QualityAssurance, started);

        let started = self.start(name, PipelineStage::Persist);
        let mut files = self
            .files
            .generate(&location_data)
            .map_err(|e| PipelineError::stage(name, PipelineStage::Persist, e))?;
        if !self.is_dry_run() {
            self.save_qa(&qa)
                .map_err(|e| PipelineError::stage(name, PipelineStage::Persist, e))?;
        }
        self.finish(name, PipelineStage::Persist, started);

        let registry_entry = if self.is_dry_run() {
            None
        } else {
            let started = self.start(name, PipelineStage::Registry);
            let entry = self
                .registry
                .add_location_to_registry(&location_data)
                .map_err(|e| PipelineError::stage(name, PipelineStage::Registry, e))?;
            let sitemap = self
                .registry
                .list()
                .map_err(|e| PipelineError::stage(name, PipelineStage::Registry, e))
                .and_then(|entries| {
                    self.files
                        .write_sitemap(&entries, &self.config.clinic)
                        .map_err(|e| PipelineError::stage(name, PipelineStage::Registry, e))
                })?;
            files.files.extend(sitemap.files);
            files.warnings.extend(sitemap.warnings);
            self.finish(name, PipelineStage::Registry, started);
            Some(entry)
        };

        Ok(PipelineRunResult {
            location: name.to_string(),
            slug: location_data.slug.clone(),
            location_data,
            optimization,
            qa,
            files,
            registry_entry,
        })
    }

    /// Run a list of locations one after another.
    ///
    /// Locations are processed sequentially with the configured delay
    /// between them. A failing location is recorded and the batch goes on.
    pub async fn batch_optimize_locations(&self, names: &[String], city: &str) -> BatchReport {
        let delay = Duration::from_millis(self.config.optimizer.batch_delay_ms);
        let mut report = BatchReport::default();

        for (index, name) in names.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                self.emit(PipelineEvent::Throttled { delay });
                tokio::time::sleep(delay).await;
            }
            match self.run_location(name, city).await {
                Ok(run) => report.succeeded.push(run.summary()),
                Err(e) => report.failed.push(BatchFailure {
                    location: name.clone(),
                    stage: e.failed_stage(),
                    error: e.to_string(),
                }),
            }
        }

        info!(
            total = report.total(),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Batch complete"
        );
        report
    }

    fn load_prior_qa(&self, slug: &str) -> Option<ComprehensiveQaResult> {
        load_qa_report(&self.config.output.root, slug).unwrap_or_else(|e| {
            warn!(slug, error = %e, "Ignoring unreadable QA report");
            None
        })
    }

    fn save_qa(&self, qa: &ComprehensiveQaResult) -> Result<(), OutputError> {
        let json = serde_json::to_string_pretty(qa)?;
        write_atomic(&self.qa_report_path(&qa.slug), &json, false)?;
        Ok(())
    }

    fn start(&self, location: &str, stage: PipelineStage) -> Instant {
        self.emit(PipelineEvent::StageStarted {
            location: location.to_string(),
            stage,
        });
        Instant::now()
    }

    fn finish(&self, location: &str, stage: PipelineStage, started: Instant) {
        self.emit(PipelineEvent::StageCompleted {
            location: location.to_string(),
            stage,
            duration: started.elapsed(),
        });
    }

    fn emit(&self, event: PipelineEvent) {
        self.observer.on_event(&event);
    }
}

/// Path of the stored QA report for a slug under `root`.
pub fn qa_report_path(root: &Path, slug: &str) -> PathBuf {
    root.join(STATE_DIR).join("qa").join(format!("{slug}.json"))
}

/// Load the stored QA report for a slug under `root`, if any.
pub fn load_qa_report(root: &Path, slug: &str) -> Result<Option<ComprehensiveQaResult>, OutputError> {
    let path = qa_report_path(root, slug);
    match fs::read_to_string(&path) {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(OutputError::io(&path, e)),
    }
}
