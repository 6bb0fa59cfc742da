//! Research providers.
//!
//! The real research source is external; the pipeline talks to it through
//! the [`ResearchProvider`] trait. Two local providers are included: an
//! in-memory one for tests and a directory of JSON files for scripted runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

use super::ResearchResult;
use crate::content::slugify;

/// Errors that can occur while gathering research.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// The location name is empty or produces an empty slug.
    #[error("invalid location name: {0:?}")]
    InvalidLocation(String),

    /// IO error while reading research data.
    #[error("failed to read research data: {0}")]
    Io(#[from] io::Error),

    /// Research data exists but cannot be parsed.
    #[error("failed to parse research data for {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Supplies demographic, geographic and competitive facts for a location.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    /// Gather research for `location` within `city`.
    async fn research(&self, location: &str, city: &str) -> Result<ResearchResult, ResearchError>;
}

fn validate_location(location: &str) -> Result<String, ResearchError> {
    let slug = slugify(location);
    if slug.is_empty() {
        return Err(ResearchError::InvalidLocation(location.to_string()));
    }
    Ok(slug)
}

/// In-memory provider keyed by location slug.
#[derive(Debug, Clone, Default)]
pub struct StaticResearchProvider {
    records: HashMap<String, ResearchResult>,
}

impl StaticResearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register research for a location.
    pub fn with_record(mut self, research: ResearchResult) -> Self {
        self.records.insert(slugify(&research.location), research);
        self
    }
}

#[async_trait]
impl ResearchProvider for StaticResearchProvider {
    async fn research(&self, location: &str, city: &str) -> Result<ResearchResult, ResearchError> {
        let slug = validate_location(location)?;
        let record = match self.records.get(&slug) {
            Some(record) => record.clone(),
            None => ResearchResult::fallback(location, city),
        };
        Ok(record.with_defaults(location, city))
    }
}

/// Reads `<dir>/<slug>.json` research files.
///
/// A missing file falls back to default research; a malformed one is an
/// error.
#[derive(Debug, Clone)]
pub struct FileResearchProvider {
    dir: PathBuf,
}

impl FileResearchProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl ResearchProvider for FileResearchProvider {
    async fn research(&self, location: &str, city: &str) -> Result<ResearchResult, ResearchError> {
        let slug = validate_location(location)?;
        let path = self.dir.join(format!("{slug}.json"));

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "no research file, using defaults");
                return Ok(ResearchResult::fallback(location, city));
            }
            Err(e) => return Err(ResearchError::Io(e)),
        };

        debug!(path = %path.display(), "loaded research file");
        let research: ResearchResult =
            serde_json::from_str(&content).map_err(|source| ResearchError::Parse {
                location: location.to_string(),
                source,
            })?;
        Ok(research.with_defaults(location, city))
    }
}
