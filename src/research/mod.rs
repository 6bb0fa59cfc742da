//! Location research data.
//!
//! Research is supplied by an external provider (market data, maps,
//! competitor listings). The pipeline only consumes the flat
//! [`ResearchResult`] record; every field has a fallback default so a
//! sparse provider never stops generation.

pub mod provider;

pub use provider::{FileResearchProvider, ResearchError, ResearchProvider, StaticResearchProvider};

use serde::{Deserialize, Serialize};
use std::fmt;

/// How crowded the local search market is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for CompetitionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompetitionLevel::Low => write!(f, "low"),
            CompetitionLevel::Medium => write!(f, "medium"),
            CompetitionLevel::High => write!(f, "high"),
        }
    }
}

/// Geographic coordinates. Either value may be missing from research.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }
}

/// Population profile of the locality.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Demographics {
    pub median_age: Option<f32>,
    pub literacy_rate: Option<f32>,
    pub primary_languages: Vec<String>,
    pub income_level: String,
}

/// A competing practice near the locality.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Competitor {
    pub name: String,
    pub rating: Option<f32>,
    pub distance_km: Option<f32>,
}

/// Public transport and road access.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportInfo {
    pub metro_stations: Vec<String>,
    pub bus_routes: Vec<String>,
    pub major_roads: Vec<String>,
}

/// Facts about a locality, produced once per pipeline run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchResult {
    pub location: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub population: String,
    pub coordinates: Coordinates,
    pub demographics: Demographics,
    pub landmarks: Vec<String>,
    pub nearby_areas: Vec<String>,
    pub hospitals: Vec<String>,
    pub competitors: Vec<Competitor>,
    pub transport: TransportInfo,
    pub search_volume: u32,
    pub competition_level: CompetitionLevel,
}

impl ResearchResult {
    /// Research record with only the names filled in.
    pub fn fallback(location: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            city: city.into(),
            ..Default::default()
        }
    }

    /// Fill blank identity fields from the requested names.
    pub fn with_defaults(mut self, location: &str, city: &str) -> Self {
        if self.location.trim().is_empty() {
            self.location = location.to_string();
        }
        if self.city.trim().is_empty() {
            self.city = city.to_string();
        }
        self
    }
}
