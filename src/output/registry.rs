//! Registry of generated location pages.
//!
//! The registry lives in `data/locations/registry.json` and is re-rendered
//! as `data/locations/registry.ts` after every mutation so the site can
//! import it. Entries are unique by slug. There is no locking; concurrent
//! writers race and the last one wins.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::{write_atomic, OutputError, LOCATIONS_DIR};
use crate::location::LocationSeoData;
use crate::research::CompetitionLevel;

const REGISTRY_JSON: &str = "registry.json";
const REGISTRY_TS: &str = "registry.ts";

/// Current registry file format version.
pub const REGISTRY_VERSION: u32 = 1;

/// Errors that can occur during registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Reading or writing a registry file failed.
    #[error(transparent)]
    Output(#[from] OutputError),

    /// The registry file is not valid JSON.
    #[error("invalid registry file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Registry format version mismatch.
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// No entry with the given slug.
    #[error("location not in registry: {0}")]
    NotFound(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Publication status of a location page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Archived,
}

impl LocationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LocationStatus::Draft => "draft",
            LocationStatus::Active => "active",
            LocationStatus::Paused => "paused",
            LocationStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for LocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LocationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(LocationStatus::Draft),
            "active" => Ok(LocationStatus::Active),
            "paused" => Ok(LocationStatus::Paused),
            "archived" => Ok(LocationStatus::Archived),
            other => Err(format!("unknown location status: {other}")),
        }
    }
}

/// Rollout priority of a location page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Priority from monthly search volume, bumped down one step when
    /// competition is high.
    pub fn from_demand(search_volume: u32, competition: CompetitionLevel) -> Self {
        let base = match search_volume {
            v if v >= 1000 => Priority::High,
            v if v >= 300 => Priority::Medium,
            _ => Priority::Low,
        };
        match (base, competition) {
            (Priority::High, CompetitionLevel::High) => Priority::Medium,
            (Priority::Medium, CompetitionLevel::High) => Priority::Low,
            (p, _) => p,
        }
    }

    /// Sitemap `<priority>` value.
    pub fn sitemap_weight(self) -> f32 {
        match self {
            Priority::High => 0.9,
            Priority::Medium => 0.7,
            Priority::Low => 0.5,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        };
        f.pad(name)
    }
}

/// One generated location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub slug: String,
    pub display_name: String,
    pub status: LocationStatus,
    pub priority: Priority,
    pub search_volume: u32,
    pub competition_level: CompetitionLevel,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl RegistryEntry {
    /// A new draft entry for a page.
    pub fn from_location(data: &LocationSeoData, now: DateTime<Utc>) -> Self {
        Self {
            slug: data.slug.clone(),
            display_name: data.display_name.clone(),
            status: LocationStatus::Draft,
            priority: Priority::from_demand(data.search_volume, data.competition_level),
            search_volume: data.search_volume,
            competition_level: data.competition_level,
            created_at: now,
            last_updated: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    version: u32,
    locations: Vec<RegistryEntry>,
}

/// Reads and mutates the location registry.
#[derive(Debug, Clone)]
pub struct RegistryManager {
    json_path: PathBuf,
    ts_path: PathBuf,
    backups: bool,
}

impl RegistryManager {
    /// Manager for the registry under `root/data/locations`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let dir = root.as_ref().join(LOCATIONS_DIR);
        Self {
            json_path: dir.join(REGISTRY_JSON),
            ts_path: dir.join(REGISTRY_TS),
            backups: true,
        }
    }

    /// Enable or disable `.bak` copies before each write.
    pub fn with_backups(mut self, backups: bool) -> Self {
        self.backups = backups;
        self
    }

    pub fn json_path(&self) -> &Path {
        &self.json_path
    }

    pub fn ts_path(&self) -> &Path {
        &self.ts_path
    }

    /// Load all entries. A missing registry file is an empty registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or was
    /// written by a newer format version.
    pub fn load(&self) -> RegistryResult<Vec<RegistryEntry>> {
        let content = match fs::read_to_string(&self.json_path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(OutputError::io(&self.json_path, e).into()),
        };
        let file: RegistryFile =
            serde_json::from_str(&content).map_err(|source| RegistryError::Parse {
                path: self.json_path.clone(),
                source,
            })?;
        if file.version > REGISTRY_VERSION {
            return Err(RegistryError::VersionMismatch {
                expected: REGISTRY_VERSION,
                found: file.version,
            });
        }
        Ok(file.locations)
    }

    /// All entries, in insertion order.
    pub fn list(&self) -> RegistryResult<Vec<RegistryEntry>> {
        self.load()
    }

    pub fn get(&self, slug: &str) -> RegistryResult<Option<RegistryEntry>> {
        Ok(self.load()?.into_iter().find(|entry| entry.slug == slug))
    }

    /// Record a generated page, updating the existing entry for its slug.
    pub fn add_location_to_registry(
        &self,
        data: &LocationSeoData,
    ) -> RegistryResult<RegistryEntry> {
        let now = Utc::now();
        self.upsert_at(RegistryEntry::from_location(data, now), now)
    }

    /// Insert `entry`, or update the entry with the same slug in place.
    ///
    /// An update keeps the stored `created_at` and `status` and sets
    /// `last_updated` to `now`.
    pub fn upsert_at(
        &self,
        entry: RegistryEntry,
        now: DateTime<Utc>,
    ) -> RegistryResult<RegistryEntry> {
        let mut entries = self.load()?;
        let stored = match entries.iter_mut().find(|e| e.slug == entry.slug) {
            Some(existing) => {
                existing.display_name = entry.display_name;
                existing.priority = entry.priority;
                existing.search_volume = entry.search_volume;
                existing.competition_level = entry.competition_level;
                existing.last_updated = now;
                info!(slug = %existing.slug, "Updated registry entry");
                existing.clone()
            }
            None => {
                let mut entry = entry;
                entry.last_updated = now;
                info!(slug = %entry.slug, "Added registry entry");
                entries.push(entry.clone());
                entry
            }
        };
        self.save(&entries)?;
        Ok(stored)
    }

    /// Remove an entry. Returns whether it existed.
    pub fn remove(&self, slug: &str) -> RegistryResult<bool> {
        let mut entries = self.load()?;
        let before = entries.len();
        entries.retain(|entry| entry.slug != slug);
        if entries.len() == before {
            return Ok(false);
        }
        self.save(&entries)?;
        info!(slug, "Removed registry entry");
        Ok(true)
    }

    /// Change the status of an entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if no entry has `slug`.
    pub fn update_status(
        &self,
        slug: &str,
        status: LocationStatus,
    ) -> RegistryResult<RegistryEntry> {
        let mut entries = self.load()?;
        let entry = entries
            .iter_mut()
            .find(|entry| entry.slug == slug)
            .ok_or_else(|| RegistryError::NotFound(slug.to_string()))?;
        entry.status = status;
        entry.last_updated = Utc::now();
        let updated = entry.clone();
        self.save(&entries)?;
        info!(slug, %status, "Updated registry status");
        Ok(updated)
    }

    /// Write both registry files.
    pub fn save(&self, entries: &[RegistryEntry]) -> RegistryResult<()> {
        let file = RegistryFile {
            version: REGISTRY_VERSION,
            locations: entries.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(OutputError::from)?;
        write_atomic(&self.json_path, &json, self.backups)?;
        write_atomic(&self.ts_path, &render_typescript(entries)?, self.backups)?;
        debug!(entries = entries.len(), path = %self.json_path.display(), "Saved registry");
        Ok(())
    }
}

/// Render the registry as a TypeScript module.
pub fn render_typescript(entries: &[RegistryEntry]) -> RegistryResult<String> {
    let array = serde_json::to_string_pretty(entries).map_err(OutputError::from)?;
    Ok(format!(
        r#"// Generated from registry.json. Edit that file, not this one.

export type LocationStatus = 'draft' | 'active' | 'paused' | 'archived';
export type LocationPriority = 'high' | 'medium' | 'low';

export interface LocationRegistryEntry {{
  slug: string;
  displayName: string;
  status: LocationStatus;
  priority: LocationPriority;
  searchVolume: number;
  competitionLevel: 'low' | 'medium' | 'high';
  createdAt: string;
  lastUpdated: string;
}}

export const locationRegistry: LocationRegistryEntry[] = {array};

export const activeLocations = locationRegistry.filter((location) => location.status === 'active');

export function getLocationBySlug(slug: string): LocationRegistryEntry | undefined {{
  return locationRegistry.find((location) => location.slug === slug);
}}

export const locationSlugs = locationRegistry.map((location) => location.slug);
"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::GeneratedContent;
    use crate::location::ClinicProfile;
    use crate::research::ResearchResult;
    use chrono::Duration;
    use tempfile::TempDir;

    fn entry(slug: &str, now: DateTime<Utc>) -> RegistryEntry {
        RegistryEntry {
            slug: slug.to_string(),
            display_name: "Indira Nagar".to_string(),
            status: LocationStatus::Draft,
            priority: Priority::Medium,
            search_volume: 500,
            competition_level: CompetitionLevel::Medium,
            created_at: now,
            last_updated: now,
        }
    }

    #[test]
    fn test_missing_registry_is_empty() {
        let dir = TempDir::new().unwrap();
        let manager = RegistryManager::new(dir.path());
        assert!(manager.load().unwrap().is_empty());
        assert_eq!(manager.get("indira-nagar").unwrap(), None);
    }

    #[test]
    fn test_upsert_twice_updates_in_place() {
        let dir = TempDir::new().unwrap();
        let manager = RegistryManager::new(dir.path());
        let first = Utc::now();
        let second = first + Duration::seconds(30);

        manager.upsert_at(entry("indira-nagar", first), first).unwrap();
        let stored = manager
            .upsert_at(entry("indira-nagar", second), second)
            .unwrap();

        let entries = manager.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(stored.created_at, first);
        assert_eq!(stored.last_updated, second);
        assert_ne!(entries[0].last_updated, first);
    }

    #[test]
    fn test_re_adding_location_refreshes_timestamp() {
        let dir = TempDir::new().unwrap();
        let manager = RegistryManager::new(dir.path());
        let content = GeneratedContent {
            location: "Indira Nagar".to_string(),
            city: "Bangalore".to_string(),
            slug: "indira-nagar".to_string(),
            ..Default::default()
        };
        let data = LocationSeoData::assemble(
            &ResearchResult::fallback("Indira Nagar", "Bangalore"),
            &content,
            &ClinicProfile::default(),
        );

        let first = manager.add_location_to_registry(&data).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = manager.add_location_to_registry(&data).unwrap();

        let entries = manager.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(second.created_at, first.created_at);
        assert!(second.last_updated > first.last_updated);
        assert_eq!(entries[0].last_updated, second.last_updated);
    }

    #[test]
    fn test_update_preserves_status() {
        let dir = TempDir::new().unwrap();
        let manager = RegistryManager::new(dir.path());
        let now = Utc::now();
        manager.upsert_at(entry("domlur", now), now).unwrap();
        manager.update_status("domlur", LocationStatus::Active).unwrap();

        let stored = manager
            .upsert_at(entry("domlur", now), now + Duration::seconds(1))
            .unwrap();
        assert_eq!(stored.status, LocationStatus::Active);
    }

    #[test]
    fn test_remove_and_missing_status_update() {
        let dir = TempDir::new().unwrap();
        let manager = RegistryManager::new(dir.path());
        let now = Utc::now();
        manager.upsert_at(entry("domlur", now), now).unwrap();
        manager.upsert_at(entry("koramangala", now), now).unwrap();

        assert!(manager.remove("domlur").unwrap());
        assert!(!manager.remove("domlur").unwrap());
        assert_eq!(manager.list().unwrap().len(), 1);

        let err = manager
            .update_status("domlur", LocationStatus::Active)
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(slug) if slug == "domlur"));
    }

    #[test]
    fn test_save_writes_typescript_mirror() {
        let dir = TempDir::new().unwrap();
        let manager = RegistryManager::new(dir.path());
        let now = Utc::now();
        manager.upsert_at(entry("indira-nagar", now), now).unwrap();

        let ts = fs::read_to_string(manager.ts_path()).unwrap();
        assert!(ts.contains("export const locationRegistry: LocationRegistryEntry[] = ["));
        assert!(ts.contains(r#""slug": "indira-nagar""#));
        assert!(ts.contains(r#""displayName": "Indira Nagar""#));
        assert!(ts.contains("getLocationBySlug"));
    }

    #[test]
    fn test_newer_version_is_rejected() {
        let dir = TempDir::new().unwrap();
        let manager = RegistryManager::new(dir.path());
        fs::create_dir_all(manager.json_path().parent().unwrap()).unwrap();
        fs::write(manager.json_path(), r#"{"version": 99, "locations": []}"#).unwrap();

        let err = manager.load().unwrap_err();
        assert!(matches!(
            err,
            RegistryError::VersionMismatch {
                expected: 1,
                found: 99
            }
        ));
    }

    #[test]
    fn test_corrupt_registry_reports_path() {
        let dir = TempDir::new().unwrap();
        let manager = RegistryManager::new(dir.path());
        fs::create_dir_all(manager.json_path().parent().unwrap()).unwrap();
        fs::write(manager.json_path(), "[not json").unwrap();

        let err = manager.load().unwrap_err();
        assert!(err.to_string().contains("registry.json"));
    }

    #[test]
    fn test_priority_from_demand() {
        assert_eq!(Priority::from_demand(1200, CompetitionLevel::Low), Priority::High);
        assert_eq!(Priority::from_demand(1200, CompetitionLevel::High), Priority::Medium);
        assert_eq!(Priority::from_demand(400, CompetitionLevel::Medium), Priority::Medium);
        assert_eq!(Priority::from_demand(0, CompetitionLevel::High), Priority::Low);
    }

    #[test]
    fn test_status_parses_case_insensitively() {
        assert_eq!("Active".parse::<LocationStatus>(), Ok(LocationStatus::Active));
        assert!("live".parse::<LocationStatus>().is_err());
    }
}
