//! File emission for generated location pages.
//!
//! [`FileGenerator`] renders the page data file, the Next.js page and the
//! locations sitemap. [`RegistryManager`] keeps the list of generated
//! locations in `registry.json` and mirrors it to `registry.ts`.
//!
//! Every write goes through [`write_atomic`]: the new contents land in a
//! temporary file that is renamed over the target, and the previous file
//! can be kept as `<name>.bak`.

pub mod files;
pub mod registry;

pub use files::{FileGenerator, GeneratedFile, GenerationReport, SitemapEntry};
pub use registry::{
    LocationStatus, Priority, RegistryEntry, RegistryError, RegistryManager, RegistryResult,
};

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Directory, relative to the site root, holding page data files.
pub const LOCATIONS_DIR: &str = "data/locations";

/// Errors that can occur while writing generated files.
#[derive(Error, Debug)]
pub enum OutputError {
    /// IO error on a specific path.
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Sitemap XML could not be written.
    #[error("XML error: {0}")]
    Xml(String),
}

impl OutputError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for output operations.
pub type OutputResult<T> = Result<T, OutputError>;

/// Path of the backup copy for `path`: the file name with `.bak` appended.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

/// Write `contents` to `path` atomically.
///
/// Parent directories are created as needed. When `backup` is set and
/// `path` already exists, it is copied to [`backup_path`] first. Returns
/// the backup path when a backup was made.
///
/// # Errors
///
/// Returns an error if any file operation fails. The target is left
/// untouched when the temporary file cannot be written.
pub fn write_atomic(path: &Path, contents: &str, backup: bool) -> OutputResult<Option<PathBuf>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| OutputError::io(parent, e))?;
        }
    }

    let backup_file = if backup && path.exists() {
        let target = backup_path(path);
        fs::copy(path, &target).map_err(|e| OutputError::io(&target, e))?;
        Some(target)
    } else {
        None
    };

    // Temp file in the same directory so the rename stays on one filesystem
    let mut temp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = fs::File::create(&temp_path).map_err(|e| OutputError::io(&temp_path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| OutputError::io(&temp_path, e))?;
    file.sync_all().map_err(|e| OutputError::io(&temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| OutputError::io(path, e))?;

    Ok(backup_file)
}
