//! Location of the intermediate delimited file
//!
//! The engine must be allowed to write the file (a server-side permission,
//! MySQL's `secure_file_priv`) and this process must be able to read it back
//! for conversion. File names carry 64 random bits; with *n* exports in
//! flight in one directory the chance of any collision is about n²/2⁶⁵,
//! roughly 3·10⁻¹¹ for ten thousand concurrent exports, so there is no
//! retry-on-collision.

use crate::config::ExportConfig;
use crate::error::{ExportError, Result};
use crate::executor::QueryExecutor;
use crate::types::ArtifactFormat;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Query returning the engine's writable-output directory
pub const SECURE_FILE_PRIV_QUERY: &str = "SELECT @@GLOBAL.secure_file_priv";

/// Resolves fresh, collision-resistant paths for delimited files
#[derive(Debug, Clone)]
pub struct TempPathResolver {
    temp_dir: Option<PathBuf>,
    prefix: String,
}

impl Default for TempPathResolver {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

impl TempPathResolver {
    pub fn from_config(config: &ExportConfig) -> Self {
        TempPathResolver {
            temp_dir: config.temp_dir.clone(),
            prefix: config.file_prefix.clone(),
        }
    }

    /// Return a path to a not-yet-existing delimited file
    pub fn resolve<E: QueryExecutor + ?Sized>(&self, executor: &mut E) -> Result<PathBuf> {
        let dir = self.writable_dir(executor)?;
        Ok(dir.join(self.file_name()))
    }

    /// Directory both the engine and this process can use
    ///
    /// An empty or `NULL` setting means the engine may write wherever the OS
    /// allows, so the configured temp dir (or the OS temp dir) is used.
    pub fn writable_dir<E: QueryExecutor + ?Sized>(&self, executor: &mut E) -> Result<PathBuf> {
        let setting = executor
            .query_scalar(SECURE_FILE_PRIV_QUERY)
            .map_err(ExportError::StatementExecution)?;

        let engine_dir = setting
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let dir = match (engine_dir, &self.temp_dir) {
            (None, Some(override_dir)) => override_dir.clone(),
            (None, None) => std::env::temp_dir(),
            (Some(engine_dir), Some(override_dir)) if override_dir.starts_with(&engine_dir) => {
                override_dir.clone()
            }
            (Some(engine_dir), _) => engine_dir,
        };

        if !dir.is_dir() {
            return Err(ExportError::Configuration(format!(
                "directory '{}' (secure_file_priv = {:?}) is not accessible from this process",
                dir.display(),
                setting
            )));
        }

        debug!(dir = %dir.display(), secure_file_priv = ?setting, "resolved writable directory");
        Ok(dir)
    }

    /// Generate a fresh file name, e.g. `tmp_3f2a9c01d4e5b6a7.csv`
    pub fn file_name(&self) -> String {
        format!(
            "{}{:016x}.{}",
            self.prefix,
            rand::random::<u64>(),
            ArtifactFormat::Delimited.extension()
        )
    }
}

/// Spreadsheet path derived from a delimited path (extension replaced)
pub fn spreadsheet_path_for(delimited: &Path) -> PathBuf {
    delimited.with_extension(ArtifactFormat::Spreadsheet.extension())
}
