//! Export configuration

use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings shared by the path resolver and the converters
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExportConfig {
    /// Directory for intermediate files when the engine does not restrict
    /// file writes (falls back to the OS temp directory)
    pub temp_dir: Option<PathBuf>,
    /// Prefix of generated intermediate file names
    pub file_prefix: String,
    /// Path to the native `csv2xlsx` executable
    pub native_converter: Option<PathBuf>,
    /// Deflate level used by the streaming writer (1-9)
    pub compression_level: i64,
    /// Rows between flushes of the streaming writer
    pub flush_interval: u32,
    /// Worksheet name used by the streaming writer
    pub sheet_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            temp_dir: None,
            file_prefix: "tmp_".to_string(),
            native_converter: None,
            compression_level: 6,
            flush_interval: 1000,
            sheet_name: "Sheet1".to_string(),
        }
    }
}

impl ExportConfig {
    /// Create a builder with default settings
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder::default()
    }

    /// Native executable, if configured and present on disk
    pub fn available_native_converter(&self) -> Option<&Path> {
        self.native_converter
            .as_deref()
            .filter(|path| path.is_file())
    }
}

/// Builder for [`ExportConfig`]
///
/// # Examples
///
/// ```
/// use outfile_xlsx::config::ExportConfig;
///
/// let config = ExportConfig::builder()
///     .with_file_prefix("report_")
///     .with_compression_level(3)
///     .build();
///
/// assert_eq!(config.file_prefix, "report_");
/// assert_eq!(config.compression_level, 3);
/// ```
#[derive(Debug, Default)]
pub struct ExportConfigBuilder {
    temp_dir: Option<PathBuf>,
    file_prefix: Option<String>,
    native_converter: Option<PathBuf>,
    compression_level: Option<i64>,
    flush_interval: Option<u32>,
    sheet_name: Option<String>,
}

impl ExportConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory used when the engine allows writes anywhere
    pub fn with_temp_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.temp_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Set the prefix of generated file names
    pub fn with_file_prefix(mut self, prefix: &str) -> Self {
        self.file_prefix = Some(prefix.to_string());
        self
    }

    /// Set the native converter executable
    pub fn with_native_converter<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.native_converter = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the deflate level, clamped to 1-9
    pub fn with_compression_level(mut self, level: i64) -> Self {
        self.compression_level = Some(level.clamp(1, 9));
        self
    }

    /// Set flush interval (rows between flushes)
    pub fn with_flush_interval(mut self, interval: u32) -> Self {
        self.flush_interval = Some(interval.max(1));
        self
    }

    /// Set the worksheet name
    pub fn with_sheet_name(mut self, name: &str) -> Self {
        self.sheet_name = Some(name.to_string());
        self
    }

    pub fn build(self) -> ExportConfig {
        let defaults = ExportConfig::default();
        ExportConfig {
            temp_dir: self.temp_dir,
            file_prefix: self.file_prefix.unwrap_or(defaults.file_prefix),
            native_converter: self.native_converter,
            compression_level: self
                .compression_level
                .unwrap_or(defaults.compression_level),
            flush_interval: self.flush_interval.unwrap_or(defaults.flush_interval),
            sheet_name: self.sheet_name.unwrap_or(defaults.sheet_name),
        }
    }
}
