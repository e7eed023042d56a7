//! Delimited file to spreadsheet conversion
//!
//! Two interchangeable strategies implement [`Converter`]:
//!
//! - [`NativeProcessConverter`]: runs a prebuilt, statically linked
//!   `csv2xlsx` executable (`csv2xlsx <in> <out>`); no per-row work in this
//!   process.
//! - [`StreamingConverter`]: parses the file and streams it through
//!   [`StyledWorkbook`](crate::fast_writer::StyledWorkbook) in-process.
//!
//! Which one runs is decided once, when the exporter is built, from the
//! platform and whether the native executable is present. Both produce one
//! worksheet with the same cell values and a bold header row.

pub mod native;
pub mod streaming;

use crate::config::ExportConfig;
use crate::error::ConversionError;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub use native::NativeProcessConverter;
pub use streaming::StreamingConverter;

/// Converts a delimited file into an XLSX file
pub trait Converter: Send + Sync {
    /// Read `delimited` and write the spreadsheet to `spreadsheet`
    ///
    /// On error the output may be absent or partially written.
    fn convert(&self, delimited: &Path, spreadsheet: &Path) -> Result<(), ConversionError>;

    /// Strategy implemented by this converter
    fn kind(&self) -> ConverterKind;
}

/// The two conversion strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConverterKind {
    NativeProcess,
    StreamingWriter,
}

impl ConverterKind {
    /// Strategy for an OS name (as in `std::env::consts::OS`)
    ///
    /// Windows always converts in-process; elsewhere the native executable is
    /// preferred when it is available.
    pub fn for_platform(os: &str, native_available: bool) -> Self {
        if os == "windows" || !native_available {
            ConverterKind::StreamingWriter
        } else {
            ConverterKind::NativeProcess
        }
    }

    /// Strategy for the running platform
    pub fn current(config: &ExportConfig) -> Self {
        Self::for_platform(
            std::env::consts::OS,
            config.available_native_converter().is_some(),
        )
    }
}

/// Build the platform's default converter
pub fn platform_default(config: &ExportConfig) -> Box<dyn Converter> {
    let kind = ConverterKind::current(config);
    debug!(?kind, os = std::env::consts::OS, "selected converter");

    match (kind, config.available_native_converter()) {
        (ConverterKind::NativeProcess, Some(program)) => {
            Box::new(NativeProcessConverter::new(program))
        }
        _ => Box::new(StreamingConverter::from_config(config)),
    }
}

impl<C: Converter + ?Sized> Converter for Box<C> {
    fn convert(&self, delimited: &Path, spreadsheet: &Path) -> Result<(), ConversionError> {
        (**self).convert(delimited, spreadsheet)
    }

    fn kind(&self) -> ConverterKind {
        (**self).kind()
    }
}

impl<C: Converter + ?Sized> Converter for Arc<C> {
    fn convert(&self, delimited: &Path, spreadsheet: &Path) -> Result<(), ConversionError> {
        (**self).convert(delimited, spreadsheet)
    }

    fn kind(&self) -> ConverterKind {
        (**self).kind()
    }
}

impl<C: Converter + ?Sized> Converter for &C {
    fn convert(&self, delimited: &Path, spreadsheet: &Path) -> Result<(), ConversionError> {
        (**self).convert(delimited, spreadsheet)
    }

    fn kind(&self) -> ConverterKind {
        (**self).kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_selection() {
        assert_eq!(
            ConverterKind::for_platform("windows", true),
            ConverterKind::StreamingWriter
        );
        assert_eq!(
            ConverterKind::for_platform("linux", true),
            ConverterKind::NativeProcess
        );
        assert_eq!(
            ConverterKind::for_platform("macos", true),
            ConverterKind::NativeProcess
        );
        assert_eq!(
            ConverterKind::for_platform("linux", false),
            ConverterKind::StreamingWriter
        );
    }

    #[test]
    fn test_default_without_native_binary_streams() {
        let converter = platform_default(&ExportConfig::default());
        assert_eq!(converter.kind(), ConverterKind::StreamingWriter);
    }

    #[cfg(unix)]
    #[test]
    fn test_default_with_native_binary() {
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("csv2xlsx");
        std::fs::write(&program, b"").unwrap();

        let config = ExportConfig::builder().with_native_converter(&program).build();
        let converter = platform_default(&config);
        assert_eq!(converter.kind(), ConverterKind::NativeProcess);
    }
}
