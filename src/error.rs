//! Error types for outfile-xlsx

use std::process::ExitStatus;
use thiserror::Error;

/// Boxed error as returned by a [`QueryExecutor`](crate::executor::QueryExecutor)
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Main error type for an export
#[derive(Error, Debug)]
pub enum ExportError {
    /// No directory writable by both the engine and this process
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Request rejected before anything was executed
    #[error("Invalid export request: {0}")]
    InvalidRequest(String),

    /// Error raised by the query executor, passed through untouched
    #[error("Statement execution failed: {0}")]
    StatementExecution(#[source] BoxError),

    /// Delimited file could not be turned into a spreadsheet
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

impl ExportError {
    /// Wrap an executor error
    pub fn statement<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        ExportError::StatementExecution(err.into())
    }
}

/// Errors raised by either converter strategy
#[derive(Error, Debug)]
pub enum ConversionError {
    /// The native converter could not be started
    #[error("Failed to launch converter '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The native converter exited with a failure status
    #[error("Converter '{program}' exited with {status}: {stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Delimited input does not follow the tab/quote/newline convention
    #[error("Malformed delimited input at record {record}: {message}")]
    MalformedInput { record: u64, message: String },

    /// IO error wrapper
    #[error("IO error during conversion: {0}")]
    Io(#[from] std::io::Error),

    /// Error occurred while writing the spreadsheet container
    #[error("Failed to write spreadsheet: {0}")]
    Write(String),
}

impl From<zip::result::ZipError> for ConversionError {
    fn from(err: zip::result::ZipError) -> Self {
        ConversionError::Write(err.to_string())
    }
}

impl From<csv::Error> for ConversionError {
    fn from(err: csv::Error) -> Self {
        let record = err
            .position()
            .map(|pos| pos.record())
            .unwrap_or_default();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => ConversionError::Io(io),
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => ConversionError::MalformedInput {
                record,
                message: format!("expected {} fields, found {}", expected_len, len),
            },
            csv::ErrorKind::Utf8 { err, .. } => ConversionError::MalformedInput {
                record,
                message: format!("invalid UTF-8: {}", err),
            },
            other => ConversionError::MalformedInput {
                record,
                message: format!("{:?}", other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_statement_error_keeps_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ExportError::statement(inner);

        assert!(matches!(err, ExportError::StatementExecution(_)));
        assert_eq!(err.source().unwrap().to_string(), "denied");
    }

    #[test]
    fn test_conversion_error_is_transparent() {
        let err: ExportError = ConversionError::MalformedInput {
            record: 3,
            message: "unterminated quote".to_string(),
        }
        .into();

        assert_eq!(
            err.to_string(),
            "Malformed delimited input at record 3: unterminated quote"
        );
    }
}
