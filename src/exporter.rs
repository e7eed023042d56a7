//! Export orchestration
//!
//! resolve path → `SELECT ... INTO OUTFILE` → convert → remove the delimited
//! file → hand the spreadsheet path to the caller.

use crate::config::ExportConfig;
use crate::converter::{self, Converter, ConverterKind};
use crate::error::{ExportError, Result};
use crate::executor::QueryExecutor;
use crate::statement::OutfileStatement;
use crate::temp_path::{spreadsheet_path_for, TempPathResolver};
use crate::types::{ExportRequest, TemporaryArtifact};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of removing the intermediate delimited file
#[derive(Debug)]
pub enum CleanupOutcome {
    /// The file is gone (or was never created)
    Deleted,
    /// The file could not be removed and may still exist
    DeleteFailed(io::Error),
}

impl CleanupOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, CleanupOutcome::Deleted)
    }
}

/// Remove an intermediate file without ever failing
///
/// The engine usually owns the file it wrote, so removal can be refused;
/// that is reported, not raised.
pub fn remove_intermediate(path: &Path) -> CleanupOutcome {
    match fs::remove_file(path) {
        Ok(()) => CleanupOutcome::Deleted,
        Err(err) if err.kind() == io::ErrorKind::NotFound => CleanupOutcome::Deleted,
        Err(err) => CleanupOutcome::DeleteFailed(err),
    }
}

/// Details of a finished export
#[derive(Debug)]
pub struct ExportReport {
    /// The spreadsheet, now owned by the caller
    pub spreadsheet: TemporaryArtifact,
    /// The intermediate file the engine wrote
    pub delimited: TemporaryArtifact,
    pub cleanup: CleanupOutcome,
    pub elapsed: Duration,
}

/// Exports query results to XLSX through the database engine's bulk export
///
/// # Examples
///
/// ```no_run
/// use outfile_xlsx::{BoxError, ExcelExporter, ExportConfig, ExportRequest, QueryExecutor};
///
/// struct Connection;
///
/// impl QueryExecutor for Connection {
///     fn execute_statement(&mut self, sql: &str) -> Result<(), BoxError> {
///         unimplemented!("send {} to the server", sql)
///     }
///
///     fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, BoxError> {
///         unimplemented!("fetch {}", sql)
///     }
/// }
///
/// let mut exporter = ExcelExporter::new(Connection, &ExportConfig::default());
/// let request = ExportRequest::new("SELECT id, name FROM users", ["ID", "Name"]);
/// let path = exporter.export(&request)?;
/// println!("spreadsheet at {}", path.display());
/// # Ok::<(), outfile_xlsx::ExportError>(())
/// ```
pub struct ExcelExporter<E> {
    executor: E,
    converter: Box<dyn Converter>,
    resolver: TempPathResolver,
}

impl<E: QueryExecutor> ExcelExporter<E> {
    /// Create an exporter with the platform's default converter
    pub fn new(executor: E, config: &ExportConfig) -> Self {
        ExcelExporter {
            executor,
            converter: converter::platform_default(config),
            resolver: TempPathResolver::from_config(config),
        }
    }

    /// Create an exporter with an explicit converter
    pub fn with_converter<C>(executor: E, converter: C, config: &ExportConfig) -> Self
    where
        C: Converter + 'static,
    {
        ExcelExporter {
            executor,
            converter: Box::new(converter),
            resolver: TempPathResolver::from_config(config),
        }
    }

    pub fn converter_kind(&self) -> ConverterKind {
        self.converter.kind()
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Export `query` with `headers` as the first row
    pub fn export_query<I, S>(&mut self, query: &str, headers: I) -> Result<PathBuf>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.export(&ExportRequest::new(query, headers))
    }

    /// Run the export and return the path of the finished spreadsheet
    pub fn export(&mut self, request: &ExportRequest) -> Result<PathBuf> {
        self.export_with_report(request)
            .map(|report| report.spreadsheet.into_path())
    }

    /// Run the export and report what happened to the intermediate file
    pub fn export_with_report(&mut self, request: &ExportRequest) -> Result<ExportReport> {
        let started = Instant::now();
        validate(request)?;

        let delimited = self.resolver.resolve(&mut self.executor)?;
        ensure_unclaimed(&delimited)?;
        info!(
            columns = request.headers.len(),
            converter = ?self.converter.kind(),
            delimited = %delimited.display(),
            "starting export"
        );

        let result = self.export_to(request, &delimited);

        let cleanup = remove_intermediate(&delimited);
        match &cleanup {
            CleanupOutcome::Deleted => debug!(path = %delimited.display(), "removed delimited file"),
            CleanupOutcome::DeleteFailed(err) => warn!(
                path = %delimited.display(),
                error = %err,
                "could not remove delimited file, leaving it behind"
            ),
        }

        let spreadsheet = result?;
        let elapsed = started.elapsed();
        info!(path = %spreadsheet.display(), ?elapsed, "export finished");

        Ok(ExportReport {
            spreadsheet: TemporaryArtifact::spreadsheet(spreadsheet),
            delimited: TemporaryArtifact::delimited(delimited),
            cleanup,
            elapsed,
        })
    }

    fn export_to(&mut self, request: &ExportRequest, delimited: &Path) -> Result<PathBuf> {
        let sql = OutfileStatement::new(&request.query, &request.headers, delimited).build();
        debug!(statement_len = sql.len(), "executing bulk export statement");

        self.executor
            .execute_statement(&sql)
            .map_err(ExportError::StatementExecution)?;

        let spreadsheet = spreadsheet_path_for(delimited);
        self.converter.convert(delimited, &spreadsheet)?;
        Ok(spreadsheet)
    }
}

/// Refuse a path that already exists
///
/// The engine will not overwrite it, and the file belongs to someone else,
/// so neither the statement nor the cleanup may touch it.
fn ensure_unclaimed(delimited: &Path) -> Result<()> {
    if fs::symlink_metadata(delimited).is_ok() {
        return Err(ExportError::Configuration(format!(
            "'{}' already exists",
            delimited.display()
        )));
    }
    Ok(())
}

fn validate(request: &ExportRequest) -> Result<()> {
    if request.query.trim().is_empty() {
        return Err(ExportError::InvalidRequest("query is empty".to_string()));
    }
    if request.headers.is_empty() {
        return Err(ExportError::InvalidRequest(
            "at least one header is required".to_string(),
        ));
    }
    Ok(())
}
