//! # outfile-xlsx
//!
//! Export SQL query results to XLSX by letting the database engine do the
//! heavy lifting.
//!
//! ## How it works
//!
//! - **Bulk export**: the query is wrapped in `SELECT ... INTO OUTFILE`, so
//!   the MySQL-compatible engine writes a tab-delimited file straight to disk
//!   instead of streaming rows through the client
//! - **Header row**: prepended in the same statement with `UNION ALL`
//! - **Conversion**: a native `csv2xlsx` executable, or an in-process
//!   streaming writer on Windows and wherever the executable is missing
//! - **Cleanup**: the delimited file is removed best-effort; the spreadsheet
//!   belongs to the caller
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use outfile_xlsx::{BoxError, ExcelExporter, ExportConfig, ExportRequest, QueryExecutor};
//!
//! struct Connection;
//!
//! impl QueryExecutor for Connection {
//!     fn execute_statement(&mut self, sql: &str) -> Result<(), BoxError> {
//!         unimplemented!("send {} to the server", sql)
//!     }
//!
//!     fn query_scalar(&mut self, sql: &str) -> Result<Option<String>, BoxError> {
//!         unimplemented!("fetch {}", sql)
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExportConfig::builder()
//!     .with_native_converter("/usr/local/bin/csv2xlsx")
//!     .build();
//! let mut exporter = ExcelExporter::new(Connection, &config);
//!
//! let path = exporter.export(&ExportRequest::new(
//!     "SELECT id, name FROM users",
//!     ["ID", "Name"],
//! ))?;
//!
//! // Hand the file to the user, then delete it
//! std::fs::remove_file(path)?;
//! # Ok(())
//! # }
//! ```
//!
//! With the `mysql` feature enabled, `mysql::Conn` and `mysql::PooledConn`
//! implement [`QueryExecutor`] directly.

pub mod config;
pub mod converter;
pub mod delimited;
pub mod error;
pub mod executor;
pub mod exporter;
pub mod fast_writer;
pub mod statement;
pub mod temp_path;
pub mod types;

pub use config::{ExportConfig, ExportConfigBuilder};
pub use converter::{Converter, ConverterKind, NativeProcessConverter, StreamingConverter};
pub use error::{BoxError, ConversionError, ExportError, Result};
pub use executor::QueryExecutor;
pub use exporter::{CleanupOutcome, ExcelExporter, ExportReport};
pub use types::{CellValue, ExportRequest, TemporaryArtifact};
