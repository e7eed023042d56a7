//! Streaming XLSX writer used by the in-process converter
//!
//! - One worksheet, rows streamed straight into the ZIP deflate stream
//! - Inline strings (no shared strings table to keep in memory)
//! - Two cell formats: the body style (workbook default) and the bold header

pub mod workbook;
pub mod xml_writer;

use crate::error::ConversionError;

pub use workbook::{RowStyle, StyledWorkbook, WorkbookOptions, MAX_COLS, MAX_ROWS};

/// Result type of the writer internals
pub type WriteResult<T> = std::result::Result<T, ConversionError>;
