//! Type definitions shared by the export pipeline

use std::fmt;
use std::path::{Path, PathBuf};

/// A query to export plus the display names of its columns
///
/// Header *i* labels result column *i* of `query`. Headers end up inside SQL
/// string literals; they are escaped, but should still come from the
/// application and not straight from end users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// A SELECT statement
    pub query: String,
    /// Column display names, in result-column order
    pub headers: Vec<String>,
}

impl ExportRequest {
    /// Create a new request
    pub fn new<Q, I, S>(query: Q, headers: I) -> Self
    where
        Q: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExportRequest {
            query: query.into(),
            headers: headers.into_iter().map(Into::into).collect(),
        }
    }
}

/// On-disk format of a [`TemporaryArtifact`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactFormat {
    /// Tab-delimited text written by the database engine
    Delimited,
    /// XLSX produced by a converter
    Spreadsheet,
}

impl ArtifactFormat {
    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Delimited => "csv",
            ArtifactFormat::Spreadsheet => "xlsx",
        }
    }
}

/// A file produced during an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryArtifact {
    pub path: PathBuf,
    pub format: ArtifactFormat,
}

impl TemporaryArtifact {
    pub fn delimited(path: impl Into<PathBuf>) -> Self {
        TemporaryArtifact {
            path: path.into(),
            format: ArtifactFormat::Delimited,
        }
    }

    pub fn spreadsheet(path: impl Into<PathBuf>) -> Self {
        TemporaryArtifact {
            path: path.into(),
            format: ArtifactFormat::Spreadsheet,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume the artifact and hand its path to the caller
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Font settings applied to a row of the output spreadsheet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionStyle {
    pub font_name: &'static str,
    pub font_size: f64,
    pub bold: bool,
}

/// Style of every data row
pub const BODY_STYLE: ConversionStyle = ConversionStyle {
    font_name: "Arial",
    font_size: 12.0,
    bold: false,
};

/// Style of the header row
pub const HEADER_STYLE: ConversionStyle = ConversionStyle {
    font_name: "Arial",
    font_size: 12.0,
    bold: true,
};

/// One line of the delimited file
///
/// Record 0 is always the header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelimitedRecord {
    /// Zero-based record number in the file
    pub index: u64,
    /// Cells in column order
    pub cells: Vec<String>,
}

impl DelimitedRecord {
    pub fn new(index: u64, cells: Vec<String>) -> Self {
        DelimitedRecord { index, cells }
    }

    pub fn is_header(&self) -> bool {
        self.index == 0
    }

    /// Get cell at column index
    pub fn get(&self, col: usize) -> Option<&str> {
        self.cells.get(col).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Value written into a spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell
    Empty,
    /// Numeric cell
    Number(f64),
    /// Inline string cell
    Text(String),
}

impl CellValue {
    /// Classify a delimited field
    ///
    /// Numeric text (optional leading `-`, digits, at most one `.`) becomes a
    /// number cell, the same rule the native converter applies. Text a double
    /// cannot carry exactly stays text: a leading zero before another digit
    /// (`007`, zip codes) or more than 15 significant digits.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            return CellValue::Empty;
        }
        if is_numeric(field) && fits_in_double(field) {
            if let Ok(n) = field.parse::<f64>() {
                if n.is_finite() {
                    return CellValue::Number(n);
                }
            }
        }
        CellValue::Text(field.to_string())
    }

    /// Convert cell value to string
    pub fn as_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::from_field(s)
    }
}

fn is_numeric(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let mut dots = 0;
    let mut digits = 0;
    for b in body.bytes() {
        match b {
            b'.' => dots += 1,
            b'0'..=b'9' => digits += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}

/// Significant digits an f64 round-trips exactly
const MAX_SIGNIFICANT_DIGITS: usize = 15;

fn fits_in_double(s: &str) -> bool {
    let body = s.strip_prefix('-').unwrap_or(s);
    let bytes = body.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' && bytes[1].is_ascii_digit() {
        return false;
    }

    let (int, frac) = body.split_once('.').unwrap_or((body, ""));
    let int = int.trim_start_matches('0');
    let frac = frac.trim_end_matches('0');
    let significant = if int.is_empty() {
        frac.trim_start_matches('0').len()
    } else {
        int.len() + frac.len()
    };
    significant <= MAX_SIGNIFICANT_DIGITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_detection() {
        assert_eq!(CellValue::from_field("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::from_field("-1.5"), CellValue::Number(-1.5));
        assert_eq!(CellValue::from_field(".5"), CellValue::Number(0.5));
        assert_eq!(CellValue::from_field(""), CellValue::Empty);

        for text in ["-", ".", "1.2.3", "1-2", "--1", "1e5", " 1", "Alice"] {
            assert_eq!(
                CellValue::from_field(text),
                CellValue::Text(text.to_string()),
                "{:?} should stay text",
                text
            );
        }
    }

    #[test]
    fn test_lossy_numbers_stay_text() {
        for text in ["00123", "-007", "00.5", "12345678901234567890", "0.1234567890123456"] {
            assert_eq!(
                CellValue::from_field(text),
                CellValue::Text(text.to_string()),
                "{:?} should stay text",
                text
            );
        }

        assert_eq!(CellValue::from_field("0"), CellValue::Number(0.0));
        assert_eq!(CellValue::from_field("0.25"), CellValue::Number(0.25));
        assert_eq!(CellValue::from_field("-0.5"), CellValue::Number(-0.5));
        assert_eq!(
            CellValue::from_field("123456789012345"),
            CellValue::Number(123456789012345.0)
        );
        assert_eq!(
            CellValue::from_field("1.50000000000000000000"),
            CellValue::Number(1.5)
        );
        assert_eq!(
            CellValue::from_field("0.000000000000000000001"),
            CellValue::Number(1e-21)
        );
    }

    #[test]
    fn test_styles_differ_only_in_weight() {
        assert_eq!(BODY_STYLE.font_name, HEADER_STYLE.font_name);
        assert_eq!(BODY_STYLE.font_size, HEADER_STYLE.font_size);
        assert!(HEADER_STYLE.bold);
        assert!(!BODY_STYLE.bold);
    }

    #[test]
    fn test_request_and_artifacts() {
        let request = ExportRequest::new("SELECT id FROM users", ["id"]);
        assert_eq!(request.headers, vec!["id".to_string()]);

        let artifact = TemporaryArtifact::spreadsheet("/tmp/a.xlsx");
        assert_eq!(artifact.format.extension(), "xlsx");
        assert_eq!(artifact.into_path(), PathBuf::from("/tmp/a.xlsx"));

        let record = DelimitedRecord::new(0, vec!["A".into(), "B".into()]);
        assert!(record.is_header());
        assert_eq!(record.get(1), Some("B"));
    }
}
