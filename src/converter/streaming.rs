//! In-process conversion through the streaming workbook writer

use super::{Converter, ConverterKind};
use crate::config::ExportConfig;
use crate::delimited::DelimitedReader;
use crate::error::ConversionError;
use crate::fast_writer::{RowStyle, StyledWorkbook, WorkbookOptions};
use crate::types::CellValue;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Reads the delimited file row by row and streams it into an XLSX file
///
/// Record 0 is written with the bold header style, every later record with
/// the body style. If anything fails the partial spreadsheet is removed, so a
/// malformed input never leaves a silently truncated file behind.
#[derive(Debug, Clone, Default)]
pub struct StreamingConverter {
    options: WorkbookOptions,
}

impl StreamingConverter {
    pub fn new(options: WorkbookOptions) -> Self {
        StreamingConverter { options }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(WorkbookOptions::from_config(config))
    }

    fn write(&self, delimited: &Path, spreadsheet: &Path) -> Result<u32, ConversionError> {
        let mut reader = DelimitedReader::open(delimited)?;
        let mut workbook = StyledWorkbook::create(spreadsheet, self.options.clone())?;

        let mut cells = Vec::new();
        while let Some(record) = reader.read_record()? {
            cells.clear();
            cells.extend(record.cells.iter().map(|field| CellValue::from_field(field)));

            let style = if record.is_header() {
                RowStyle::Header
            } else {
                RowStyle::Body
            };
            workbook.write_row(&cells, style)?;
        }

        let rows = workbook.rows_written();
        workbook.close()?;
        Ok(rows)
    }
}

impl Converter for StreamingConverter {
    fn convert(&self, delimited: &Path, spreadsheet: &Path) -> Result<(), ConversionError> {
        match self.write(delimited, spreadsheet) {
            Ok(rows) => {
                debug!(rows, output = %spreadsheet.display(), "streamed spreadsheet");
                Ok(())
            }
            Err(err) => {
                if let Err(remove_err) = fs::remove_file(spreadsheet) {
                    if remove_err.kind() != ErrorKind::NotFound {
                        warn!(
                            output = %spreadsheet.display(),
                            error = %remove_err,
                            "could not remove partial spreadsheet"
                        );
                    }
                }
                Err(err)
            }
        }
    }

    fn kind(&self) -> ConverterKind {
        ConverterKind::StreamingWriter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    fn sheet_xml(path: &Path) -> String {
        let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
        let mut part = archive.by_name("xl/worksheets/sheet1.xml").unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_converts_header_and_rows() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("in.xlsx");
        fs::write(&input, "\"id\"\t\"name\"\n\"1\"\t\"Alice\"\n\"2\"\t\"Bob\"\n").unwrap();

        StreamingConverter::default().convert(&input, &output).unwrap();

        let xml = sheet_xml(&output);
        assert_eq!(xml.matches("<row ").count(), 3);
        assert!(xml.contains("<c r=\"B1\" s=\"1\" t=\"inlineStr\"><is><t>name</t></is></c>"));
        assert!(xml.contains("<c r=\"A3\"><v>2</v></c><c r=\"B3\" t=\"inlineStr\"><is><t>Bob</t></is></c>"));
    }

    #[test]
    fn test_unterminated_quote_leaves_no_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("bad.csv");
        let output = dir.path().join("bad.xlsx");
        fs::write(&input, "\"A\"\t\"B\"\n\"x\"\t\"y\n\"z\"\t\"w\"\n").unwrap();

        let err = StreamingConverter::default()
            .convert(&input, &output)
            .unwrap_err();

        assert!(matches!(err, ConversionError::MalformedInput { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_input_creates_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("none.xlsx");

        let err = StreamingConverter::default()
            .convert(&dir.path().join("none.csv"), &output)
            .unwrap_err();

        assert!(matches!(err, ConversionError::Io(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_kind() {
        assert_eq!(
            StreamingConverter::default().kind(),
            ConverterKind::StreamingWriter
        );
    }
}
