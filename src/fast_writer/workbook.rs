//! Single-sheet streaming workbook with a body style and a bold header style

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use super::xml_writer::{escape_into, XmlWriter};
use super::WriteResult;
use crate::config::ExportConfig;
use crate::error::ConversionError;
use crate::types::{CellValue, ConversionStyle, BODY_STYLE, HEADER_STYLE};

/// Excel row limit
pub const MAX_ROWS: u32 = 1_048_576;
/// Excel column limit
pub const MAX_COLS: u32 = 16_384;

const SPREADSHEETML_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Which of the two workbook styles a row uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStyle {
    Body = 0,
    Header = 1,
}

impl RowStyle {
    /// Index into `cellXfs`
    pub fn index(&self) -> u32 {
        *self as u32
    }
}

/// Settings for [`StyledWorkbook`]
#[derive(Debug, Clone)]
pub struct WorkbookOptions {
    pub sheet_name: String,
    pub compression_level: i64,
    pub flush_interval: u32,
    pub body_style: ConversionStyle,
    pub header_style: ConversionStyle,
}

impl Default for WorkbookOptions {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

impl WorkbookOptions {
    pub fn from_config(config: &ExportConfig) -> Self {
        WorkbookOptions {
            sheet_name: config.sheet_name.clone(),
            compression_level: config.compression_level,
            flush_interval: config.flush_interval,
            body_style: BODY_STYLE,
            header_style: HEADER_STYLE,
        }
    }
}

/// Streaming XLSX writer with one worksheet
///
/// Rows go straight into the deflate stream of the worksheet entry; only the
/// current row is held in memory.
///
/// # Examples
///
/// ```no_run
/// use outfile_xlsx::fast_writer::{RowStyle, StyledWorkbook, WorkbookOptions};
/// use outfile_xlsx::types::CellValue;
///
/// let mut workbook = StyledWorkbook::create("out.xlsx", WorkbookOptions::default())?;
/// workbook.write_row(&[CellValue::from("id"), CellValue::from("name")], RowStyle::Header)?;
/// workbook.write_row(&[CellValue::from("1"), CellValue::from("Alice")], RowStyle::Body)?;
/// workbook.close()?;
/// # Ok::<(), outfile_xlsx::ConversionError>(())
/// ```
pub struct StyledWorkbook {
    zip: ZipWriter<BufWriter<File>>,
    file_options: SimpleFileOptions,
    options: WorkbookOptions,
    current_row: u32,
    xml_buffer: Vec<u8>,
    cell_ref_cache: Vec<String>,
}

impl StyledWorkbook {
    /// Create the file and open the worksheet for rows
    pub fn create<P: AsRef<Path>>(path: P, options: WorkbookOptions) -> WriteResult<Self> {
        validate_sheet_name(&options.sheet_name)?;

        let file = File::create(path)?;
        let writer = BufWriter::with_capacity(64 * 1024, file);
        let zip = ZipWriter::new(writer);

        let file_options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(options.compression_level.clamp(1, 9)));

        // Pre-generate column letters for the first 100 columns (A-CV)
        let cell_ref_cache = (1..=100).map(col_to_letter).collect();

        let mut workbook = StyledWorkbook {
            zip,
            file_options,
            options,
            current_row: 0,
            xml_buffer: Vec::with_capacity(8192),
            cell_ref_cache,
        };

        workbook.zip.start_file("xl/worksheets/sheet1.xml", file_options)?;
        let mut xml = XmlWriter::new(&mut workbook.zip);
        xml.declaration()?;
        xml.start_element("worksheet")?;
        xml.attribute("xmlns", SPREADSHEETML_NS)?;
        xml.attribute("xmlns:r", RELATIONSHIPS_NS)?;
        xml.close_start_tag()?;
        xml.start_element("sheetData")?;
        xml.close_start_tag()?;
        xml.flush()?;

        Ok(workbook)
    }

    /// Append a row
    pub fn write_row(&mut self, cells: &[CellValue], style: RowStyle) -> WriteResult<()> {
        if self.current_row >= MAX_ROWS {
            return Err(ConversionError::Write(format!(
                "row limit of {} exceeded",
                MAX_ROWS
            )));
        }
        if cells.len() as u32 > MAX_COLS {
            return Err(ConversionError::Write(format!(
                "row {} has {} cells, limit is {}",
                self.current_row + 1,
                cells.len(),
                MAX_COLS
            )));
        }

        self.current_row += 1;
        let mut num = itoa::Buffer::new();
        let row_num = num.format(self.current_row).to_string();

        self.xml_buffer.clear();
        self.xml_buffer.extend_from_slice(b"<row r=\"");
        self.xml_buffer.extend_from_slice(row_num.as_bytes());
        self.xml_buffer.extend_from_slice(b"\">");

        for (col_idx, value) in cells.iter().enumerate() {
            if value.is_empty() && style == RowStyle::Body {
                continue;
            }

            self.xml_buffer.extend_from_slice(b"<c r=\"");
            match self.cell_ref_cache.get(col_idx) {
                Some(letter) => self.xml_buffer.extend_from_slice(letter.as_bytes()),
                None => self
                    .xml_buffer
                    .extend_from_slice(col_to_letter(col_idx as u32 + 1).as_bytes()),
            }
            self.xml_buffer.extend_from_slice(row_num.as_bytes());
            self.xml_buffer.push(b'"');

            if style.index() > 0 {
                self.xml_buffer.extend_from_slice(b" s=\"");
                self.xml_buffer
                    .extend_from_slice(num.format(style.index()).as_bytes());
                self.xml_buffer.push(b'"');
            }

            match value {
                CellValue::Empty => self.xml_buffer.extend_from_slice(b"/>"),
                CellValue::Number(n) => {
                    self.xml_buffer.extend_from_slice(b"><v>");
                    self.xml_buffer.extend_from_slice(n.to_string().as_bytes());
                    self.xml_buffer.extend_from_slice(b"</v></c>");
                }
                CellValue::Text(s) => {
                    if needs_space_preserve(s) {
                        self.xml_buffer
                            .extend_from_slice(b" t=\"inlineStr\"><is><t xml:space=\"preserve\">");
                    } else {
                        self.xml_buffer
                            .extend_from_slice(b" t=\"inlineStr\"><is><t>");
                    }
                    escape_into(&mut self.xml_buffer, s);
                    self.xml_buffer.extend_from_slice(b"</t></is></c>");
                }
            }
        }

        self.xml_buffer.extend_from_slice(b"</row>");
        self.zip.write_all(&self.xml_buffer)?;

        if self.current_row % self.options.flush_interval.max(1) == 0 {
            self.zip.flush()?;
        }

        Ok(())
    }

    /// Number of rows written so far
    pub fn rows_written(&self) -> u32 {
        self.current_row
    }

    /// Finish the worksheet, write the remaining parts and flush to disk
    pub fn close(mut self) -> WriteResult<()> {
        self.zip.write_all(b"</sheetData></worksheet>")?;

        let options = self.file_options;

        self.zip.start_file("[Content_Types].xml", options)?;
        self.zip.write_all(CONTENT_TYPES.as_bytes())?;

        self.zip.start_file("_rels/.rels", options)?;
        self.zip.write_all(ROOT_RELS.as_bytes())?;

        self.zip.start_file("docProps/app.xml", options)?;
        self.zip.write_all(APP_PROPS.as_bytes())?;

        self.zip.start_file("docProps/core.xml", options)?;
        self.write_core_props()?;

        self.zip.start_file("xl/workbook.xml", options)?;
        self.write_workbook_xml()?;

        self.zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        self.zip.write_all(WORKBOOK_RELS.as_bytes())?;

        self.zip.start_file("xl/styles.xml", options)?;
        self.write_styles()?;

        let mut writer = self.zip.finish()?;
        writer.flush()?;
        Ok(())
    }

    fn write_core_props(&mut self) -> WriteResult<()> {
        let now = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let mut xml = XmlWriter::new(&mut self.zip);

        xml.declaration()?;
        xml.start_element("cp:coreProperties")?;
        xml.attribute(
            "xmlns:cp",
            "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
        )?;
        xml.attribute("xmlns:dc", "http://purl.org/dc/elements/1.1/")?;
        xml.attribute("xmlns:dcterms", "http://purl.org/dc/terms/")?;
        xml.attribute("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance")?;
        xml.close_start_tag()?;

        xml.start_element("dc:creator")?;
        xml.close_start_tag()?;
        xml.write_str(env!("CARGO_PKG_NAME"))?;
        xml.end_element("dc:creator")?;

        for tag in ["dcterms:created", "dcterms:modified"] {
            xml.start_element(tag)?;
            xml.attribute("xsi:type", "dcterms:W3CDTF")?;
            xml.close_start_tag()?;
            xml.write_str(&now)?;
            xml.end_element(tag)?;
        }

        xml.end_element("cp:coreProperties")?;
        xml.flush()
    }

    fn write_workbook_xml(&mut self) -> WriteResult<()> {
        let mut xml = XmlWriter::new(&mut self.zip);

        xml.declaration()?;
        xml.start_element("workbook")?;
        xml.attribute("xmlns", SPREADSHEETML_NS)?;
        xml.attribute("xmlns:r", RELATIONSHIPS_NS)?;
        xml.close_start_tag()?;

        xml.start_element("sheets")?;
        xml.close_start_tag()?;
        xml.start_element("sheet")?;
        xml.attribute("name", &self.options.sheet_name)?;
        xml.attribute_int("sheetId", 1)?;
        xml.attribute("r:id", "rId1")?;
        xml.close_empty()?;
        xml.end_element("sheets")?;

        xml.end_element("workbook")?;
        xml.flush()
    }

    /// Font 0 is the body style and the workbook default, font 1 the header
    fn write_styles(&mut self) -> WriteResult<()> {
        let body = self.options.body_style;
        let header = self.options.header_style;
        let mut xml = XmlWriter::new(&mut self.zip);

        xml.declaration()?;
        xml.start_element("styleSheet")?;
        xml.attribute("xmlns", SPREADSHEETML_NS)?;
        xml.close_start_tag()?;

        xml.start_element("fonts")?;
        xml.attribute_int("count", 2)?;
        xml.close_start_tag()?;
        write_font(&mut xml, &body)?;
        write_font(&mut xml, &header)?;
        xml.end_element("fonts")?;

        xml.write_str(
            "<fills count=\"2\"><fill><patternFill patternType=\"none\"/></fill>\
             <fill><patternFill patternType=\"gray125\"/></fill></fills>\
             <borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>\
             <cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>\
             <cellXfs count=\"2\">\
             <xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>\
             <xf numFmtId=\"0\" fontId=\"1\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyFont=\"1\"/>\
             </cellXfs>\
             <cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>",
        )?;

        xml.end_element("styleSheet")?;
        xml.flush()
    }
}

fn write_font<W: Write>(xml: &mut XmlWriter<W>, style: &ConversionStyle) -> WriteResult<()> {
    xml.start_element("font")?;
    xml.close_start_tag()?;
    if style.bold {
        xml.empty_element("b")?;
    }
    xml.start_element("sz")?;
    xml.attribute("val", &style.font_size.to_string())?;
    xml.close_empty()?;
    xml.start_element("name")?;
    xml.attribute("val", style.font_name)?;
    xml.close_empty()?;
    xml.start_element("family")?;
    xml.attribute_int("val", 2)?;
    xml.close_empty()?;
    xml.end_element("font")
}

fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace)
}

fn validate_sheet_name(name: &str) -> WriteResult<()> {
    let len = name.chars().count();
    if len == 0 || len > 31 {
        return Err(ConversionError::Write(format!(
            "sheet name '{}' must be 1-31 characters",
            name
        )));
    }
    if let Some(c) = name
        .chars()
        .find(|c| matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
    {
        return Err(ConversionError::Write(format!(
            "sheet name '{}' contains invalid character '{}'",
            name, c
        )));
    }
    Ok(())
}

/// Convert 1-based column number to letters (1 -> A, 27 -> AA)
fn col_to_letter(col: u32) -> String {
    let mut col_str = String::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        col_str.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    col_str
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

const APP_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
<Application>outfile-xlsx</Application>
<DocSecurity>0</DocSecurity>
<ScaleCrop>false</ScaleCrop>
<LinksUpToDate>false</LinksUpToDate>
<SharedDoc>false</SharedDoc>
<HyperlinksChanged>false</HyperlinksChanged>
</Properties>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;

    fn read_part(path: &Path, name: &str) -> String {
        let file = File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_col_to_letter() {
        assert_eq!(col_to_letter(1), "A");
        assert_eq!(col_to_letter(26), "Z");
        assert_eq!(col_to_letter(27), "AA");
        assert_eq!(col_to_letter(16_384), "XFD");
    }

    #[test]
    fn test_header_cells_bold_body_cells_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("styled.xlsx");

        let mut workbook = StyledWorkbook::create(&path, WorkbookOptions::default()).unwrap();
        workbook
            .write_row(&["id".into(), "name".into()], RowStyle::Header)
            .unwrap();
        workbook
            .write_row(&["1".into(), "Alice".into()], RowStyle::Body)
            .unwrap();
        assert_eq!(workbook.rows_written(), 2);
        workbook.close().unwrap();

        let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(
            "<row r=\"1\"><c r=\"A1\" s=\"1\" t=\"inlineStr\"><is><t>id</t></is></c>"
        ));
        assert!(sheet.contains(
            "<row r=\"2\"><c r=\"A2\"><v>1</v></c><c r=\"B2\" t=\"inlineStr\"><is><t>Alice</t></is></c></row>"
        ));

        let styles = read_part(&path, "xl/styles.xml");
        assert!(styles.contains(
            "<font><sz val=\"12\"/><name val=\"Arial\"/><family val=\"2\"/></font>\
             <font><b/><sz val=\"12\"/><name val=\"Arial\"/><family val=\"2\"/></font>"
        ));
        assert!(styles.contains("fontId=\"1\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyFont=\"1\""));
    }

    #[test]
    fn test_escaping_and_whitespace() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("escaped.xlsx");

        let mut workbook = StyledWorkbook::create(&path, WorkbookOptions::default()).unwrap();
        workbook
            .write_row(
                &[CellValue::Text("a<b & c".into()), CellValue::Text(" pad ".into())],
                RowStyle::Body,
            )
            .unwrap();
        workbook.close().unwrap();

        let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("<t>a&lt;b &amp; c</t>"));
        assert!(sheet.contains("<t xml:space=\"preserve\"> pad </t>"));
    }

    #[test]
    fn test_empty_body_cells_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sparse.xlsx");

        let mut workbook = StyledWorkbook::create(&path, WorkbookOptions::default()).unwrap();
        workbook
            .write_row(&["A".into(), CellValue::Empty, "C".into()], RowStyle::Body)
            .unwrap();
        workbook.close().unwrap();

        let sheet = read_part(&path, "xl/worksheets/sheet1.xml");
        assert!(!sheet.contains("r=\"B1\""));
        assert!(sheet.contains("r=\"C1\""));
    }

    #[test]
    fn test_sheet_name_is_validated() {
        let dir = tempdir().unwrap();
        let options = WorkbookOptions {
            sheet_name: "bad/name".to_string(),
            ..WorkbookOptions::default()
        };

        let result = StyledWorkbook::create(dir.path().join("x.xlsx"), options);
        assert!(matches!(result, Err(ConversionError::Write(_))));
    }

    #[test]
    fn test_workbook_lists_configured_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("named.xlsx");
        let options = WorkbookOptions {
            sheet_name: "Q&A".to_string(),
            ..WorkbookOptions::default()
        };

        StyledWorkbook::create(&path, options).unwrap().close().unwrap();

        let workbook = read_part(&path, "xl/workbook.xml");
        assert!(workbook.contains("<sheet name=\"Q&amp;A\" sheetId=\"1\" r:id=\"rId1\"/>"));
    }
}
