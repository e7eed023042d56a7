//! The tab-delimited text layout shared by the bulk export and the converters
//!
//! The database engine writes it (`FIELDS TERMINATED BY '\t' ENCLOSED BY '"'
//! ESCAPED BY '"' LINES TERMINATED BY '\n'`) and both converter strategies
//! read it:
//!
//! - UTF-8 text
//! - fields separated by a horizontal tab
//! - fields enclosed in double quotes, an embedded quote is doubled
//! - records terminated by `\n`
//! - the first record is the header row
//!
//! With the escape character equal to the enclosure the engine also writes
//! two escape sequences of its own:
//!
//! - SQL `NULL` as an unenclosed `"N` filling the whole field
//! - an ASCII NUL inside an enclosed field as `"0`
//!
//! [`DelimitedReader`] decodes both: `NULL` becomes an empty field, `"0` a
//! NUL character. A text value that itself starts with `N` followed by a
//! tab or newline is indistinguishable from `NULL` and reads back as empty.

use crate::error::ConversionError;
use crate::types::DelimitedRecord;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Field delimiter
pub const FIELD_DELIMITER: u8 = b'\t';
/// Field enclosure
pub const FIELD_ENCLOSURE: u8 = b'"';
/// Escape character inside an enclosed field (the enclosure itself)
pub const ESCAPE: u8 = b'"';
/// Record terminator
pub const LINE_TERMINATOR: u8 = b'\n';
/// Follows [`ESCAPE`] to mark SQL `NULL`
pub const NULL_MARKER: u8 = b'N';
/// Follows [`ESCAPE`] to mark an ASCII NUL
pub const NUL_MARKER: u8 = b'0';

/// Decoder position relative to field enclosures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    FieldStart,
    /// `"` seen at field start: an enclosure or the start of `"N`
    EscapeAtStart,
    /// `"N` seen at field start
    NullMarker,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Read adapter that decodes the engine's escapes before the csv parser
///
/// It also follows enclosures so that end of input inside an enclosed field,
/// which the csv parser accepts as the end of that field, can be reported.
struct EscapeDecoder<R> {
    inner: R,
    state: DecodeState,
    record: u64,
    opened_at: u64,
    chunk: Box<[u8]>,
    decoded: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl<R: Read> EscapeDecoder<R> {
    fn new(inner: R) -> Self {
        EscapeDecoder {
            inner,
            state: DecodeState::FieldStart,
            record: 0,
            opened_at: 0,
            chunk: vec![0; 16 * 1024].into_boxed_slice(),
            decoded: Vec::with_capacity(16 * 1024),
            pos: 0,
            eof: false,
        }
    }

    fn decode(&mut self, byte: u8) {
        use DecodeState::*;

        loop {
            match (self.state, byte) {
                (FieldStart, FIELD_ENCLOSURE) => {
                    self.opened_at = self.record;
                    self.state = EscapeAtStart;
                }
                (EscapeAtStart, NULL_MARKER) => self.state = NullMarker,
                (EscapeAtStart, _) => {
                    self.decoded.push(FIELD_ENCLOSURE);
                    self.state = Quoted;
                    continue;
                }
                (NullMarker, FIELD_DELIMITER | LINE_TERMINATOR) => {
                    // An enclosed empty field, so a lone NULL is not a blank line
                    self.decoded.extend_from_slice(&[FIELD_ENCLOSURE, FIELD_ENCLOSURE]);
                    self.state = FieldStart;
                    continue;
                }
                (NullMarker, _) => {
                    self.decoded.extend_from_slice(&[FIELD_ENCLOSURE, NULL_MARKER]);
                    self.state = Quoted;
                    continue;
                }
                (Quoted, FIELD_ENCLOSURE) => self.state = QuoteInQuoted,
                (Quoted, _) => self.decoded.push(byte),
                (QuoteInQuoted, ESCAPE) => {
                    self.decoded.extend_from_slice(&[ESCAPE, FIELD_ENCLOSURE]);
                    self.state = Quoted;
                }
                (QuoteInQuoted, NUL_MARKER) => {
                    self.decoded.push(0);
                    self.state = Quoted;
                }
                (QuoteInQuoted, _) => {
                    self.decoded.push(FIELD_ENCLOSURE);
                    self.state = Unquoted;
                    continue;
                }
                (_, FIELD_DELIMITER) => {
                    self.decoded.push(byte);
                    self.state = FieldStart;
                }
                (_, LINE_TERMINATOR) => {
                    self.decoded.push(byte);
                    self.record += 1;
                    self.state = FieldStart;
                }
                _ => {
                    self.decoded.push(byte);
                    self.state = Unquoted;
                }
            }
            break;
        }
    }

    /// Settle whatever was still undecided when the input ended
    fn finish(&mut self) {
        match self.state {
            DecodeState::EscapeAtStart => {
                self.decoded.push(FIELD_ENCLOSURE);
                self.state = DecodeState::Quoted;
            }
            DecodeState::NullMarker => {
                self.decoded.extend_from_slice(&[FIELD_ENCLOSURE, FIELD_ENCLOSURE]);
                self.state = DecodeState::FieldStart;
            }
            DecodeState::QuoteInQuoted => {
                self.decoded.push(FIELD_ENCLOSURE);
                self.state = DecodeState::Unquoted;
            }
            _ => {}
        }
    }

    /// Record number where an unclosed enclosure started, if any
    fn unterminated(&self) -> Option<u64> {
        (self.state == DecodeState::Quoted).then_some(self.opened_at)
    }
}

impl<R: Read> Read for EscapeDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.decoded.len() {
            if self.eof {
                return Ok(0);
            }
            self.decoded.clear();
            self.pos = 0;

            let n = self.inner.read(&mut self.chunk)?;
            if n == 0 {
                self.eof = true;
                self.finish();
                continue;
            }
            for i in 0..n {
                let byte = self.chunk[i];
                self.decode(byte);
            }
        }

        let n = buf.len().min(self.decoded.len() - self.pos);
        buf[..n].copy_from_slice(&self.decoded[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Streaming reader of delimited records
///
/// # Examples
///
/// ```
/// use outfile_xlsx::delimited::DelimitedReader;
///
/// let data = "\"id\"\t\"name\"\n\"1\"\t\"Alice\"\n";
/// let rows: Vec<_> = DelimitedReader::from_reader(data.as_bytes())
///     .collect::<Result<Vec<_>, _>>()
///     .unwrap();
///
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1].cells, vec!["1", "Alice"]);
/// ```
pub struct DelimitedReader<R: Read> {
    inner: csv::Reader<EscapeDecoder<R>>,
    record: csv::StringRecord,
    next_index: u64,
    done: bool,
}

impl DelimitedReader<BufReader<File>> {
    /// Open a delimited file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ConversionError> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::with_capacity(64 * 1024, file)))
    }
}

impl<R: Read> DelimitedReader<R> {
    pub fn from_reader(reader: R) -> Self {
        let inner = csv::ReaderBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .quote(FIELD_ENCLOSURE)
            .double_quote(true)
            .escape(None)
            .terminator(csv::Terminator::Any(LINE_TERMINATOR))
            .has_headers(false)
            .flexible(false)
            .from_reader(EscapeDecoder::new(reader));

        DelimitedReader {
            inner,
            record: csv::StringRecord::new(),
            next_index: 0,
            done: false,
        }
    }

    /// Read the next record, `None` at a clean end of input
    pub fn read_record(&mut self) -> Result<Option<DelimitedRecord>, ConversionError> {
        if self.done {
            return Ok(None);
        }

        let more = match self.inner.read_record(&mut self.record) {
            Ok(more) => more,
            Err(err) => {
                self.done = true;
                return Err(err.into());
            }
        };

        if !more {
            self.done = true;
            if let Some(record) = self.inner.get_ref().unterminated() {
                return Err(ConversionError::MalformedInput {
                    record,
                    message: "unterminated quoted field at end of input".to_string(),
                });
            }
            return Ok(None);
        }

        let record = DelimitedRecord::new(
            self.next_index,
            self.record.iter().map(str::to_string).collect(),
        );
        self.next_index += 1;
        Ok(Some(record))
    }

    /// Number of records returned so far
    pub fn records_read(&self) -> u64 {
        self.next_index
    }
}

impl<R: Read> Iterator for DelimitedReader<R> {
    type Item = Result<DelimitedRecord, ConversionError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

/// Writer producing the same layout the engine writes
pub struct DelimitedWriter<W: Write> {
    inner: csv::Writer<W>,
}

impl DelimitedWriter<BufWriter<File>> {
    /// Create (or truncate) a delimited file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ConversionError> {
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write> DelimitedWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        let inner = csv::WriterBuilder::new()
            .delimiter(FIELD_DELIMITER)
            .quote(FIELD_ENCLOSURE)
            .double_quote(true)
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(LINE_TERMINATOR))
            .from_writer(writer);

        DelimitedWriter { inner }
    }

    /// Write one record, every field enclosed
    pub fn write_record<I, S>(&mut self, cells: I) -> Result<(), ConversionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.inner.write_record(cells)?;
        Ok(())
    }

    /// Flush and return the underlying writer
    pub fn finish(self) -> Result<W, ConversionError> {
        self.inner
            .into_inner()
            .map_err(|err| ConversionError::Io(err.into_error()))
    }
}
