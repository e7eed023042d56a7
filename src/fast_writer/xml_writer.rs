//! Small buffered XML writer used for the static workbook parts

use super::WriteResult;
use std::io::Write;

/// Append `text` to `buffer` with XML escaping
///
/// Characters XML 1.0 cannot carry (control characters, U+FFFE, U+FFFF) are
/// written in the OOXML `_xHHHH_` form. Literal text already shaped like
/// `_xHHHH_` gets its underscore escaped as `_x005F_` so it reads back as
/// written.
pub fn escape_into(buffer: &mut Vec<u8>, text: &str) {
    for (i, c) in text.char_indices() {
        match c {
            '&' => buffer.extend_from_slice(b"&amp;"),
            '<' => buffer.extend_from_slice(b"&lt;"),
            '>' => buffer.extend_from_slice(b"&gt;"),
            '"' => buffer.extend_from_slice(b"&quot;"),
            '\'' => buffer.extend_from_slice(b"&apos;"),
            '\t' | '\n' | '\r' => buffer.push(c as u8),
            '_' if is_ooxml_escape(&text[i..]) => buffer.extend_from_slice(b"_x005F_"),
            c if (c as u32) < 0x20 || c == '\u{FFFE}' || c == '\u{FFFF}' => {
                buffer.extend_from_slice(format!("_x{:04X}_", c as u32).as_bytes());
            }
            _ => {
                let mut buf = [0; 4];
                buffer.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
}

/// `text` starts with `_xHHHH_`
fn is_ooxml_escape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 7
        && bytes[1] == b'x'
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}

/// Buffered XML writer
pub struct XmlWriter<W: Write> {
    writer: W,
    buffer: Vec<u8>,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(writer: W) -> Self {
        XmlWriter {
            writer,
            buffer: Vec::with_capacity(4096),
        }
    }

    #[inline]
    pub fn write_raw(&mut self, data: &[u8]) -> WriteResult<()> {
        self.buffer.extend_from_slice(data);
        if self.buffer.len() > 4096 {
            self.flush()?;
        }
        Ok(())
    }

    #[inline]
    pub fn write_str(&mut self, s: &str) -> WriteResult<()> {
        self.write_raw(s.as_bytes())
    }

    /// Write `<?xml ...?>` declaration
    pub fn declaration(&mut self) -> WriteResult<()> {
        self.write_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n")
    }

    /// Write XML element start tag (left open for attributes)
    #[inline]
    pub fn start_element(&mut self, name: &str) -> WriteResult<()> {
        self.write_raw(b"<")?;
        self.write_str(name)
    }

    #[inline]
    pub fn close_start_tag(&mut self) -> WriteResult<()> {
        self.write_raw(b">")
    }

    /// Close a start tag as a self-closing element
    #[inline]
    pub fn close_empty(&mut self) -> WriteResult<()> {
        self.write_raw(b"/>")
    }

    #[inline]
    pub fn end_element(&mut self, name: &str) -> WriteResult<()> {
        self.write_raw(b"</")?;
        self.write_str(name)?;
        self.write_raw(b">")
    }

    /// Write `<name/>`
    #[inline]
    pub fn empty_element(&mut self, name: &str) -> WriteResult<()> {
        self.start_element(name)?;
        self.close_empty()
    }

    #[inline]
    pub fn attribute(&mut self, name: &str, value: &str) -> WriteResult<()> {
        self.write_raw(b" ")?;
        self.write_str(name)?;
        self.write_raw(b"=\"")?;
        self.write_escaped(value)?;
        self.write_raw(b"\"")
    }

    #[inline]
    pub fn attribute_int(&mut self, name: &str, value: i64) -> WriteResult<()> {
        let mut num = itoa::Buffer::new();
        self.write_raw(b" ")?;
        self.write_str(name)?;
        self.write_raw(b"=\"")?;
        self.write_str(num.format(value))?;
        self.write_raw(b"\"")
    }

    /// Write text content with XML escaping
    pub fn write_escaped(&mut self, text: &str) -> WriteResult<()> {
        escape_into(&mut self.buffer, text);
        if self.buffer.len() > 4096 {
            self.flush()?;
        }
        Ok(())
    }

    /// Flush buffer to underlying writer
    pub fn flush(&mut self) -> WriteResult<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        self.writer.flush()?;
        Ok(())
    }
}
