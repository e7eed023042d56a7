//! Builder for the `SELECT ... INTO OUTFILE` bulk export statement
//!
//! `INTO OUTFILE` cannot emit arbitrary header text, so the header row is a
//! literal subquery glued in front with `UNION ALL`. The engine writes that
//! single row first and then the query rows, all into the same file, in one
//! round trip:
//!
//! ```text
//! (SELECT 'id','name') UNION ALL (SELECT id, name FROM users INTO OUTFILE '/tmp/x.csv' FIELDS ...)
//! ```

use std::path::Path;

/// Fixed `FIELDS`/`LINES` options of the delimited convention
pub const OUTFILE_OPTIONS: &str = r#"FIELDS TERMINATED BY '\t' ENCLOSED BY '"' ESCAPED BY '"' LINES TERMINATED BY '\n'"#;

/// Quote a value as a MySQL string literal
///
/// # Examples
///
/// ```
/// use outfile_xlsx::statement::quote_literal;
///
/// assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
/// assert_eq!(quote_literal(r"C:\tmp"), r"'C:\\tmp'");
/// ```
pub fn quote_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\'' => out.push_str("''"),
            '\\' => out.push_str("\\\\"),
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Combined header + data export statement
#[derive(Debug, Clone)]
pub struct OutfileStatement<'a> {
    query: &'a str,
    headers: &'a [String],
    path: &'a Path,
}

impl<'a> OutfileStatement<'a> {
    pub fn new(query: &'a str, headers: &'a [String], path: &'a Path) -> Self {
        OutfileStatement {
            query,
            headers,
            path,
        }
    }

    /// The literal header subquery, e.g. `SELECT 'id','name'`
    pub fn header_select(&self) -> String {
        let columns: Vec<String> = self.headers.iter().map(|h| quote_literal(h)).collect();
        format!("SELECT {}", columns.join(","))
    }

    /// Render the full statement
    pub fn build(&self) -> String {
        let query = self.query.trim().trim_end_matches(';').trim_end();
        let path = self.path.to_string_lossy();

        format!(
            "({}) UNION ALL ({} INTO OUTFILE {} {})",
            self.header_select(),
            query,
            quote_literal(&path),
            OUTFILE_OPTIONS
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_statement_shape() {
        let h = headers(&["id", "name"]);
        let sql = OutfileStatement::new("SELECT id, name FROM users", &h, Path::new("/tmp/tmp_ab.csv"))
            .build();

        assert_eq!(
            sql,
            "(SELECT 'id','name') UNION ALL (SELECT id, name FROM users \
             INTO OUTFILE '/tmp/tmp_ab.csv' \
             FIELDS TERMINATED BY '\\t' ENCLOSED BY '\"' ESCAPED BY '\"' \
             LINES TERMINATED BY '\\n')"
        );
    }

    #[test]
    fn test_header_quotes_cannot_escape_literal() {
        let h = headers(&["it's", "x') UNION SELECT password FROM users -- "]);
        let stmt = OutfileStatement::new("SELECT 1, 2", &h, Path::new("/tmp/a.csv"));

        assert_eq!(
            stmt.header_select(),
            "SELECT 'it''s','x'') UNION SELECT password FROM users -- '"
        );
    }

    #[test]
    fn test_trailing_semicolon_is_dropped() {
        let h = headers(&["n"]);
        let sql = OutfileStatement::new("  SELECT n FROM t;  \n", &h, Path::new("/tmp/a.csv")).build();

        assert!(sql.contains("(SELECT n FROM t INTO OUTFILE '/tmp/a.csv' "));
    }

    #[test]
    fn test_path_backslashes_are_escaped() {
        let h = headers(&["n"]);
        let sql = OutfileStatement::new("SELECT 1", &h, Path::new(r"C:\Temp\tmp_1.csv")).build();

        assert!(sql.contains(r"INTO OUTFILE 'C:\\Temp\\tmp_1.csv'"));
    }

    #[test]
    fn test_control_characters_are_escaped() {
        assert_eq!(quote_literal("a\nb\r\0\u{1a}"), r"'a\nb\r\0\Z'");
    }
}
