//! Delimiter-sniffing, quote-aware decoding of vendor catalog files.
//!
//! The vendor exports are "CSV" in the loosest sense: the delimiter varies
//! between feeds, quoting is inconsistent, and the first line sometimes
//! carries a UTF-8 BOM. Parsing is best-effort by design; a stray quote may
//! shift field boundaries but never raises an error.

/// Pick the delimiter used by a header line.
///
/// Counts occurrences of comma, tab, semicolon and pipe; the most frequent
/// wins, with ties broken in that priority order. Falls back to comma when
/// none of them appear.
pub fn detect_delimiter(header_line: &str) -> char {
  let mut best = (',', 0usize);
  for delim in [',', '\t', ';', '|'] {
    let count = header_line.matches(delim).count();
    if count > best.1 {
      best = (delim, count);
    }
  }
  best.0
}

/// Split one physical line into trimmed fields.
///
/// Single left-to-right scan with an in-quotes flag. An escaped quote (`""`
/// inside a quoted field) emits one literal quote without toggling state.
/// Embedded newlines are not supported; each line is one record.
pub fn parse_line(line: &str, delim: char) -> Vec<String> {
  let mut out = Vec::new();
  let mut cur = String::new();
  let mut in_quotes = false;
  let mut chars = line.chars().peekable();

  while let Some(ch) = chars.next() {
    if ch == '"' {
      if in_quotes && chars.peek() == Some(&'"') {
        cur.push('"');
        chars.next();
      } else {
        in_quotes = !in_quotes;
      }
    } else if ch == delim && !in_quotes {
      out.push(cur.trim().to_string());
      cur.clear();
    } else {
      cur.push(ch);
    }
  }

  out.push(cur.trim().to_string());
  out
}

/// A parsed tabular file: lowercased header names plus raw field rows.
///
/// Header lookup is case-insensitive (names are lowercased once at parse
/// time) and alias-aware, since the vendor is not consistent about column
/// naming across feed versions.
pub struct Table {
  headers: Vec<String>,
  rows: Vec<Vec<String>>,
  delimiter: char,
}

impl Table {
  /// Parse a whole file. Returns `None` when there is no header row to
  /// sniff a delimiter from (empty file or only blank lines).
  pub fn parse(content: &str) -> Option<Table> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines().filter(|l| !l.is_empty());

    let header_line = lines.next()?;
    let delimiter = detect_delimiter(header_line);
    let headers = parse_line(header_line, delimiter)
      .iter()
      .map(|h| h.to_lowercase())
      .collect();
    let rows = lines.map(|l| parse_line(l, delimiter)).collect();

    Some(Table {
      headers,
      rows,
      delimiter,
    })
  }

  pub fn delimiter(&self) -> char {
    self.delimiter
  }

  pub fn headers(&self) -> &[String] {
    &self.headers
  }

  pub fn rows(&self) -> &[Vec<String>] {
    &self.rows
  }

  /// Index of a column by name, case-insensitively.
  pub fn column(&self, name: &str) -> Option<usize> {
    let name = name.to_lowercase();
    self.headers.iter().position(|h| *h == name)
  }

  /// Index of the first column matching any of the given aliases.
  pub fn column_any(&self, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|a| self.column(a))
  }
}

/// Field at a resolved column index, or `""` when the column is missing or
/// the row is short.
pub fn field<'a>(row: &'a [String], idx: Option<usize>) -> &'a str {
  idx
    .and_then(|i| row.get(i))
    .map(String::as_str)
    .unwrap_or("")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_detect_most_frequent_delimiter() {
    assert_eq!(detect_delimiter("a,b,c"), ',');
    assert_eq!(detect_delimiter("a\tb\tc"), '\t');
    assert_eq!(detect_delimiter("a;b;c;d"), ';');
    assert_eq!(detect_delimiter("a|b|c"), '|');
    // Semicolons outnumber commas.
    assert_eq!(detect_delimiter("a;b;c;d,e"), ';');
  }

  #[test]
  fn test_detect_tie_breaks_by_priority() {
    // One of each: comma wins.
    assert_eq!(detect_delimiter("a,b\tc;d|e"), ',');
    // Tab vs semicolon tie: tab wins.
    assert_eq!(detect_delimiter("a\tb;c\td;e"), '\t');
  }

  #[test]
  fn test_detect_defaults_to_comma() {
    assert_eq!(detect_delimiter("single-column"), ',');
    assert_eq!(detect_delimiter(""), ',');
  }

  #[test]
  fn test_parse_plain_fields() {
    assert_eq!(parse_line("a,b,c", ','), vec!["a", "b", "c"]);
    assert_eq!(parse_line("a, b , c", ','), vec!["a", "b", "c"]);
  }

  #[test]
  fn test_parse_quoted_delimiter() {
    assert_eq!(
      parse_line(r#""Bella, Canvas",3001"#, ','),
      vec!["Bella, Canvas", "3001"]
    );
  }

  #[test]
  fn test_parse_escaped_quote() {
    assert_eq!(parse_line(r#""a""b",c"#, ','), vec![r#"a"b"#, "c"]);
  }

  #[test]
  fn test_parse_stray_quote_degrades_without_error() {
    // Unterminated quote swallows the rest of the line into one field.
    assert_eq!(parse_line(r#"a,"b,c"#, ','), vec!["a", "b,c"]);
  }

  #[test]
  fn test_parse_empty_fields() {
    assert_eq!(parse_line(",,", ','), vec!["", "", ""]);
  }

  #[test]
  fn test_table_strips_bom_and_lowercases_headers() {
    let table = Table::parse("\u{feff}StyleID,BrandName\n1,Acme\n").unwrap();
    assert_eq!(table.headers(), ["styleid", "brandname"]);
    assert_eq!(table.column("styleID"), Some(0));
    assert_eq!(table.rows().len(), 1);
  }

  #[test]
  fn test_table_column_aliases() {
    let table = Table::parse("StyleImageURL,Image\nx,y\n").unwrap();
    assert_eq!(table.column_any(&["styleimage", "styleimageurl"]), Some(0));
    assert_eq!(table.column_any(&["nope", "image"]), Some(1));
    assert_eq!(table.column_any(&["missing"]), None);
  }

  #[test]
  fn test_table_empty_content() {
    assert!(Table::parse("").is_none());
    assert!(Table::parse("\n\n").is_none());
  }

  #[test]
  fn test_field_tolerates_short_rows() {
    let row = vec!["a".to_string()];
    assert_eq!(field(&row, Some(0)), "a");
    assert_eq!(field(&row, Some(5)), "");
    assert_eq!(field(&row, None), "");
  }
}
