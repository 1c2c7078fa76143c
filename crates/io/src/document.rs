// Header-aware reading of exported text files

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::dialect::Dialect;
use crate::error::IoError;

/// A file split into a fixed-size header block and a body.
///
/// Lines keep their own terminators, so concatenating header and body
/// reproduces the input byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub header: Vec<String>,
    pub body: Vec<String>,
}

impl Document {
    /// Split `text` after the first `header_rows` lines. Content is not inspected.
    pub fn split(text: &str, header_rows: usize) -> Self {
        let mut lines = lines_with_endings(text).map(str::to_string);
        let header: Vec<String> = lines.by_ref().take(header_rows).collect();
        let body: Vec<String> = lines.collect();
        Self { header, body }
    }

    /// A document with this document's header and the given body.
    pub fn with_body(&self, body: Vec<String>) -> Self {
        Self { header: self.header.clone(), body }
    }

    pub fn total_lines(&self) -> usize {
        self.header.len() + self.body.len()
    }

    /// The line column names are read from.
    pub fn last_header_line(&self) -> Option<&str> {
        self.header.last().map(String::as_str)
    }

    /// Sample for dialect detection: the last header line, else the first body line.
    pub fn dialect_sample(&self) -> &str {
        self.last_header_line()
            .or_else(|| self.body.first().map(String::as_str))
            .unwrap_or("")
    }

    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(
            self.header.iter().chain(&self.body).map(String::len).sum(),
        );
        for line in self.header.iter().chain(&self.body) {
            out.push_str(line);
        }
        out
    }
}

/// Lines of `text` with their terminators attached.
///
/// `"\r\n"`, `"\n"` and a lone `"\r"` each end a line; a final line
/// without a terminator is yielded as is.
pub fn lines_with_endings(text: &str) -> impl Iterator<Item = &str> {
    let bytes = text.as_bytes();
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= bytes.len() {
            return None;
        }
        let mut end = start;
        while end < bytes.len() {
            match bytes[end] {
                b'\n' => {
                    end += 1;
                    break;
                }
                b'\r' => {
                    end += if bytes.get(end + 1) == Some(&b'\n') { 2 } else { 1 };
                    break;
                }
                _ => end += 1,
            }
        }
        let line = &text[start..end];
        start = end;
        Some(line)
    })
}

/// Split a line into its content and its terminator (`"\r\n"`, `"\n"`, `"\r"` or `""`).
pub fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(content) = line.strip_suffix("\r\n") {
        (content, "\r\n")
    } else if let Some(content) = line.strip_suffix('\n') {
        (content, "\n")
    } else if let Some(content) = line.strip_suffix('\r') {
        (content, "\r")
    } else {
        (line, "")
    }
}

/// Column name → position, resolved once from the last header line.
///
/// Names are trimmed and lower-cased; the first occurrence of a name wins.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    pub fn from_header(line: &str, dialect: &Dialect) -> Self {
        let names = dialect.parse_line(line).unwrap_or_default();
        let mut positions = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            positions.entry(normalize_name(name)).or_insert(i);
        }
        Self { names, positions }
    }

    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.positions.get(&normalize_name(name)).copied()
    }

    /// First alias that resolves, in priority order.
    pub fn resolve_any<S: AsRef<str>>(&self, aliases: &[S]) -> Option<usize> {
        aliases.iter().find_map(|a| self.resolve(a.as_ref()))
    }

    /// Column names as they appear in the header.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Read file and decode it as UTF-8, stripping a byte-order mark.
///
/// Invalid sequences are replaced rather than rejected so that a damaged
/// export still passes through the pipeline.
pub fn read_text(path: &Path) -> Result<String, IoError> {
    let bytes = std::fs::read(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let (decoded, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    if had_errors {
        tracing::warn!(path = %path.display(), "invalid UTF-8, decoding lossily");
    }
    Ok(decoded.into_owned())
}

/// One loaded input file: its document, dialect and column index.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub document: Document,
    pub dialect: Dialect,
    pub columns: ColumnIndex,
}

impl SourceFile {
    pub fn load(path: &Path, header_rows: usize) -> Result<Self, IoError> {
        let text = read_text(path)?;
        Ok(Self::from_text(path, &text, header_rows))
    }

    pub fn from_text(path: &Path, text: &str, header_rows: usize) -> Self {
        let document = Document::split(text, header_rows);
        let dialect = Dialect::detect(document.dialect_sample());
        let columns = document
            .last_header_line()
            .map(|line| ColumnIndex::from_header(line, &dialect))
            .unwrap_or_default();

        tracing::debug!(
            path = %path.display(),
            delimiter = dialect.delimiter_name(),
            header_lines = document.header.len(),
            body_lines = document.body.len(),
            columns = columns.names().len(),
            "loaded source file"
        );

        Self {
            path: path.to_path_buf(),
            document,
            dialect,
            columns,
        }
    }

    /// Header column names, for error reports.
    pub fn header_names(&self) -> Vec<String> {
        self.columns.names().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn split_counts_add_up() {
        let text = "title\nA,B\n1,2\n3,4";
        for header_rows in 0..6 {
            let doc = Document::split(text, header_rows);
            assert_eq!(doc.total_lines(), 4);
            assert_eq!(doc.header.len(), header_rows.min(4));
        }
    }

    #[test]
    fn split_preserves_bytes() {
        let text = "export 2025-07-28\r\nDocNum,ItemCode\r\nD1,SKU1\nD2,SKU2";
        let doc = Document::split(text, 2);
        assert_eq!(doc.header, vec!["export 2025-07-28\r\n", "DocNum,ItemCode\r\n"]);
        assert_eq!(doc.body, vec!["D1,SKU1\n", "D2,SKU2"]);
        assert_eq!(doc.to_text(), text);
    }

    #[test]
    fn lone_carriage_return_ends_a_line() {
        let text = "h\rDocNum,X\rD1,a\r";
        let doc = Document::split(text, 2);
        assert_eq!(doc.header, vec!["h\r", "DocNum,X\r"]);
        assert_eq!(doc.body, vec!["D1,a\r"]);
        assert_eq!(doc.to_text(), text);

        let mixed: Vec<&str> = lines_with_endings("a\r\nb\rc\n\r\nd").collect();
        assert_eq!(mixed, vec!["a\r\n", "b\r", "c\n", "\r\n", "d"]);
    }

    #[test]
    fn cr_only_export_resolves_columns() {
        let source = SourceFile::from_text(Path::new("sap1.txt"), "h\rDocNum,X\rD1,a\r", 2);
        assert_eq!(source.dialect.delimiter, b',');
        assert_eq!(source.columns.resolve("DocNum"), Some(0));
        assert_eq!(source.dialect.field(&source.document.body[0], 1).as_deref(), Some("a"));
    }

    #[test]
    fn sample_prefers_last_header_line() {
        let doc = Document::split("x\nA|B\n1|2\n", 2);
        assert_eq!(doc.dialect_sample(), "A|B\n");
        let doc = Document::split("1|2\n", 0);
        assert_eq!(doc.dialect_sample(), "1|2\n");
        assert_eq!(Document::split("", 2).dialect_sample(), "");
    }

    #[test]
    fn line_endings() {
        assert_eq!(split_line_ending("a,b\r\n"), ("a,b", "\r\n"));
        assert_eq!(split_line_ending("a,b\n"), ("a,b", "\n"));
        assert_eq!(split_line_ending("a,b"), ("a,b", ""));
    }

    #[test]
    fn column_lookup_is_case_and_space_insensitive() {
        let d = Dialect::detect("x,y\n");
        let cols = ColumnIndex::from_header(" DocNum ,ITEMCODE,Code,docnum\n", &d);
        assert_eq!(cols.resolve("docnum"), Some(0));
        assert_eq!(cols.resolve("ItemCode "), Some(1));
        assert_eq!(cols.resolve_any(&["sku", "code"]), Some(2));
        assert_eq!(cols.resolve_any(&["itemcode", "code"]), Some(1));
        assert_eq!(cols.resolve("gtotal"), None);
        assert_eq!(cols.names().len(), 4);
    }

    #[test]
    fn read_text_strips_bom() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sap1.txt");
        fs::write(&path, b"\xEF\xBB\xBFDocNum\tItemCode\n").unwrap();
        assert_eq!(read_text(&path).unwrap(), "DocNum\tItemCode\n");
    }

    #[test]
    fn read_text_tolerates_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sap1.txt");
        fs::write(&path, b"DocNum\n\xFFD1\n").unwrap();
        let text = read_text(&path).unwrap();
        assert!(text.starts_with("DocNum\n"));
        assert!(text.ends_with("D1\n"));
    }

    #[test]
    fn read_text_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let err = read_text(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, IoError::Read { .. }));
    }

    #[test]
    fn source_file_uses_one_dialect() {
        let text = "SAP export\nDocNum;ItemCode;Quantity\nD1;SKU1;3\n";
        let src = SourceFile::from_text(Path::new("sap2.txt"), text, 2);
        assert_eq!(src.dialect.delimiter, b';');
        assert_eq!(src.columns.resolve("quantity"), Some(2));
        assert_eq!(src.dialect.field(&src.document.body[0], 1).as_deref(), Some("SKU1"));
    }
}
