// Master price table (item code -> price)

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::IoError;
use crate::numeric::parse_number;

/// Where the code and price live in a master table, and how to decode it.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LookupSource {
    pub code_column: String,
    pub price_column: String,
    /// WHATWG encoding labels tried in order for delimited text masters.
    pub encodings: Vec<String>,
}

impl Default for LookupSource {
    fn default() -> Self {
        Self {
            code_column: "code".into(),
            price_column: "msrp".into(),
            encodings: vec!["utf-8".into(), "windows-874".into(), "windows-1252".into()],
        }
    }
}

impl LookupSource {
    /// Labels that `encoding_rs` does not know.
    pub fn unknown_encodings(&self) -> Vec<&str> {
        self.encodings
            .iter()
            .map(String::as_str)
            .filter(|label| Encoding::for_label(label.as_bytes()).is_none())
            .collect()
    }
}

/// Immutable snapshot of normalized item code → price.
#[derive(Debug, Clone, Default)]
pub struct PriceLookup {
    prices: HashMap<String, f64>,
}

impl PriceLookup {
    /// Trimmed, upper-cased form used for every key and every query.
    pub fn normalize_code(code: &str) -> String {
        code.trim().to_uppercase()
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.prices.get(&Self::normalize_code(code)).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Load a master table. Spreadsheets go through calamine, `.csv`/`.txt`
    /// through the encoding list. An empty result is an error.
    pub fn load(path: &Path, source: &LookupSource) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        let lookup = match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => load_spreadsheet(path, source)?,
            "csv" | "txt" | "tsv" => load_delimited(path, source)?,
            other => {
                return Err(IoError::lookup(path, format!("unsupported file type '.{other}'")));
            }
        };

        if lookup.is_empty() {
            return Err(IoError::lookup(path, "no usable code/price rows"));
        }

        tracing::info!(path = %path.display(), items = lookup.len(), "loaded price table");
        Ok(lookup)
    }

    fn insert_row(&mut self, code: &str, price: Option<f64>) -> bool {
        let code = Self::normalize_code(code);
        match price {
            Some(price) if !code.is_empty() => {
                self.prices.insert(code, price);
                true
            }
            _ => false,
        }
    }
}

impl<K: AsRef<str>> FromIterator<(K, f64)> for PriceLookup {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut lookup = Self::default();
        for (code, price) in iter {
            lookup.insert_row(code.as_ref(), Some(price));
        }
        lookup
    }
}

fn resolve_columns(
    path: &Path,
    header: &[String],
    source: &LookupSource,
) -> Result<(usize, usize), IoError> {
    let find = |want: &str| {
        let want = want.trim().to_lowercase();
        header.iter().position(|h| h.trim().to_lowercase() == want)
    };
    match (find(&source.code_column), find(&source.price_column)) {
        (Some(code), Some(price)) => Ok((code, price)),
        _ => Err(IoError::lookup(
            path,
            format!(
                "missing column '{}' or '{}' (columns: {})",
                source.code_column,
                source.price_column,
                header.join(", ")
            ),
        )),
    }
}

/// First encoding in `labels` that decodes `bytes` without replacement.
fn decode_first(bytes: &[u8], labels: &[String]) -> Option<(String, &'static str)> {
    for label in labels {
        let Some(encoding) = Encoding::for_label(label.as_bytes()) else {
            tracing::warn!(label = %label, "unknown encoding label, skipped");
            continue;
        };
        let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
        if !had_errors {
            return Some((text.into_owned(), encoding.name()));
        }
        tracing::debug!(encoding = encoding.name(), "price table does not decode");
    }
    None
}

fn load_delimited(path: &Path, source: &LookupSource) -> Result<PriceLookup, IoError> {
    let bytes = std::fs::read(path).map_err(|e| IoError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let (text, encoding) = decode_first(&bytes, &source.encodings).ok_or_else(|| {
        IoError::lookup(
            path,
            format!("none of [{}] decodes the file", source.encodings.join(", ")),
        )
    })?;
    tracing::debug!(path = %path.display(), encoding, "decoded price table");

    let dialect = Dialect::detect(text.lines().next().unwrap_or(""));
    let mut reader = dialect.reader_builder().from_reader(text.as_bytes());
    let mut records = reader.records();

    let header: Vec<String> = match records.next() {
        Some(Ok(record)) => record.iter().map(str::to_string).collect(),
        _ => return Err(IoError::lookup(path, "no header row")),
    };
    let (code_idx, price_idx) = resolve_columns(path, &header, source)?;

    let mut lookup = PriceLookup::default();
    let mut skipped = 0usize;
    for record in records {
        let Ok(record) = record else {
            skipped += 1;
            continue;
        };
        let code = record.get(code_idx).unwrap_or("");
        let price = record.get(price_idx).and_then(parse_number);
        if !lookup.insert_row(code, price) {
            skipped += 1;
        }
    }

    if skipped > 0 {
        tracing::debug!(skipped, "price table rows without code or price");
    }
    Ok(lookup)
}

fn load_spreadsheet(path: &Path, source: &LookupSource) -> Result<PriceLookup, IoError> {
    let spreadsheet_err = |message: String| IoError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| spreadsheet_err(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| spreadsheet_err("workbook has no sheets".into()))?
        .map_err(|e| spreadsheet_err(e.to_string()))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(cell_text).collect())
        .ok_or_else(|| IoError::lookup(path, "first sheet is empty"))?;
    let (code_idx, price_idx) = resolve_columns(path, &header, source)?;

    let mut lookup = PriceLookup::default();
    for row in rows {
        let code = row.get(code_idx).map(cell_text).unwrap_or_default();
        let price = row.get(price_idx).and_then(cell_number);
        lookup.insert_row(&code, price);
    }
    Ok(lookup)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        // Integral codes stored as numbers: "1001", not "1001.0"
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
        other => other.to_string(),
    }
}

fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(n) if n.is_finite() => Some(*n),
        Data::Int(n) => Some(*n as f64),
        Data::String(s) => parse_number(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn codes_are_normalized() {
        let lookup: PriceLookup = [(" sku1 ", 10.0), ("Sku2", 5.5)].into_iter().collect();
        assert_eq!(lookup.get("SKU1"), Some(10.0));
        assert_eq!(lookup.get("sku2 "), Some(5.5));
        assert_eq!(lookup.get("SKU3"), None);
        assert_eq!(lookup.len(), 2);
    }

    #[test]
    fn loads_csv_case_insensitively() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("MasterData.csv");
        fs::write(&path, "Code,Name,MSRP\nsku1,Widget,\"1,250.00\"\nsku2,Gadget,\n,Blank,3\nsku1,Widget,99\n")
            .unwrap();

        let lookup = PriceLookup::load(&path, &LookupSource::default()).unwrap();
        // sku2 has no price and the blank code is skipped; the later sku1 wins
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.get("SKU1"), Some(99.0));
    }

    #[test]
    fn falls_through_encoding_list() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("master.txt");
        // "สินค้า" encoded as TIS-620 / windows-874; not valid UTF-8
        let mut bytes = b"code\tname\tmsrp\nA1\t".to_vec();
        bytes.extend_from_slice(&[0xCA, 0xD4, 0xB9, 0xA4, 0xE9, 0xD2]);
        bytes.extend_from_slice(b"\t42\n");
        fs::write(&path, bytes).unwrap();

        let lookup = PriceLookup::load(&path, &LookupSource::default()).unwrap();
        assert_eq!(lookup.get("a1"), Some(42.0));
    }

    #[test]
    fn missing_columns_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("master.csv");
        fs::write(&path, "sku,price\nA,1\n").unwrap();
        let err = PriceLookup::load(&path, &LookupSource::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'code'"), "{msg}");
        assert!(msg.contains("sku, price"), "{msg}");
    }

    #[test]
    fn empty_table_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("master.csv");
        fs::write(&path, "code,msrp\nA,n/a\n").unwrap();
        assert!(matches!(
            PriceLookup::load(&path, &LookupSource::default()),
            Err(IoError::Lookup { .. })
        ));
    }

    #[test]
    fn unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("master.json");
        fs::write(&path, "{}").unwrap();
        let err = PriceLookup::load(&path, &LookupSource::default()).unwrap_err();
        assert!(err.to_string().contains(".json"));
    }

    #[test]
    fn unknown_labels_are_listed() {
        let source = LookupSource {
            encodings: vec!["utf-8".into(), "tis-620".into(), "klingon".into()],
            ..LookupSource::default()
        };
        assert_eq!(source.unknown_encodings(), vec!["klingon"]);
    }

    #[test]
    fn spreadsheet_cells() {
        assert_eq!(cell_text(&Data::Float(1001.0)), "1001");
        assert_eq!(cell_text(&Data::String("SKU1".into())), "SKU1");
        assert_eq!(cell_number(&Data::Float(12.5)), Some(12.5));
        assert_eq!(cell_number(&Data::String("฿1,000".into())), Some(1000.0));
        assert_eq!(cell_number(&Data::Empty), None);
    }
}
