// Duplicate DocNum detection and renumbering

use std::collections::HashMap;

use saprecon_io::{split_line_ending, Dialect, Document};
use serde::Serialize;

use crate::partition::trimmed_field;

#[derive(Debug, Clone)]
pub struct DuplicateReport {
    /// Header + every row whose DocNum occurs more than once, in file order.
    pub document: Document,
    pub distinct_keys: usize,
    pub duplicated_keys: usize,
}

/// Collect rows sharing a DocNum. Rows with an empty or unreadable key are ignored.
pub fn find_duplicates(doc: &Document, dialect: &Dialect, key_column: usize) -> DuplicateReport {
    let keys: Vec<Option<String>> = doc
        .body
        .iter()
        .map(|line| trimmed_field(dialect, line, key_column).filter(|k| !k.is_empty()))
        .collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for key in keys.iter().flatten() {
        *counts.entry(key.as_str()).or_default() += 1;
    }

    let rows: Vec<String> = doc
        .body
        .iter()
        .zip(&keys)
        .enumerate()
        .filter_map(|(i, (line, key))| {
            let key = key.as_deref()?;
            if counts.get(key).copied().unwrap_or(0) < 2 {
                return None;
            }
            tracing::debug!(line = doc.header.len() + i + 1, doc_num = key, "duplicate DocNum");
            Some(line.clone())
        })
        .collect();

    DuplicateReport {
        document: doc.with_body(rows),
        distinct_keys: counts.len(),
        duplicated_keys: counts.values().filter(|&&n| n > 1).count(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Renumbering {
    /// 1-based line number in the file.
    pub line: usize,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct Renumbered {
    pub document: Document,
    pub changes: Vec<Renumbering>,
}

/// Give the k-th repeat of a DocNum a new value: `n + k` for integers,
/// `value_k` otherwise. First occurrences and rows without a key are untouched.
pub fn renumber_duplicates(doc: &Document, dialect: &Dialect, key_column: usize) -> Renumbered {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut changes = Vec::new();
    let mut body = Vec::with_capacity(doc.body.len());

    for (i, line) in doc.body.iter().enumerate() {
        let (content, ending) = split_line_ending(line);
        let Some(mut fields) = dialect.parse_line(content) else {
            body.push(line.clone());
            continue;
        };
        let Some(key) = fields.get(key_column).map(|v| v.trim().to_string()) else {
            body.push(line.clone());
            continue;
        };
        if key.is_empty() {
            body.push(line.clone());
            continue;
        }

        let repeat = {
            let n = seen.entry(key.clone()).or_default();
            *n += 1;
            *n - 1
        };
        if repeat == 0 {
            body.push(line.clone());
            continue;
        }

        let renamed = next_doc_num(&key, repeat);
        fields[key_column] = renamed.clone();
        match dialect.render_line(&fields, ending) {
            Some(rendered) => {
                tracing::info!(from = %key, to = %renamed, "renumbered DocNum");
                changes.push(Renumbering {
                    line: doc.header.len() + i + 1,
                    from: key,
                    to: renamed,
                });
                body.push(rendered);
            }
            None => {
                tracing::warn!(doc_num = %key, "cannot render renumbered row, kept original");
                body.push(line.clone());
            }
        }
    }

    Renumbered {
        document: doc.with_body(body),
        changes,
    }
}

fn next_doc_num(key: &str, repeat: usize) -> String {
    key.parse::<i64>()
        .ok()
        .zip(i64::try_from(repeat).ok())
        .and_then(|(n, k)| n.checked_add(k))
        .map(|n| n.to_string())
        .unwrap_or_else(|| format!("{key}_{repeat}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(text: &str) -> (Document, Dialect) {
        let doc = Document::split(text, 2);
        let dialect = Dialect::detect(doc.dialect_sample());
        (doc, dialect)
    }

    const FILE: &str = "Edit\nDocNum\tItemCode\n100\tA\n200\tB\n100\tC\nX7\tD\n100 \tE\nX7\tF\n\tG\n";

    #[test]
    fn finds_rows_with_repeated_keys() {
        let (doc, dialect) = load(FILE);
        let report = find_duplicates(&doc, &dialect, 0);

        assert_eq!(report.distinct_keys, 3);
        assert_eq!(report.duplicated_keys, 2);
        assert_eq!(
            report.document.body,
            vec!["100\tA\n", "100\tC\n", "X7\tD\n", "100 \tE\n", "X7\tF\n"]
        );
        assert_eq!(report.document.header, doc.header);
    }

    #[test]
    fn renumbers_repeats() {
        let (doc, dialect) = load(FILE);
        let out = renumber_duplicates(&doc, &dialect, 0);

        assert_eq!(
            out.document.body,
            vec!["100\tA\n", "200\tB\n", "101\tC\n", "X7\tD\n", "102\tE\n", "X7_1\tF\n", "\tG\n"]
        );
        let moved: Vec<(&str, &str)> = out
            .changes
            .iter()
            .map(|c| (c.from.as_str(), c.to.as_str()))
            .collect();
        assert_eq!(moved, vec![("100", "101"), ("100", "102"), ("X7", "X7_1")]);
        assert_eq!(out.changes[0].line, 5);
    }

    #[test]
    fn overflow_falls_back_to_suffix() {
        assert_eq!(next_doc_num(&i64::MAX.to_string(), 1), format!("{}_1", i64::MAX));
        assert_eq!(next_doc_num("-3", 2), "-1");
    }
}
