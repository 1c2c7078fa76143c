use saprecon_io::{Dialect, Document};

use crate::model::JoinKeySet;

/// The negative-discount indicator and how it is compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    needle: String,
    case_sensitive: bool,
}

impl Marker {
    pub fn new(text: &str, case_sensitive: bool) -> Self {
        let needle = if case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        };
        Self {
            needle,
            case_sensitive,
        }
    }

    /// Non-overlapping occurrences in `line`. An empty marker never matches.
    pub fn count_in(&self, line: &str) -> usize {
        if self.needle.is_empty() {
            return 0;
        }
        if self.case_sensitive {
            line.matches(self.needle.as_str()).count()
        } else {
            line.to_lowercase().matches(self.needle.as_str()).count()
        }
    }
}

/// Result of splitting a body on the marker.
#[derive(Debug, Clone)]
pub struct KeywordSplit {
    /// Header + lines containing the marker.
    pub matched: Document,
    /// Header + every other line.
    pub unmatched: Document,
    pub keys: JoinKeySet,
    pub occurrences: usize,
}

/// Trimmed value of column `col`, or `None` when the line has no such field.
pub(crate) fn trimmed_field(dialect: &Dialect, line: &str, col: usize) -> Option<String> {
    dialect.field(line, col).map(|v| v.trim().to_string())
}

/// Route every body line to matched/unmatched and collect DocNums of matched lines.
///
/// With no key column the split still happens; the key set just stays empty.
pub fn partition(
    doc: &Document,
    dialect: &Dialect,
    key_column: Option<usize>,
    marker: &Marker,
) -> KeywordSplit {
    let mut matched = Vec::new();
    let mut unmatched = Vec::new();
    let mut keys = JoinKeySet::default();
    let mut occurrences = 0usize;

    for (i, line) in doc.body.iter().enumerate() {
        let occ = marker.count_in(line);
        if occ == 0 {
            unmatched.push(line.clone());
            continue;
        }

        occurrences += occ;
        matched.push(line.clone());
        tracing::debug!(line = doc.header.len() + i + 1, occurrences = occ, "marker found");

        if let Some(value) = key_column.and_then(|col| trimmed_field(dialect, line, col)) {
            keys.insert(&value);
        }
    }

    if key_column.is_none() && !matched.is_empty() {
        tracing::warn!(
            flagged = matched.len(),
            "join key column not found, no document numbers collected"
        );
    }

    KeywordSplit {
        matched: doc.with_body(matched),
        unmatched: doc.with_body(unmatched),
        keys,
        occurrences,
    }
}
