use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Join keys
// ---------------------------------------------------------------------------

/// Distinct, trimmed, non-empty DocNum values in first-seen order.
///
/// Built once by the partitioner and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinKeySet {
    order: Vec<String>,
    members: HashSet<String>,
}

impl JoinKeySet {
    /// Returns false for empty values and for keys already present.
    pub(crate) fn insert(&mut self, raw: &str) -> bool {
        let key = raw.trim();
        if key.is_empty() || self.members.contains(key) {
            return false;
        }
        self.members.insert(key.to_string());
        self.order.push(key.to_string());
        true
    }

    /// Exact membership; `key` is compared as given (callers trim).
    pub fn contains(&self, key: &str) -> bool {
        self.members.contains(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for JoinKeySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut keys = Self::default();
        for key in iter {
            keys.insert(key.as_ref());
        }
        keys
    }
}

impl Serialize for JoinKeySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.order.serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordSummary {
    pub source: PathBuf,
    pub delimiter: &'static str,
    pub marker: String,
    /// Total marker occurrences across flagged lines (a line can count twice).
    pub occurrences: usize,
    pub matched_lines: usize,
    pub unmatched_lines: usize,
    pub doc_nums: JoinKeySet,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchSummary {
    pub source: PathBuf,
    pub delimiter: &'static str,
    pub key_column_resolved: bool,
    pub matched_lines: usize,
    pub unmatched_lines: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrichSummary {
    pub lookup_items: usize,
    /// Rows repriced in the cross-file matched output.
    pub matched_rows_updated: usize,
    /// Rows repriced in the secondary file itself.
    pub secondary_rows_updated: usize,
    pub in_place: bool,
    pub secondary_output: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub meta: RunMeta,
    pub folder: PathBuf,
    pub keyword: KeywordSummary,
    pub cross_file: MatchSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichSummary>,
    /// Every derivative file written, in write order.
    pub outputs: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_trimmed_distinct_and_ordered() {
        let keys: JoinKeySet = [" D002", "D001", "", "  ", "D002 ", "D003"].into_iter().collect();
        assert_eq!(keys.iter().collect::<Vec<_>>(), vec!["D002", "D001", "D003"]);
        assert!(keys.contains("D001"));
        assert!(!keys.contains(" D001"));
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn keys_serialize_as_list() {
        let keys: JoinKeySet = ["B", "A"].into_iter().collect();
        assert_eq!(serde_json::to_string(&keys).unwrap(), r#"["B","A"]"#);
    }
}
