use saprecon_io::{Dialect, Document};

use crate::model::JoinKeySet;
use crate::partition::trimmed_field;

/// Secondary file split on DocNum membership.
#[derive(Debug, Clone)]
pub struct KeyMatch {
    pub matched: Document,
    pub unmatched: Document,
    /// False when the join key column was not found; `matched` is then empty.
    pub key_column_resolved: bool,
}

/// Route each body line by whether its trimmed key field is in `keys`.
///
/// Keys are opaque: no case folding, no numeric normalisation.
pub fn match_keys(
    doc: &Document,
    dialect: &Dialect,
    key_column: Option<usize>,
    keys: &JoinKeySet,
) -> KeyMatch {
    let Some(col) = key_column else {
        tracing::warn!(
            lines = doc.body.len(),
            "join key column not found in secondary file, every row is unmatched"
        );
        return KeyMatch {
            matched: doc.with_body(Vec::new()),
            unmatched: doc.clone(),
            key_column_resolved: false,
        };
    };

    let (matched, unmatched): (Vec<String>, Vec<String>) =
        doc.body.iter().cloned().partition(|line| {
            trimmed_field(dialect, line, col).is_some_and(|v| keys.contains(&v))
        });

    tracing::info!(
        keys = keys.len(),
        matched = matched.len(),
        unmatched = unmatched.len(),
        "cross-file match"
    );

    KeyMatch {
        matched: doc.with_body(matched),
        unmatched: doc.with_body(unmatched),
        key_column_resolved: true,
    }
}
