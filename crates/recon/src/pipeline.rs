// Folder pipeline: read → partition → match → enrich → write

use std::fs;
use std::path::{Path, PathBuf};

use saprecon_io::{replace_in_place, write_new, Existing, IoError, PriceLookup, SourceFile};

use crate::config::PipelineConfig;
use crate::enrich::{EnrichColumns, Enricher, Scope};
use crate::error::ReconError;
use crate::matcher::match_keys;
use crate::model::{EnrichSummary, KeywordSummary, MatchSummary, RunMeta, RunSummary};
use crate::partition::partition;

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// First file in `folder` (sorted by name) whose name matches `pattern`.
pub fn find_input(folder: &Path, pattern: &str) -> Result<PathBuf, ReconError> {
    let glob = glob::Pattern::new(pattern).map_err(|e| {
        ReconError::ConfigValidation(format!("invalid file pattern {pattern:?}: {e}"))
    })?;
    let match_opts = glob::MatchOptions {
        case_sensitive: false,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let entries = fs::read_dir(folder).map_err(|source| IoError::Read {
        path: folder.to_path_buf(),
        source,
    })?;

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| glob.matches_with(name, match_opts))
        })
        .collect();
    candidates.sort();

    let first = candidates.into_iter().next().ok_or_else(|| ReconError::MissingInput {
        folder: folder.to_path_buf(),
        pattern: pattern.to_string(),
    })?;
    tracing::debug!(pattern, path = %first.display(), "input selected");
    Ok(first)
}

/// Position of the DocNum column, or the fatal error for `stage`.
pub fn require_doc_num(
    source: &SourceFile,
    config: &PipelineConfig,
    stage: &'static str,
) -> Result<usize, ReconError> {
    source
        .columns
        .resolve_any(config.columns.doc_num.as_slice())
        .ok_or_else(|| ReconError::MissingColumns {
            path: source.path.clone(),
            stage,
            missing: vec![config.columns.doc_num.join("/")],
            header: source.header_names(),
        })
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Reconcile the primary/secondary pair found in `folder`.
///
/// Without a lookup only the four split documents are written. With one, the
/// secondary file must carry every price column and a DocNum column; both are
/// checked before anything is written.
///
/// The four splits are written before the secondary file is replaced. If the
/// replace fails they stay on disk next to the unchanged secondary file and
/// the error is [`ReconError::SecondaryNotUpdated`].
pub fn run_folder(
    folder: &Path,
    config: &PipelineConfig,
    lookup: Option<&PriceLookup>,
) -> Result<RunSummary, ReconError> {
    let primary_path = find_input(folder, &config.files.primary)?;
    let secondary_path = find_input(folder, &config.files.secondary)?;
    let primary = SourceFile::load(&primary_path, config.header_rows)?;
    let secondary = SourceFile::load(&secondary_path, config.header_rows)?;

    let enrich_plan = match lookup {
        Some(lookup) => {
            let columns = EnrichColumns::resolve(&secondary.columns, &config.columns).map_err(
                |missing| ReconError::MissingColumns {
                    path: secondary.path.clone(),
                    stage: "enrich",
                    missing,
                    header: secondary.header_names(),
                },
            )?;
            let doc_num = require_doc_num(&secondary, config, "enrich")?;
            let enricher = Enricher::new(&secondary.dialect, columns, lookup, &config.enrich.promo_marker)
                .map_err(|e| ReconError::ConfigValidation(format!("enrich.promo_marker: {e}")))?;
            Some((enricher, doc_num, lookup.len()))
        }
        None => None,
    };

    // Keyword split of the primary file
    let marker = config.marker();
    let primary_key = primary.columns.resolve_any(config.columns.doc_num.as_slice());
    let split = partition(&primary.document, &primary.dialect, primary_key, &marker);
    tracing::info!(
        path = %primary.path.display(),
        occurrences = split.occurrences,
        matched = split.matched.body.len(),
        doc_nums = split.keys.len(),
        "keyword partition"
    );

    // Cross-file match of the secondary file
    let secondary_key = secondary.columns.resolve_any(config.columns.doc_num.as_slice());
    let mut cross = match_keys(&secondary.document, &secondary.dialect, secondary_key, &split.keys);

    let mut matched_rows_updated = 0;
    if let Some((enricher, _, _)) = &enrich_plan {
        let enriched = enricher.enrich(&cross.matched.body, Scope::All);
        matched_rows_updated = enriched.updated;
        cross.matched.body = enriched.lines;
    }

    // Derivative outputs
    let out_dir = folder.join(&config.files.output_dir);
    let existing = if config.files.overwrite_outputs {
        Existing::Replace
    } else {
        Existing::Refuse
    };
    let names = &config.outputs;
    let mut outputs = Vec::new();
    for (name, doc) in [
        (&names.primary_matched, &split.matched),
        (&names.primary_unmatched, &split.unmatched),
        (&names.secondary_matched, &cross.matched),
        (&names.secondary_unmatched, &cross.unmatched),
    ] {
        let path = out_dir.join(name);
        write_new(&path, &doc.to_text(), existing)?;
        tracing::debug!(path = %path.display(), lines = doc.total_lines(), "wrote output");
        outputs.push(path);
    }

    // Secondary file update
    let enrichment = match &enrich_plan {
        Some((enricher, doc_num, lookup_items)) => {
            let updated = enricher.enrich(
                &secondary.document.body,
                Scope::KeysIn {
                    column: *doc_num,
                    keys: &split.keys,
                },
            );
            let text = secondary.document.with_body(updated.lines).to_text();

            let (secondary_output, backup) = if config.enrich.in_place {
                let outcome = replace_in_place(&secondary.path, &text, &config.enrich.replace_options())
                    .map_err(|source| ReconError::SecondaryNotUpdated {
                        target: secondary.path.clone(),
                        written: outputs.clone(),
                        source,
                    })?;
                (outcome.target, outcome.backup)
            } else {
                let path = out_dir.join(&names.updated_secondary);
                write_new(&path, &text, existing)?;
                outputs.push(path.clone());
                (path, None)
            };
            tracing::info!(
                path = %secondary_output.display(),
                rows = updated.updated,
                in_place = config.enrich.in_place,
                "secondary file enriched"
            );

            Some(EnrichSummary {
                lookup_items: *lookup_items,
                matched_rows_updated,
                secondary_rows_updated: updated.updated,
                in_place: config.enrich.in_place,
                secondary_output,
                backup,
            })
        }
        None => None,
    };

    Ok(RunSummary {
        meta: RunMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        folder: folder.to_path_buf(),
        keyword: KeywordSummary {
            source: primary.path.clone(),
            delimiter: primary.dialect.delimiter_name(),
            marker: config.marker.text.clone(),
            occurrences: split.occurrences,
            matched_lines: split.matched.body.len(),
            unmatched_lines: split.unmatched.body.len(),
            doc_nums: split.keys,
        },
        cross_file: MatchSummary {
            source: secondary.path.clone(),
            delimiter: secondary.dialect.delimiter_name(),
            key_column_resolved: cross.key_column_resolved,
            matched_lines: cross.matched.body.len(),
            unmatched_lines: cross.unmatched.body.len(),
        },
        enrichment,
        outputs,
    })
}
