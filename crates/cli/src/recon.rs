//! `saprecon run`, `config` and `validate`.

use std::path::Path;

use saprecon_io::PriceLookup;
use saprecon_recon::{run_folder, PipelineConfig, RunSummary};

use crate::exit_codes::{EXIT_INVALID_CONFIG, EXIT_IO};
use crate::CliError;

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

pub fn cmd_run(
    mut config: PipelineConfig,
    folder: &Path,
    master: Option<&Path>,
    no_in_place: bool,
    json_output: bool,
    output_file: Option<&Path>,
) -> Result<(), CliError> {
    if !folder.is_dir() {
        return Err(CliError::args(format!("not a folder: {}", folder.display())));
    }
    if no_in_place {
        config.enrich.in_place = false;
    }

    let lookup = match master {
        Some(path) => Some(PriceLookup::load(path, &config.lookup).map_err(|e| {
            CliError::from(e).with_hint(format!(
                "the price table needs '{}' and '{}' columns (see [lookup])",
                config.lookup.code_column, config.lookup.price_column
            ))
        })?),
        None => {
            tracing::info!("no master price table, enrichment skipped");
            None
        }
    };

    let summary = run_folder(folder, &config, lookup.as_ref())?;

    let json_str = serde_json::to_string_pretty(&summary)
        .map_err(|e| recon_err(EXIT_IO, format!("JSON serialization error: {e}")))?;

    if let Some(path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| recon_err(EXIT_IO, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    print_summary(&summary);
    Ok(())
}

/// Human summary to stderr.
fn print_summary(summary: &RunSummary) {
    let k = &summary.keyword;
    eprintln!(
        "{}: {} marker occurrence(s) on {} line(s), {} DocNum(s) flagged",
        k.source.display(),
        k.occurrences,
        k.matched_lines,
        k.doc_nums.len(),
    );

    let m = &summary.cross_file;
    if m.key_column_resolved {
        eprintln!(
            "{}: {} line(s) matched, {} unmatched",
            m.source.display(),
            m.matched_lines,
            m.unmatched_lines,
        );
    } else {
        eprintln!("{}: no DocNum column, nothing matched", m.source.display());
    }

    if let Some(e) = &summary.enrichment {
        eprintln!(
            "enrichment: {} price(s), {} matched row(s) and {} secondary row(s) repriced",
            e.lookup_items, e.matched_rows_updated, e.secondary_rows_updated,
        );
        match &e.backup {
            Some(backup) => eprintln!("replaced {} (backup {})", e.secondary_output.display(), backup.display()),
            None if e.in_place => eprintln!("replaced {} (no backup)", e.secondary_output.display()),
            None => eprintln!("wrote {}", e.secondary_output.display()),
        }
    }

    for path in &summary.outputs {
        eprintln!("wrote {}", path.display());
    }
}

pub fn cmd_config(config: &PipelineConfig) -> Result<(), CliError> {
    let text = config.to_toml()?;
    print!("{text}");
    Ok(())
}

pub fn cmd_validate(config_path: &Path) -> Result<(), CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::args(format!("cannot read config: {e}")))?;

    match PipelineConfig::from_toml(&config_str) {
        Ok(config) => {
            eprintln!(
                "valid: {} header row(s), marker '{}', {} -> {}",
                config.header_rows, config.marker.text, config.files.primary, config.files.secondary,
            );
            Ok(())
        }
        Err(e) => Err(recon_err(EXIT_INVALID_CONFIG, e.to_string())),
    }
}
