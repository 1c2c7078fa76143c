//! `saprecon dupes` and `saprecon renumber`.

use std::io::{self, Write};
use std::path::Path;

use saprecon_io::{write_new, Existing, SourceFile};
use saprecon_recon::{find_duplicates, renumber_duplicates, require_doc_num, PipelineConfig};

use crate::exit_codes::EXIT_IO;
use crate::CliError;

fn load(config: &PipelineConfig, file: &Path, stage: &'static str) -> Result<(SourceFile, usize), CliError> {
    if !file.is_file() {
        return Err(CliError::args(format!("file not found: {}", file.display())));
    }
    let source = SourceFile::load(file, config.header_rows)?;
    let doc_num = require_doc_num(&source, config, stage)?;
    Ok((source, doc_num))
}

pub fn cmd_dupes(config: &PipelineConfig, file: &Path, output: Option<&Path>) -> Result<(), CliError> {
    let (source, doc_num) = load(config, file, "dupes")?;
    let report = find_duplicates(&source.document, &source.dialect, doc_num);
    let text = report.document.to_text();

    match output {
        Some(path) => {
            write_new(path, &text, Existing::Replace)?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            io::stdout()
                .lock()
                .write_all(text.as_bytes())
                .map_err(|e| CliError { code: EXIT_IO, message: e.to_string(), hint: None })?;
        }
    }

    eprintln!(
        "{} data row(s), {} distinct DocNum(s), {} duplicated, {} row(s) extracted",
        source.document.body.len(),
        report.distinct_keys,
        report.duplicated_keys,
        report.document.body.len(),
    );
    Ok(())
}

pub fn cmd_renumber(config: &PipelineConfig, file: &Path, output: &Path) -> Result<(), CliError> {
    if output == file {
        return Err(CliError::args("--output must differ from the input file")
            .with_hint("renumber writes a new file; keep the original for comparison"));
    }
    let (source, doc_num) = load(config, file, "renumber")?;
    let renumbered = renumber_duplicates(&source.document, &source.dialect, doc_num);

    write_new(output, &renumbered.document.to_text(), Existing::Replace)?;
    for change in &renumbered.changes {
        eprintln!("line {}: {} -> {}", change.line, change.from, change.to);
    }
    eprintln!("{} DocNum(s) changed, wrote {}", renumbered.changes.len(), output.display());
    Ok(())
}
