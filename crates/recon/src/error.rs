use std::path::PathBuf;

use saprecon_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty marker, unknown encoding, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// No input file matches the configured glob.
    #[error("no file matching '{pattern}' in {}", folder.display())]
    MissingInput { folder: PathBuf, pattern: String },
    /// Columns a stage cannot run without. Nothing is written for that stage.
    #[error(
        "{stage}: {} is missing column(s) {} (header: {})",
        path.display(),
        missing.join(", "),
        header.join(", ")
    )]
    MissingColumns {
        path: PathBuf,
        stage: &'static str,
        missing: Vec<String>,
        header: Vec<String>,
    },
    /// The in-place replace failed after the split outputs were written.
    /// The secondary file keeps its previous content.
    #[error(
        "{} was not updated: {source} ({} output(s) already written)",
        target.display(),
        written.len()
    )]
    SecondaryNotUpdated {
        target: PathBuf,
        written: Vec<PathBuf>,
        #[source]
        source: IoError,
    },
    #[error(transparent)]
    Io(#[from] IoError),
}
