use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    /// Input file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Output or temporary file could not be written.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The temporary file could not be renamed onto the target.
    #[error("cannot replace {} with {}: {source}", target.display(), temp.display())]
    Rename {
        temp: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A derivative output already exists and overwriting was not requested.
    #[error("refusing to overwrite existing output {}", path.display())]
    Exists { path: PathBuf },
    /// Price table unusable (no decodable encoding, missing columns, empty).
    #[error("price table {}: {reason}", path.display())]
    Lookup { path: PathBuf, reason: String },
    /// Spreadsheet price table could not be opened.
    #[error("spreadsheet {}: {message}", path.display())]
    Spreadsheet { path: PathBuf, message: String },
}

impl IoError {
    pub fn lookup(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::Lookup {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}
