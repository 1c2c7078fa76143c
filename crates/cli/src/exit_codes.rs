//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `saprecon` exit codes.
//! Callers (schedulers, folder watchers) branch on them, so they are stable.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 2    | Usage error (bad arguments, unreadable config path)  |
//! | 3    | Config parse or validation error                     |
//! | 4    | No input file matches a configured pattern           |
//! | 5    | Mandatory column missing (DocNum, price columns)     |
//! | 6    | I/O failure (read, write, replace, price table)      |

use saprecon_recon::ReconError;

/// Command completed; every output was written.
pub const EXIT_SUCCESS: u8 = 0;

/// Bad arguments or an option that cannot be used.
pub const EXIT_USAGE: u8 = 2;

/// Config file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Primary or secondary export not found in the folder.
pub const EXIT_MISSING_INPUT: u8 = 4;

/// A file lacks a column its stage cannot run without.
/// Nothing is written for that stage.
pub const EXIT_MISSING_COLUMNS: u8 = 5;

/// Reading inputs, loading the price table, or writing outputs failed.
pub const EXIT_IO: u8 = 6;

/// Map a library error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
        ReconError::MissingInput { .. } => EXIT_MISSING_INPUT,
        ReconError::MissingColumns { .. } => EXIT_MISSING_COLUMNS,
        ReconError::SecondaryNotUpdated { .. } | ReconError::Io(_) => EXIT_IO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saprecon_io::IoError;
    use std::path::PathBuf;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_USAGE,
            EXIT_INVALID_CONFIG,
            EXIT_MISSING_INPUT,
            EXIT_MISSING_COLUMNS,
            EXIT_IO,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }

    #[test]
    fn errors_map_to_codes() {
        let missing = ReconError::MissingColumns {
            path: PathBuf::from("sap2.txt"),
            stage: "enrich",
            missing: vec!["gpbefdisc".into()],
            header: vec![],
        };
        assert_eq!(recon_exit_code(&missing), EXIT_MISSING_COLUMNS);
        assert_eq!(recon_exit_code(&ReconError::ConfigParse("x".into())), EXIT_INVALID_CONFIG);
        let exists = ReconError::Io(IoError::Exists { path: PathBuf::from("a") });
        assert_eq!(recon_exit_code(&exists), EXIT_IO);
    }
}
