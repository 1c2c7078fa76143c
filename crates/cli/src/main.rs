// saprecon CLI - negative-discount reconciliation of SAP export folders

mod docnum;
mod exit_codes;
mod logging;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use saprecon_io::IoError;
use saprecon_recon::{PipelineConfig, ReconError};

use exit_codes::{recon_exit_code, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "saprecon")]
#[command(about = "Flag negative-discount documents across SAP exports and reprice them")]
#[command(version)]
#[command(long_version = long_version())]
struct Cli {
    /// Pipeline config (TOML). Defaults apply when omitted.
    #[arg(long, short = 'c', global = true, env = "SAPRECON_CONFIG")]
    config: Option<PathBuf>,

    /// Header lines per export (overrides the config)
    #[arg(long, global = true, env = "SAPRECON_HEADER_ROWS")]
    header_rows: Option<usize>,

    /// Marker text (overrides the config)
    #[arg(long, global = true, env = "SAPRECON_KEYWORD")]
    keyword: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Errors only (wins over -v)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split, match and enrich the sap1/sap2 pair in a folder
    #[command(after_help = "\
Examples:
  saprecon run ./exports
  saprecon run ./exports --master msrp.xlsx
  saprecon run ./exports --master msrp.csv --no-in-place --json
  saprecon -c recon.toml run ./exports --output summary.json")]
    Run {
        /// Folder holding the primary and secondary exports
        folder: PathBuf,

        /// Master price table (.csv/.txt or spreadsheet). Without it only the splits are written.
        #[arg(long, short = 'm', env = "SAPRECON_MASTER")]
        master: Option<PathBuf>,

        /// Write the enriched secondary file under the output folder instead of replacing it
        #[arg(long)]
        no_in_place: bool,

        /// Print the run summary as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON run summary to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List rows whose DocNum occurs more than once
    #[command(after_help = "\
Examples:
  saprecon dupes minus_0/Edit_sap1.txt
  saprecon dupes minus_0/Edit_sap1.txt --output Double_DocNum.txt")]
    Dupes {
        file: PathBuf,

        /// Write header + duplicate rows here instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Give repeated DocNums distinct values (n+1, n+2, or value_1, value_2)
    #[command(after_help = "\
Examples:
  saprecon renumber minus_0/Edit_sap1.txt --output ChangDocNum.txt")]
    Renumber {
        file: PathBuf,

        #[arg(long, short = 'o')]
        output: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config,

    /// Check a config file without running
    Validate { config: PathBuf },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("SAPRECON_GIT_HASH"), ")",
        "\ntarget:  ", env!("SAPRECON_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose, cli.quiet) {
        eprintln!("warning: {e}");
    }

    let result = match &cli.command {
        Commands::Validate { config } => recon::cmd_validate(config),
        Commands::Config => effective_config(&cli).and_then(|config| recon::cmd_config(&config)),
        Commands::Run {
            folder,
            master,
            no_in_place,
            json,
            output,
        } => effective_config(&cli).and_then(|config| {
            recon::cmd_run(config, folder, master.as_deref(), *no_in_place, *json, output.as_deref())
        }),
        Commands::Dupes { file, output } => effective_config(&cli)
            .and_then(|config| docnum::cmd_dupes(&config, file, output.as_deref())),
        Commands::Renumber { file, output } => effective_config(&cli)
            .and_then(|config| docnum::cmd_renumber(&config, file, output)),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Config file (or defaults) with command-line overrides applied and re-validated.
fn effective_config(cli: &Cli) -> Result<PipelineConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            if !path.is_file() {
                return Err(CliError::args(format!("config file not found: {}", path.display())));
            }
            PipelineConfig::load(path)?
        }
        None => PipelineConfig::default(),
    };

    if let Some(rows) = cli.header_rows {
        config.header_rows = rows;
    }
    if let Some(keyword) = &cli.keyword {
        config.marker.text = keyword.clone();
    }
    config.validate()?;
    Ok(config)
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingInput { .. } => {
                Some("check files.primary / files.secondary in the config".to_string())
            }
            ReconError::MissingColumns { .. } => {
                Some("rename the header column or add its name under [columns]".to_string())
            }
            ReconError::SecondaryNotUpdated { written, .. } => Some(format!(
                "the split outputs were written ({}); fix the error and rerun to update the secondary file",
                written
                    .iter()
                    .filter_map(|p| p.file_name())
                    .map(|n| n.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            ReconError::Io(IoError::Exists { .. }) => {
                Some("set files.overwrite_outputs = true or clear the output folder".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        ReconError::Io(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::{EXIT_INVALID_CONFIG, EXIT_MISSING_INPUT};

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn overrides_are_validated() {
        let cli = Cli::parse_from(["saprecon", "--header-rows", "0", "config"]);
        let err = effective_config(&cli).unwrap_err();
        assert_eq!(err.code, EXIT_INVALID_CONFIG);

        let cli = Cli::parse_from(["saprecon", "--keyword", "NEG", "--header-rows", "3", "config"]);
        let config = effective_config(&cli).unwrap();
        assert_eq!(config.marker.text, "NEG");
        assert_eq!(config.header_rows, 3);
    }

    #[test]
    fn missing_input_has_hint() {
        let err: CliError = ReconError::MissingInput {
            folder: PathBuf::from("exports"),
            pattern: "sap1*.txt".into(),
        }
        .into();
        assert_eq!(err.code, EXIT_MISSING_INPUT);
        assert!(err.hint.is_some());
    }

    #[test]
    fn failed_replace_names_written_outputs() {
        let err: CliError = ReconError::SecondaryNotUpdated {
            target: PathBuf::from("exports/sap2.txt"),
            written: vec![PathBuf::from("exports/minus_0/sap1_only_negative.txt")],
            source: IoError::Exists { path: PathBuf::from("exports/sap2.txt.tmp") },
        }
        .into();
        assert_eq!(err.code, crate::exit_codes::EXIT_IO);
        assert!(err.message.contains("was not updated"));
        assert!(err.hint.unwrap().contains("sap1_only_negative.txt"));
    }
}
