//! `saprecon-recon`: negative-discount reconciliation of SAP export pairs.
//!
//! Flags primary rows carrying the marker, carries their DocNums over to the
//! secondary file, and reprices matched rows from a master price table.
//! File reading and writing live in `saprecon-io`.

pub mod config;
pub mod duplicates;
pub mod enrich;
pub mod error;
pub mod matcher;
pub mod model;
pub mod partition;
pub mod pipeline;

pub use config::PipelineConfig;
pub use duplicates::{find_duplicates, renumber_duplicates, DuplicateReport, Renumbered};
pub use enrich::{EnrichColumns, Enricher, Enrichment, Scope};
pub use error::ReconError;
pub use matcher::{match_keys, KeyMatch};
pub use model::{JoinKeySet, RunSummary};
pub use partition::{partition, KeywordSplit, Marker};
pub use pipeline::{find_input, require_doc_num, run_folder};
