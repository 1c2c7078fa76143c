// File I/O for SAP exports: dialect inference, header-aware reading,
// price tables and safe output writing

pub mod dialect;
pub mod document;
pub mod error;
pub mod lookup;
pub mod numeric;
pub mod writer;

pub use dialect::{Dialect, LineTerminator, Quoting};
pub use document::{read_text, split_line_ending, ColumnIndex, Document, SourceFile};
pub use error::IoError;
pub use lookup::{LookupSource, PriceLookup};
pub use numeric::{format_amount, parse_number};
pub use writer::{replace_in_place, stage_replace, write_new, Existing, ReplaceOptions, ReplaceOutcome, StagedReplace};
