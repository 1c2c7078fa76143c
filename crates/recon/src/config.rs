use std::collections::HashSet;
use std::path::Path;

use saprecon_io::{LookupSource, ReplaceOptions};
use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::partition::Marker;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything one reconciliation run needs to know, with documented defaults.
///
/// Every section is optional in TOML; an empty file is the default config.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Leading lines copied verbatim; column names come from the last one. Default 2.
    pub header_rows: usize,
    pub marker: MarkerConfig,
    pub files: FileConfig,
    pub outputs: OutputNames,
    pub columns: ColumnAliases,
    pub enrich: EnrichConfig,
    pub lookup: LookupSource,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            header_rows: 2,
            marker: MarkerConfig::default(),
            files: FileConfig::default(),
            outputs: OutputNames::default(),
            columns: ColumnAliases::default(),
            enrich: EnrichConfig::default(),
            lookup: LookupSource::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Marker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Negative-discount indicator searched for in primary rows.
    pub text: String,
    pub case_sensitive: bool,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            text: "ส่วนลดติดลบ".into(),
            case_sensitive: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Files + outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FileConfig {
    /// Glob (relative to the run folder) for the file scanned for the marker.
    pub primary: String,
    /// Glob for the file matched on DocNum and enriched.
    pub secondary: String,
    /// Subdirectory of the run folder receiving derivative outputs.
    pub output_dir: String,
    /// Replace derivative outputs left by an earlier run.
    pub overwrite_outputs: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            primary: "sap1*.txt".into(),
            secondary: "sap2*.txt".into(),
            output_dir: "minus_0".into(),
            overwrite_outputs: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputNames {
    pub primary_matched: String,
    pub primary_unmatched: String,
    pub secondary_matched: String,
    pub secondary_unmatched: String,
    /// Enriched secondary file, written here when `enrich.in_place` is off.
    pub updated_secondary: String,
}

impl Default for OutputNames {
    fn default() -> Self {
        Self {
            primary_matched: "sap1_only_negative.txt".into(),
            primary_unmatched: "sap1_without_negative.txt".into(),
            secondary_matched: "sap2_match_negative_docnums.txt".into(),
            secondary_unmatched: "sap2_without_negative_docnums.txt".into(),
            updated_secondary: "sap2_main_updated.txt".into(),
        }
    }
}

impl OutputNames {
    fn all(&self) -> [(&'static str, &str); 5] {
        [
            ("primary_matched", self.primary_matched.as_str()),
            ("primary_unmatched", self.primary_unmatched.as_str()),
            ("secondary_matched", self.secondary_matched.as_str()),
            ("secondary_unmatched", self.secondary_unmatched.as_str()),
            ("updated_secondary", self.updated_secondary.as_str()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Column aliases
// ---------------------------------------------------------------------------

/// Candidate header names per logical column, tried in order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ColumnAliases {
    pub doc_num: Vec<String>,
    pub item_code: Vec<String>,
    pub gp_bef_disc: Vec<String>,
    pub price_af_vat: Vec<String>,
    pub grand_total: Vec<String>,
    pub quantity: Vec<String>,
    /// Optional: promo annotations are stripped when it resolves.
    pub description: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            doc_num: names(&["docnum"]),
            item_code: names(&["itemcode", "code"]),
            gp_bef_disc: names(&["gpbefdisc"]),
            price_af_vat: names(&["priceafvat", "price_after_vat"]),
            grand_total: names(&["gtotal", "grandtotal", "total"]),
            quantity: names(&["quantity", "qty"]),
            description: names(&[
                "itemdescription",
                "item description",
                "description",
                "dscription",
                "itemname",
            ]),
        }
    }
}

impl ColumnAliases {
    fn mandatory(&self) -> [(&'static str, &[String]); 6] {
        [
            ("doc_num", self.doc_num.as_slice()),
            ("item_code", self.item_code.as_slice()),
            ("gp_bef_disc", self.gp_bef_disc.as_slice()),
            ("price_af_vat", self.price_af_vat.as_slice()),
            ("grand_total", self.grand_total.as_slice()),
            ("quantity", self.quantity.as_slice()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EnrichConfig {
    /// Free-item annotation removed from descriptions of repriced rows.
    pub promo_marker: String,
    /// Rewrite the secondary file itself (backup + atomic rename).
    pub in_place: bool,
    pub backup_suffix: String,
    pub temp_suffix: String,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            promo_marker: "(แถม)".into(),
            in_place: true,
            backup_suffix: ".bak".into(),
            temp_suffix: ".tmp".into(),
        }
    }
}

impl EnrichConfig {
    pub fn replace_options(&self) -> ReplaceOptions {
        ReplaceOptions {
            backup_suffix: self.backup_suffix.clone(),
            temp_suffix: self.temp_suffix.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ReconError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ReconError::ConfigParse(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> Result<String, ReconError> {
        toml::to_string_pretty(self).map_err(|e| ReconError::ConfigParse(e.to_string()))
    }

    pub fn marker(&self) -> Marker {
        Marker::new(&self.marker.text, self.marker.case_sensitive)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let invalid = |msg: String| Err(ReconError::ConfigValidation(msg));

        if self.header_rows == 0 {
            return invalid("header_rows must be at least 1 (column names come from the header)".into());
        }

        if self.marker.text.is_empty() {
            return invalid("marker.text must not be empty".into());
        }

        for (key, value) in [
            ("files.primary", &self.files.primary),
            ("files.secondary", &self.files.secondary),
            ("files.output_dir", &self.files.output_dir),
        ] {
            if value.trim().is_empty() {
                return invalid(format!("{key} must not be empty"));
            }
        }
        for (key, pattern) in [
            ("files.primary", &self.files.primary),
            ("files.secondary", &self.files.secondary),
        ] {
            if let Err(e) = glob::Pattern::new(pattern) {
                return invalid(format!("{key}: invalid pattern {pattern:?}: {e}"));
            }
        }

        let mut seen = HashSet::new();
        for (key, name) in self.outputs.all() {
            if name.trim().is_empty() {
                return invalid(format!("outputs.{key} must not be empty"));
            }
            if !seen.insert(name) {
                return invalid(format!("outputs.{key} reuses file name '{name}'"));
            }
        }

        for (key, aliases) in self.columns.mandatory() {
            if aliases.iter().all(|a| a.trim().is_empty()) {
                return invalid(format!("columns.{key} needs at least one name"));
            }
        }

        if self.enrich.backup_suffix.is_empty() || self.enrich.temp_suffix.is_empty() {
            return invalid("enrich.backup_suffix and enrich.temp_suffix must not be empty".into());
        }
        if self.enrich.backup_suffix == self.enrich.temp_suffix {
            return invalid("enrich.backup_suffix and enrich.temp_suffix must differ".into());
        }

        if self.lookup.code_column.trim().is_empty() || self.lookup.price_column.trim().is_empty() {
            return invalid("lookup.code_column and lookup.price_column must not be empty".into());
        }
        if self.lookup.encodings.is_empty() {
            return invalid("lookup.encodings must list at least one encoding".into());
        }
        let unknown = self.lookup.unknown_encodings();
        if !unknown.is_empty() {
            return invalid(format!("lookup.encodings: unknown label(s) {}", unknown.join(", ")));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
