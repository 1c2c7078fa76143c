// Price enrichment: reprice rows from the master table by item code

use regex::Regex;
use saprecon_io::{format_amount, parse_number, split_line_ending, ColumnIndex, Dialect, PriceLookup};

use crate::config::ColumnAliases;
use crate::model::JoinKeySet;
use crate::partition::trimmed_field;

/// Resolved positions of the columns enrichment reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichColumns {
    pub item_code: usize,
    pub gp_bef_disc: usize,
    pub price_af_vat: usize,
    pub grand_total: usize,
    pub quantity: usize,
    pub description: Option<usize>,
}

impl EnrichColumns {
    /// Resolve all mandatory columns at once. `Err` lists every unresolved
    /// logical column by its alias names.
    pub fn resolve(index: &ColumnIndex, aliases: &ColumnAliases) -> Result<Self, Vec<String>> {
        let mut missing = Vec::new();
        let mut need = |list: &[String]| {
            let found = index.resolve_any(list);
            if found.is_none() {
                missing.push(list.join("/"));
            }
            found.unwrap_or_default()
        };

        let columns = Self {
            item_code: need(aliases.item_code.as_slice()),
            gp_bef_disc: need(aliases.gp_bef_disc.as_slice()),
            price_af_vat: need(aliases.price_af_vat.as_slice()),
            grand_total: need(aliases.grand_total.as_slice()),
            quantity: need(aliases.quantity.as_slice()),
            description: index.resolve_any(aliases.description.as_slice()),
        };

        if !missing.is_empty() {
            return Err(missing);
        }
        if columns.description.is_none() {
            tracing::warn!("no description column, promo annotations are kept");
        }
        Ok(columns)
    }
}

/// Which rows an enrichment pass may touch.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    All,
    /// Only rows whose trimmed `column` value is in `keys`.
    KeysIn { column: usize, keys: &'a JoinKeySet },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub lines: Vec<String>,
    /// Rows rewritten from the lookup.
    pub updated: usize,
}

pub struct Enricher<'a> {
    dialect: &'a Dialect,
    columns: EnrichColumns,
    lookup: &'a PriceLookup,
    promo: Option<Regex>,
    runs: Regex,
}

impl<'a> Enricher<'a> {
    pub fn new(
        dialect: &'a Dialect,
        columns: EnrichColumns,
        lookup: &'a PriceLookup,
        promo_marker: &str,
    ) -> Result<Self, regex::Error> {
        let promo = match promo_marker.trim() {
            "" => None,
            marker => Some(Regex::new(&format!(r"\s*{}\s*", regex::escape(marker)))?),
        };
        Ok(Self {
            dialect,
            columns,
            lookup,
            promo,
            runs: Regex::new(r"\s{2,}")?,
        })
    }

    /// Rewrite qualifying rows; everything else is returned unchanged.
    pub fn enrich(&self, lines: &[String], scope: Scope<'_>) -> Enrichment {
        let mut updated = 0usize;
        let lines = lines
            .iter()
            .map(|line| match self.reprice(line, scope) {
                Some(rewritten) => {
                    updated += 1;
                    rewritten
                }
                None => line.clone(),
            })
            .collect();
        Enrichment { lines, updated }
    }

    /// `None` means pass the raw line through.
    fn reprice(&self, line: &str, scope: Scope<'_>) -> Option<String> {
        let (content, ending) = split_line_ending(line);

        if let Scope::KeysIn { column, keys } = scope {
            let key = trimmed_field(self.dialect, content, column)?;
            if !keys.contains(&key) {
                return None;
            }
        }

        let mut fields = self.dialect.parse_line(content)?;
        let c = &self.columns;
        if [c.gp_bef_disc, c.price_af_vat, c.grand_total, c.quantity]
            .iter()
            .any(|&idx| idx >= fields.len())
        {
            return None;
        }
        let code = fields.get(c.item_code)?;
        let price = self.lookup.get(code)?;

        let quantity = parse_number(&fields[c.quantity]).unwrap_or(0.0);

        let amount = format_amount(price);
        fields[c.grand_total] = format_amount(price * quantity);
        fields[c.gp_bef_disc] = amount.clone();
        fields[c.price_af_vat] = amount;

        if let Some(field) = c.description.and_then(|idx| fields.get_mut(idx)) {
            *field = self.strip_promo(field);
        }

        let rendered = self.dialect.render_line(&fields, ending);
        if rendered.is_none() {
            tracing::warn!(line = content, "cannot render repriced row, kept original");
        }
        rendered
    }

    fn strip_promo(&self, description: &str) -> String {
        let Some(promo) = &self.promo else {
            return description.to_string();
        };
        let stripped = promo.replace_all(description, " ");
        self.runs.replace_all(&stripped, " ").trim().to_string()
    }
}
