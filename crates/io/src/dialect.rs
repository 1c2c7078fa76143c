// Delimiter/quoting inference for exported text files

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};

/// Candidate field delimiters, in preference order.
const CANDIDATES: &[u8] = &[b',', b'\t', b'|', b';'];

/// Sniffing never looks further than this many sample lines.
const MAX_SAMPLE_LINES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    /// Quote only fields that contain the delimiter, the quote or a line break.
    Minimal,
    /// Quote every field.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    Lf,
    CrLf,
    Cr,
}

impl LineTerminator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }

    fn of(sample: &str) -> Self {
        if sample.contains("\r\n") {
            Self::CrLf
        } else if sample.contains('\r') && !sample.contains('\n') {
            Self::Cr
        } else {
            Self::Lf
        }
    }
}

/// The delimiter/quoting convention of one file.
///
/// Every record of a file (header and body) is parsed with the same dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    pub delimiter: u8,
    pub quote: u8,
    pub quoting: Quoting,
    pub terminator: LineTerminator,
    /// False when detection gave up and this is the fallback dialect.
    pub inferred: bool,
}

impl Dialect {
    /// Tab-delimited, double-quote, minimal quoting, `\n`.
    pub const FALLBACK: Dialect = Dialect {
        delimiter: b'\t',
        quote: b'"',
        quoting: Quoting::Minimal,
        terminator: LineTerminator::Lf,
        inferred: false,
    };

    /// Infer the dialect of `sample` (normally the last header line).
    ///
    /// Never fails: an empty, ambiguous or delimiter-free sample yields
    /// [`Dialect::FALLBACK`].
    pub fn detect(sample: &str) -> Dialect {
        match sniff_delimiter(sample) {
            Some(delimiter) => Dialect {
                delimiter,
                quote: b'"',
                quoting: sniff_quoting(sample, delimiter),
                terminator: LineTerminator::of(sample),
                inferred: true,
            },
            None => {
                tracing::warn!(
                    sample_len = sample.len(),
                    "could not infer delimiter, falling back to tab-delimited"
                );
                Self::FALLBACK
            }
        }
    }

    /// Human-readable delimiter name for reports.
    pub fn delimiter_name(&self) -> &'static str {
        match self.delimiter {
            b',' => "comma",
            b'\t' => "tab",
            b'|' => "pipe",
            b';' => "semicolon",
            _ => "other",
        }
    }

    pub(crate) fn reader_builder(&self) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(self.delimiter)
            .quote(self.quote)
            .double_quote(true)
            .has_headers(false)
            .flexible(true);
        builder
    }

    /// Parse one line into fields. `None` when the line holds no record.
    pub fn parse_line(&self, line: &str) -> Option<Vec<String>> {
        let mut reader = self.reader_builder().from_reader(line.as_bytes());
        let mut record = StringRecord::new();
        match reader.read_record(&mut record) {
            Ok(true) => Some(record.iter().map(str::to_string).collect()),
            Ok(false) => None,
            Err(e) => {
                tracing::debug!(error = %e, "unparsable record");
                None
            }
        }
    }

    /// Field `idx` of `line`, or `None` if the line is unparsable or too short.
    pub fn field(&self, line: &str, idx: usize) -> Option<String> {
        self.parse_line(line)?.into_iter().nth(idx)
    }

    /// Serialize `fields` as one record followed by `ending` (which may be empty).
    pub fn render_line(&self, fields: &[String], ending: &str) -> Option<String> {
        let style = match self.quoting {
            Quoting::Minimal => QuoteStyle::Necessary,
            Quoting::All => QuoteStyle::Always,
        };
        let mut writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote(self.quote)
            .quote_style(style)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        writer.write_record(fields).ok()?;
        let bytes = writer.into_inner().ok()?;
        let mut text = String::from_utf8(bytes).ok()?;
        if text.ends_with('\n') {
            text.pop();
        }
        text.push_str(ending);
        Some(text)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::FALLBACK
    }
}

fn field_count(line: &str, delim: u8) -> usize {
    ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(1)
}

/// Pick the candidate that splits every sample line into the same number (>1)
/// of fields. The widest split wins; a tie between candidates is ambiguous.
fn sniff_delimiter(sample: &str) -> Option<u8> {
    let lines: Vec<&str> = sample
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(MAX_SAMPLE_LINES)
        .collect();

    if lines.is_empty() {
        return None;
    }

    let mut best: Option<(u8, usize)> = None;
    let mut tied = false;

    for &delim in CANDIDATES {
        let counts: Vec<usize> = lines.iter().map(|line| field_count(line, delim)).collect();
        let target = counts[0];
        if target <= 1 || counts.iter().any(|&c| c != target) {
            continue;
        }

        match best {
            Some((_, width)) if target == width => tied = true,
            Some((_, width)) if target < width => {}
            _ => {
                best = Some((delim, target));
                tied = false;
            }
        }
    }

    if tied {
        None
    } else {
        best.map(|(delim, _)| delim)
    }
}

/// `All` when every field of the first sample line is wrapped in quotes.
///
/// Field boundaries come from the csv reader, so a quoted field may contain
/// the delimiter. The line counts as fully quoted when re-rendering its
/// fields with every field quoted reproduces it.
fn sniff_quoting(sample: &str, delim: u8) -> Quoting {
    let Some(first) = sample.lines().find(|l| !l.trim().is_empty()) else {
        return Quoting::Minimal;
    };
    let content = first.trim_end_matches(['\r', '\n']);
    if !content.trim_start().starts_with('"') {
        return Quoting::Minimal;
    }

    let quoted = Dialect {
        delimiter: delim,
        quote: b'"',
        quoting: Quoting::All,
        terminator: LineTerminator::Lf,
        inferred: true,
    };
    let Some(fields) = quoted.parse_line(content) else {
        return Quoting::Minimal;
    };
    match quoted.render_line(&fields, "") {
        Some(rendered) if rendered == content => Quoting::All,
        _ => Quoting::Minimal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_candidate() {
        assert_eq!(Dialect::detect("DocNum,ItemCode,Quantity\n").delimiter, b',');
        assert_eq!(Dialect::detect("DocNum\tItemCode\tQuantity\n").delimiter, b'\t');
        assert_eq!(Dialect::detect("DocNum|ItemCode|Quantity\n").delimiter, b'|');
        assert_eq!(Dialect::detect("DocNum;ItemCode;Quantity\n").delimiter, b';');
    }

    #[test]
    fn widest_consistent_split_wins() {
        // Commas inside a quoted header name must not outvote the semicolons
        let d = Dialect::detect("Name;\"Address, line 1\";City;Zip\n");
        assert_eq!(d.delimiter, b';');
        assert!(d.inferred);
    }

    #[test]
    fn ambiguous_sample_falls_back() {
        let d = Dialect::detect("a,b;c\n");
        assert_eq!(d, Dialect::FALLBACK);
    }

    #[test]
    fn empty_or_single_column_falls_back() {
        assert_eq!(Dialect::detect(""), Dialect::FALLBACK);
        assert_eq!(Dialect::detect("   \n"), Dialect::FALLBACK);
        assert_eq!(Dialect::detect("DocNum\n"), Dialect::FALLBACK);
        assert_eq!(Dialect::FALLBACK.delimiter, b'\t');
        assert_eq!(Dialect::FALLBACK.terminator, LineTerminator::Lf);
    }

    #[test]
    fn inconsistent_lines_fall_back() {
        let d = Dialect::detect("a,b,c\nd,e\n");
        assert!(!d.inferred);
    }

    #[test]
    fn header_reparse_matches_manual_count() {
        let header = "DocNum,ItemCode,Description,GPBefDisc,PriceAfVAT,GTotal,Quantity\r\n";
        let d = Dialect::detect(header);
        assert_eq!(d.terminator, LineTerminator::CrLf);
        let fields = d.parse_line(header).unwrap();
        assert_eq!(fields.len(), header.trim_end().split(',').count());
        assert_eq!(fields[6], "Quantity");
    }

    #[test]
    fn fully_quoted_sample_keeps_quoting() {
        let d = Dialect::detect("\"DocNum\",\"ItemCode\"\n");
        assert_eq!(d.quoting, Quoting::All);
        let line = d.render_line(&["D1".into(), "SKU".into()], "\n").unwrap();
        assert_eq!(line, "\"D1\",\"SKU\"\n");
    }

    #[test]
    fn quoted_field_may_hold_the_delimiter() {
        let d = Dialect::detect("\"DocNum\",\"Item, Code\",\"Qty\"\r\n");
        assert_eq!(d.delimiter, b',');
        assert_eq!(d.quoting, Quoting::All);

        let d = Dialect::detect("\"DocNum\",ItemCode,\"Qty\"\n");
        assert_eq!(d.quoting, Quoting::Minimal);
    }

    #[test]
    fn lone_cr_terminator() {
        let d = Dialect::detect("DocNum,ItemCode\r");
        assert_eq!(d.terminator, LineTerminator::Cr);
        assert_eq!(d.terminator.as_str(), "\r");
    }

    #[test]
    fn field_access_is_total() {
        let d = Dialect::detect("a,b,c\n");
        assert_eq!(d.field("1,\"x, y\",3\n", 1).as_deref(), Some("x, y"));
        assert_eq!(d.field("1,2\n", 5), None);
        assert_eq!(d.field("", 0), None);
    }

    #[test]
    fn render_quotes_only_when_needed() {
        let d = Dialect::detect("a,b,c\n");
        let line = d
            .render_line(&["D1".into(), "Widget, large".into(), "3".into()], "\r\n")
            .unwrap();
        assert_eq!(line, "D1,\"Widget, large\",3\r\n");
        assert_eq!(d.render_line(&["x".into()], "").unwrap(), "x");
    }
}
