// Accounting-style number parsing

/// Tokens removed before parsing: currency symbols and spaces.
const STRIP: &[char] = &['฿', '$', '€', ' ', '\u{a0}'];

/// Parse an accounting value such as `"฿1,000"` or `"(1,234.50)"`.
///
/// Parentheses mean negative. Returns `None` for anything that is not a
/// finite number once symbols and thousands separators are removed; callers
/// decide what an absent value means.
pub fn parse_number(s: &str) -> Option<f64> {
    let mut t = s.trim();
    if t.is_empty() {
        return None;
    }

    let negative = t.len() >= 2 && t.starts_with('(') && t.ends_with(')');
    if negative {
        t = &t[1..t.len() - 1];
    }

    let cleaned: String = t
        .chars()
        .filter(|c| !STRIP.contains(c) && *c != ',')
        .collect();

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

/// Two-decimal rendering used for every rewritten price field.
pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accounting_notation() {
        assert_eq!(parse_number("(1,234.50)"), Some(-1234.5));
        assert_eq!(parse_number("(123.45)"), Some(-123.45));
        assert_eq!(parse_number("฿1,000"), Some(1000.0));
        assert_eq!(parse_number(" $ 12.5 "), Some(12.5));
        assert_eq!(parse_number("€\u{a0}7"), Some(7.0));
        assert_eq!(parse_number("-3"), Some(-3.0));
    }

    #[test]
    fn absent_values() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("()"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn two_decimals() {
        assert_eq!(format_amount(10.0), "10.00");
        assert_eq!(format_amount(30.0), "30.00");
        assert_eq!(format_amount(1234.5), "1234.50");
        assert_eq!(format_amount(0.125 * 3.0), "0.38");
    }
}
