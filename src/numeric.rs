use once_cell::sync::Lazy;
use regex::Regex;

/// Plain numeric text: optional minus, digits, optional single `.` or `,`
/// fractional part.
static PLAIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(?:[.,]\d+)?$").unwrap());

/// Thousands-grouped numeric text, Brazilian convention: `.` groups of
/// three, optional `,` decimal part (e.g. "1.234.567,89").
static GROUPED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{1,3}(?:\.\d{3})+(?:,\d+)?$").unwrap());

/// Best-effort parse of a locale-formatted numeric string.
///
/// Brazilian convention: `.` is a thousands separator and is stripped,
/// `,` is the decimal mark ("10.205" -> 10205.0, "39,6" -> 39.6).
/// Anything that does not look numeric yields `None`; never panics.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if PLAIN_RE.is_match(s) || GROUPED_RE.is_match(s) {
        let cleaned = s.replace('.', "").replace(',', ".");
        return cleaned.parse().ok();
    }
    None
}

/// Parses a quantity column into an integer count, defaulting to 0 for
/// non-numeric text (row-level data issues degrade, they do not abort).
pub fn parse_count(raw: &str) -> i64 {
    parse_number(raw).map(|v| v.round() as i64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_pass_through() {
        assert_eq!(parse_number("123"), Some(123.0));
        assert_eq!(parse_number("-7"), Some(-7.0));
        assert_eq!(parse_number(" 42 "), Some(42.0));
    }

    #[test]
    fn dot_is_thousands_separator() {
        assert_eq!(parse_number("1.234"), Some(1234.0));
        assert_eq!(parse_number("10.205"), Some(10205.0));
        assert_eq!(parse_number("1.234.567"), Some(1_234_567.0));
    }

    #[test]
    fn comma_is_decimal_mark() {
        assert_eq!(parse_number("12,34"), Some(12.34));
        assert_eq!(parse_number("39,6"), Some(39.6));
        assert_eq!(parse_number("1.234,5"), Some(1234.5));
    }

    #[test]
    fn garbage_is_not_a_number() {
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("12a"), None);
        assert_eq!(parse_number("1,2,3"), None);
        assert_eq!(parse_number("--5"), None);
    }

    #[test]
    fn counts_default_to_zero() {
        assert_eq!(parse_count("10"), 10);
        assert_eq!(parse_count("n/d"), 0);
        assert_eq!(parse_count(""), 0);
    }
}
