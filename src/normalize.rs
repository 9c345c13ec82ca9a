use once_cell::sync::Lazy;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Exact-match overrides for known spelling mismatches between the
/// establishment table and the census/boundary table. Keys and values are
/// already-normalized forms; values must be fixed points of `normalize`.
static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("VL ISABEL", "VILA ISABEL"),
        ("JD BOTANICO", "JARDIM BOTANICO"),
        ("STA TERESA", "SANTA TERESA"),
        ("S CRISTOVAO", "SAO CRISTOVAO"),
    ])
});

/// Canonicalizes a free-text bairro name into the join/grouping key.
///
/// Trim + uppercase, strip diacritics (NFD, drop combining marks), strip
/// punctuation except `/` and `-`, collapse whitespace, then apply the
/// alias table. Idempotent; empty input yields the empty key.
pub fn normalize(name: &str) -> String {
    let upper = name.trim().to_uppercase();

    let stripped: String = upper
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '/' | '-' | '_'))
        .collect();

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    match ALIASES.get(collapsed.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => collapsed,
    }
}
