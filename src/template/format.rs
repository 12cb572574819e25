//! Display formatting for resolved values.
//!
//! A format string attached to a placeholder (`{{total:N2}}`,
//! `{{issued:MMMM dd, yyyy}}`, `{{price:EUR}}`) is resolved in order: case
//! transform, date pattern, currency code, numeric pattern. Whatever fails to
//! apply falls through, and when nothing applies the value is rendered
//! unformatted — a bad format string never fails a document.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::expr::ExprValue;
use crate::expr::value::{currency_symbol, is_currency_code};

/// Date pattern used when a definition declares none.
pub(crate) const DEFAULT_DATE_FORMAT: &str = "MMMM dd, yyyy";

/// Render `value` through `format`, falling back to the plain rendering.
pub(crate) fn apply(value: &ExprValue, format: &str) -> String {
    let f = format.trim();
    match f.to_lowercase().as_str() {
        "upper" => return value.display_string().to_uppercase(),
        "lower" => return value.display_string().to_lowercase(),
        "title" => return title_case(&value.display_string()),
        "trim" => return value.display_string().trim().to_string(),
        _ => {}
    }
    if let Some(pattern) = to_chrono_format(&normalize_date_format(f)) {
        if let Some(dt) = parse_date(&value.display_string()) {
            return dt.format(&pattern).to_string();
        }
    }
    if let Some(n) = value.as_f64() {
        if is_currency_code(f) {
            return format!("{}{:.2}", currency_symbol(f), n);
        }
        if let Some(rendered) = format_number_pattern(n, f) {
            return rendered;
        }
    }
    value.display_string()
}

// ============================================================================
// DATES
// ============================================================================

/// Parse a date out of its common wire shapes. Ambiguous slash dates read
/// month-first. Date-only inputs land on midnight so time specifiers in the
/// output pattern stay valid.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%B %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Fold the uppercase spellings some templates use (`YYYY-MM-DD`) into the
/// canonical lowercase tokens.
pub(crate) fn normalize_date_format(f: &str) -> String {
    f.replace("YYYY", "yyyy").replace("DD", "dd").replace('D', "d")
}

const DATE_TOKENS: &[(&str, &str)] = &[
    ("yyyy", "%Y"),
    ("yy", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%-m"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("dd", "%d"),
    ("d", "%-d"),
    ("HH", "%H"),
    ("H", "%-H"),
    ("hh", "%I"),
    ("h", "%-I"),
    ("mm", "%M"),
    ("m", "%-M"),
    ("ss", "%S"),
    ("s", "%-S"),
    ("tt", "%p"),
];

/// Translate a .NET-style date pattern to a chrono format string. `None`
/// when the pattern contains no date token at all — that means the format
/// string was never a date format.
pub(crate) fn to_chrono_format(pattern: &str) -> Option<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut mapped = false;
    let mut rest = pattern;
    'outer: while !rest.is_empty() {
        for (token, repl) in DATE_TOKENS {
            if rest.starts_with(token) {
                out.push_str(repl);
                rest = &rest[token.len()..];
                mapped = true;
                continue 'outer;
            }
        }
        let Some(ch) = rest.chars().next() else { break };
        if ch == '%' {
            out.push_str("%%");
        } else {
            out.push(ch);
        }
        rest = &rest[ch.len_utf8()..];
    }
    if mapped { Some(out) } else { None }
}

/// Render through a pattern, falling back to a long date when the pattern
/// has no usable tokens.
pub(crate) fn format_date(dt: &NaiveDateTime, pattern: &str) -> String {
    match to_chrono_format(&normalize_date_format(pattern)) {
        Some(f) => dt.format(&f).to_string(),
        None => dt.format("%B %d, %Y").to_string(),
    }
}

// ============================================================================
// NUMBERS
// ============================================================================

/// Apply a numeric pattern: `N<d>` (grouped, fixed decimals) or a literal
/// mask like `0.00` / `#,##0.00`. `None` when the pattern is neither.
pub(crate) fn format_number_pattern(n: f64, pattern: &str) -> Option<String> {
    if let Some(rest) = pattern.strip_prefix(['N', 'n']) {
        let decimals = if rest.is_empty() { 2 } else { rest.parse().ok()? };
        return Some(group_thousands(&format!("{:.*}", decimals, n)));
    }
    if !pattern.contains(['0', '#'])
        || !pattern.chars().all(|c| matches!(c, '0' | '#' | ',' | '.'))
    {
        return None;
    }
    let decimals = pattern.split_once('.').map(|(_, d)| d.len()).unwrap_or(0);
    let rendered = format!("{:.*}", decimals, n);
    Some(if pattern.contains(',') {
        group_thousands(&rendered)
    } else {
        rendered
    })
}

/// Insert thousands separators into a plain decimal rendering.
pub(crate) fn group_thousands(s: &str) -> String {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(r) => ("-", r),
        None => ("", s),
    };
    let (int_part, frac) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match frac {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut start_of_word = true;
    for ch in s.chars() {
        if ch.is_whitespace() {
            start_of_word = true;
            out.push(ch);
        } else if start_of_word {
            out.extend(ch.to_uppercase());
            start_of_word = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

// ============================================================================
// TESTS
// ============================================================================
