//! Raw score to percentage conversion.

/// Convert a raw cell to a percentage of `max_score`, e.g. `"8"` of 10 is `"80.00%"`.
///
/// Blank and non-numeric cells (the LMS writes `-` for "not attempted") give
/// an empty string, never `0.00%`. Values above 100% are kept as computed.
pub fn normalize_score(raw: &str, max_score: f64) -> String {
    match parse_score(raw) {
        Some(value) => format_percentage(value / max_score * 100.0),
        None => String::new(),
    }
}

/// Numeric value of a raw cell, if any.
pub fn parse_score(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Two decimals and a percent sign.
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}
