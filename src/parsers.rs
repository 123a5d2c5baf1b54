//! Robust numeric parsing of mixed-unit strings.
//!
//! Grounded on `src/data_processing/graph_builder.py`'s `parse_time_to_hours`
//! / `parse_distance_to_km` (the day/hour/minute regex combination and the
//! trailing-`km`-strip) and `graph_to_json.py`'s `parse_numeric` (the
//! generic leading-integer extractor used by JSON export).

/// Parse a distance field that may already be numeric or may be a string
/// like `"299 km"`. On failure, returns `fallback_km` and logs a warning.
pub fn parse_distance_km(raw: &str, fallback_km: f64) -> f64 {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<f64>() {
        return v;
    }

    let stripped = strip_suffix_case_insensitive(trimmed, "km");
    match stripped.trim().parse::<f64>() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(value = raw, fallback_km, "malformed distance; using fallback");
            fallback_km
        }
    }
}

/// Parse a time field that may already be numeric (hours) or may combine
/// `<n> days?`, `<n> hours?`, `<n> minutes?` in any order/subset
/// (case-insensitive, decimals allowed), e.g. `"2 days 5 hours 30 minutes"`.
/// On failure, returns `fallback_hours` and logs a warning.
pub fn parse_time_hours(raw: &str, fallback_hours: f64) -> f64 {
    let trimmed = raw.trim();
    if let Ok(v) = trimmed.parse::<f64>() {
        return v;
    }

    let days = extract_unit_value(trimmed, "day").or_else(|| extract_unit_value(trimmed, "days"));
    let hours = extract_unit_value(trimmed, "hour").or_else(|| extract_unit_value(trimmed, "hours"));
    let minutes =
        extract_unit_value(trimmed, "minute").or_else(|| extract_unit_value(trimmed, "minutes"));

    if days.is_none() && hours.is_none() && minutes.is_none() {
        tracing::warn!(value = raw, fallback_hours, "malformed time; using fallback");
        return fallback_hours;
    }

    days.unwrap_or(0.0) * 24.0 + hours.unwrap_or(0.0) + minutes.unwrap_or(0.0) / 60.0
}

/// Extract the leading integer digits of the first whitespace-delimited
/// token (e.g. `"299 km"` -> `299.0`, `"8 hr"` -> `8.0`). Non-numeric tokens
/// return `None`, mirroring the Python source's `'N/A'` sentinel.
pub fn parse_numeric_leading_int(raw: &str) -> Option<f64> {
    let first_token = raw.split_whitespace().next()?;
    let digits: String = first_token.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse::<f64>().ok()
    }
}

/// Case-insensitive trailing-suffix strip, e.g. `strip_suffix_case_insensitive("299 KM", "km") == "299 "`.
fn strip_suffix_case_insensitive<'a>(s: &'a str, suffix: &str) -> &'a str {
    if s.len() >= suffix.len() && s[s.len() - suffix.len()..].eq_ignore_ascii_case(suffix) {
        &s[..s.len() - suffix.len()]
    } else {
        s
    }
}

/// Find a `<number> <unit>` occurrence (singular or plural `unit`,
/// case-insensitive) anywhere in `s` and return the parsed number.
fn extract_unit_value(s: &str, unit: &str) -> Option<f64> {
    let lower = s.to_ascii_lowercase();
    let unit_lower = unit.to_ascii_lowercase();
    let idx = lower.find(&unit_lower)?;

    // Walk backwards from idx over optional whitespace, then digits/decimal point.
    let prefix = &s[..idx];
    let number_part: String = prefix
        .trim_end()
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    if number_part.is_empty() {
        None
    } else {
        number_part.parse::<f64>().ok()
    }
}
