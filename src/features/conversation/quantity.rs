//! Exercise duration parsing

use regex::Regex;
use std::sync::OnceLock;

use crate::core::ParseError;

fn exact_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\d+(?:\.\d+)?)(?:\s*(?:mins?|minutes?|m))?$").ok())
        .as_ref()
}

fn any_number_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").ok()).as_ref()
}

/// Minutes from `45`, `45 mins`, `30 minutes`, `12.5m`, or failing those the
/// first number anywhere in the text. Zero is rejected.
pub fn parse_minutes(text: &str) -> Result<f64, ParseError> {
    let text = text.trim();
    let number = exact_re()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .or_else(|| any_number_re().and_then(|re| re.find(text)))
        .map(|m| m.as_str())
        .ok_or_else(|| ParseError::Quantity(text.to_string()))?;

    let minutes: f64 = number
        .parse()
        .map_err(|_| ParseError::Quantity(text.to_string()))?;
    if minutes <= 0.0 || !minutes.is_finite() {
        return Err(ParseError::Quantity(text.to_string()));
    }
    Ok(minutes)
}
