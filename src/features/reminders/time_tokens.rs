//! Free-text time parsing into canonical `HH:MM` tokens
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Grammars tried as an ordered table, meridiem hours validated to 1-12
//! - 1.0.0: Initial 12h/24h/bare-hour parsing

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::core::ParseError;

/// One daily reminder instant, 24-hour clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeToken {
    hour: u8,
    minute: u8,
}

impl TimeToken {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Strict `HH:MM` only. Used for tokens read back from storage or handed to the registry.
    pub fn from_canonical(s: &str) -> Option<Self> {
        let (h, m) = s.split_once(':')?;
        if h.len() != 2 || m.len() != 2 {
            return None;
        }
        if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return None;
        }
        Self::new(h.parse().ok()?, m.parse().ok()?)
    }
}

impl fmt::Display for TimeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

type Grammar = fn(&str) -> Option<TimeToken>;

/// Tried in order; the first grammar that accepts a token wins.
const GRAMMARS: [Grammar; 3] = [parse_meridiem, parse_clock, parse_bare_hour];

fn meridiem_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\d{1,2})(?::(\d{2}))?(am|pm)$").ok()).as_ref()
}

fn clock_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2}):(\d{2})$").ok()).as_ref()
}

fn bare_hour_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})$").ok()).as_ref()
}

fn parse_meridiem(token: &str) -> Option<TimeToken> {
    let caps = meridiem_re()?.captures(token)?;
    let hour: u8 = caps[1].parse().ok()?;
    let minute: u8 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if !(1..=12).contains(&hour) {
        return None;
    }
    let pm = caps[3].eq_ignore_ascii_case("pm");
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    TimeToken::new(hour, minute)
}

fn parse_clock(token: &str) -> Option<TimeToken> {
    let caps = clock_re()?.captures(token)?;
    TimeToken::new(caps[1].parse().ok()?, caps[2].parse().ok()?)
}

fn parse_bare_hour(token: &str) -> Option<TimeToken> {
    let caps = bare_hour_re()?.captures(token)?;
    TimeToken::new(caps[1].parse().ok()?, 0)
}

fn parse_token(token: &str) -> Result<TimeToken, ParseError> {
    GRAMMARS
        .iter()
        .find_map(|grammar| grammar(token))
        .ok_or_else(|| ParseError::TimeToken(token.to_string()))
}

/// Parse a comma/space separated list of times.
///
/// All-or-nothing: the first token that matches no grammar rejects the whole
/// input. Order and duplicates are preserved.
pub fn parse_times(text: &str) -> Result<Vec<TimeToken>, ParseError> {
    let tokens: Vec<&str> = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    if tokens.is_empty() {
        return Err(ParseError::NoTimes);
    }

    tokens.into_iter().map(parse_token).collect()
}

/// Render tokens the way they are shown back to users: `09:00, 21:00`.
pub fn join_tokens(tokens: &[TimeToken]) -> String {
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(text: &str) -> Vec<String> {
        parse_times(text)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_grammar_patterns_compile() {
        assert!(meridiem_re().is_some());
        assert!(clock_re().is_some());
        assert!(bare_hour_re().is_some());
    }

    #[test]
    fn test_mixed_separators() {
        assert_eq!(strings(" 9am,21:30  7 ,, 8pm "), vec!["09:00", "21:30", "07:00", "20:00"]);
    }

    #[test]
    fn test_meridiem_edges() {
        assert_eq!(strings("12am"), vec!["00:00"]);
        assert_eq!(strings("12pm"), vec!["12:00"]);
        assert_eq!(strings("9:30pm"), vec!["21:30"]);
        assert_eq!(strings("9AM"), vec!["09:00"]);
        assert_eq!(strings("12:15am"), vec!["00:15"]);
    }

    #[test]
    fn test_clock_and_bare_hour() {
        assert_eq!(strings("9:05"), vec!["09:05"]);
        assert_eq!(strings("21:30"), vec!["21:30"]);
        assert_eq!(strings("0"), vec!["00:00"]);
        assert_eq!(strings("23"), vec!["23:00"]);
    }

    #[test]
    fn test_multiple_tokens_keep_order_and_duplicates() {
        assert_eq!(strings("9am,9pm"), vec!["09:00", "21:00"]);
        assert_eq!(strings("21:00 9am, 9am"), vec!["21:00", "09:00", "09:00"]);
    }

    #[test]
    fn test_rejects_invalid_tokens() {
        assert!(matches!(
            parse_times("25:00"),
            Err(ParseError::TimeToken(t)) if t == "25:00"
        ));
        assert!(matches!(
            parse_times("9xm"),
            Err(ParseError::TimeToken(t)) if t == "9xm"
        ));
        assert!(parse_times("13pm").is_err());
        assert!(parse_times("0am").is_err());
        assert!(parse_times("9:60").is_err());
        assert!(parse_times("24").is_err());
    }

    #[test]
    fn test_all_or_nothing() {
        assert!(matches!(
            parse_times("9am,25:00"),
            Err(ParseError::TimeToken(t)) if t == "25:00"
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(parse_times(""), Err(ParseError::NoTimes)));
        assert!(matches!(parse_times(" , "), Err(ParseError::NoTimes)));
    }

    #[test]
    fn test_from_canonical_is_strict() {
        assert_eq!(
            TimeToken::from_canonical("09:00"),
            TimeToken::new(9, 0)
        );
        assert!(TimeToken::from_canonical("9:00").is_none());
        assert!(TimeToken::from_canonical("24:00").is_none());
        assert!(TimeToken::from_canonical("09:0a").is_none());
        assert!(TimeToken::from_canonical("9am").is_none());
    }

    #[test]
    fn test_join_tokens() {
        let tokens = parse_times("9am 9pm").unwrap();
        assert_eq!(join_tokens(&tokens), "09:00, 21:00");
    }
}
