//! Duration parsing from strings
//!
//! Cache lifetimes are configured as short human strings (`"10s"`, `"1m"`,
//! `"500ms"`, `"1m 30s"`). This module turns them into `std::time::Duration`.

use std::time::Duration;

use thiserror::Error;

/// Error type for duration parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationParseError {
    /// A number without a unit, or a unit without a number
    #[error("Invalid duration format: {0}")]
    InvalidFormat(String),

    /// The numeric part does not parse or is out of range
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// The unit is not one of `ms`, `s`, `m`, `h`, `d`
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    /// Nothing but whitespace
    #[error("Empty duration string")]
    EmptyString,
}

/// Parse a duration string into a Duration
///
/// Supported units: `ms`, `s`, `m`, `h`, `d`. Components may be combined and
/// separated by whitespace, and numbers may carry a fractional part.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cdf_connector_common::time::parse_duration;
///
/// assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
/// assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
/// assert_eq!(parse_duration("1m 30s").unwrap(), Duration::from_secs(90));
/// ```
///
/// # Errors
///
/// Returns [`DurationParseError`] for empty input, a number without a unit,
/// a unit without a number, or an unrecognised unit.
pub fn parse_duration(s: &str) -> Result<Duration, DurationParseError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(DurationParseError::EmptyString);
    }

    let mut total = Duration::ZERO;
    let mut current_number = String::new();
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch.is_ascii_digit() || ch == '.' {
            current_number.push(ch);
            continue;
        }
        if ch.is_whitespace() {
            continue;
        }

        let mut unit = ch.to_string();
        while let Some(next) = chars.peek() {
            if next.is_ascii_alphabetic() {
                unit.push(*next);
                chars.next();
            } else {
                break;
            }
        }

        if current_number.is_empty() {
            return Err(DurationParseError::InvalidFormat(format!(
                "Expected number before unit '{unit}'"
            )));
        }

        let value: f64 = current_number
            .parse()
            .map_err(|_| DurationParseError::InvalidNumber(current_number.clone()))?;

        let seconds = match unit.as_str() {
            "ms" => value / 1000.0,
            "s" => value,
            "m" => value * 60.0,
            "h" => value * 3600.0,
            "d" => value * 86400.0,
            _ => return Err(DurationParseError::UnknownUnit(unit)),
        };

        let component = Duration::try_from_secs_f64(seconds)
            .map_err(|_| DurationParseError::InvalidNumber(current_number.clone()))?;
        total = total
            .checked_add(component)
            .ok_or_else(|| DurationParseError::InvalidNumber(current_number.clone()))?;
        current_number.clear();
    }

    if !current_number.is_empty() {
        return Err(DurationParseError::InvalidFormat(format!(
            "Missing unit after number '{current_number}'"
        )));
    }

    Ok(total)
}
