//! Duration parsing for `!period`.
//!
//! Two notations are accepted, case- and whitespace-insensitively:
//!
//! * ISO 8601 designators: `P1Y2M3DT4H5M6S`, `P2W`, `PT30M`. `M` means
//!   months before `T` and minutes after it.
//! * Unit words: `1 day 2 hours`, `30 seconds`, `5 min`, optionally with a
//!   leading `P`.
//!
//! A year is 365 days and a month 30 days.

use std::time::Duration;

use crate::error::{ConfigError, Result};

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;
const MONTH: u64 = 30 * DAY;
const YEAR: u64 = 365 * DAY;

/// Parse a period into a duration.
///
/// ```
/// use kickstart_config::parse_period;
///
/// assert_eq!(parse_period("1 day 2 hours").unwrap().as_secs(), 93_600);
/// assert_eq!(parse_period("PT1M30S").unwrap().as_secs(), 90);
/// ```
pub fn parse_period(text: &str) -> Result<Duration> {
    let invalid = || ConfigError::InvalidPeriod(text.to_string());

    let normalized: String = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let body = normalized.strip_prefix('p').unwrap_or(&normalized);
    if body.is_empty() {
        return Err(invalid());
    }

    let mut chars = body.chars().peekable();
    let mut total: u64 = 0;
    let mut time_part = false;
    let mut pending_t = false;

    while chars.peek().is_some() {
        let mut digits = String::new();
        while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
            digits.push(c);
            chars.next();
        }
        let mut unit = String::new();
        while let Some(c) = chars.peek().copied().filter(char::is_ascii_alphabetic) {
            unit.push(c);
            chars.next();
        }

        if digits.is_empty() {
            // a bare `T` opens the time part
            if unit == "t" && !time_part {
                time_part = true;
                pending_t = true;
                continue;
            }
            return Err(invalid());
        }
        if unit.is_empty() {
            return Err(invalid());
        }

        // `1DT2H` scans as `1` + `dt`: the `t` belongs to the next component
        let opens_time = unit.len() == 2 && unit.ends_with('t') && !time_part;
        let unit_name = if opens_time { &unit[..1] } else { unit.as_str() };

        let amount: u64 = digits.parse().map_err(|_| invalid())?;
        let seconds = unit_seconds(unit_name, time_part).ok_or_else(invalid)?;
        total = amount
            .checked_mul(seconds)
            .and_then(|s| total.checked_add(s))
            .ok_or_else(invalid)?;

        pending_t = false;
        if opens_time {
            time_part = true;
            pending_t = true;
        }
    }

    if pending_t {
        return Err(invalid());
    }
    Ok(Duration::from_secs(total))
}

/// Seconds per unit. `m` is minutes only inside the ISO time part.
fn unit_seconds(unit: &str, time_part: bool) -> Option<u64> {
    let seconds = match unit {
        "y" | "year" | "years" => YEAR,
        "m" if time_part => MINUTE,
        "m" | "month" | "months" => MONTH,
        "w" | "week" | "weeks" => WEEK,
        "d" | "day" | "days" => DAY,
        "h" | "hour" | "hours" => HOUR,
        "minute" | "minutes" | "min" | "mins" => MINUTE,
        "s" | "second" | "seconds" | "sec" | "secs" => 1,
        _ => return None,
    };
    Some(seconds)
}
