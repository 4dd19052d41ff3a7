// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsing for duration strings, clock times, and weekday tokens
//!
//! Durations are written as a positive integer plus a unit suffix:
//! `250ms`, `30s`, `5m`, `2h`, `1d`, `1w`.

use crate::error::InputError;
use std::time::Duration;

const MS_PER_SECOND: u64 = 1_000;
const MS_PER_MINUTE: u64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: u64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;
const MS_PER_WEEK: u64 = 7 * MS_PER_DAY;

/// Parse a duration string like `"30s"` or `"5m"` into a [`Duration`]
pub fn parse_duration(input: &str) -> Result<Duration, InputError> {
    let (value, unit) = split_value_unit(input)?;
    let ms = match unit {
        "ms" => value,
        "s" => value * MS_PER_SECOND,
        "m" => value * MS_PER_MINUTE,
        "h" => value * MS_PER_HOUR,
        "d" => value * MS_PER_DAY,
        "w" => value * MS_PER_WEEK,
        _ => return Err(InputError::InvalidDuration(input.to_string())),
    };
    Ok(Duration::from_millis(ms))
}

/// Split `"15m"` into its positive integer value and unit suffix
pub(crate) fn split_value_unit(input: &str) -> Result<(u64, &str), InputError> {
    let trimmed = input.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| InputError::InvalidDuration(input.to_string()))?;
    if digits_end == 0 {
        return Err(InputError::InvalidDuration(input.to_string()));
    }

    let value: u64 = trimmed[..digits_end]
        .parse()
        .map_err(|_| InputError::InvalidDuration(input.to_string()))?;
    if value == 0 {
        return Err(InputError::InvalidDuration(input.to_string()));
    }

    Ok((value, &trimmed[digits_end..]))
}

/// Parse a 24-hour `"HH:MM"` string into `(hour, minute)`
pub fn parse_clock_time(input: &str) -> Result<(u32, u32), InputError> {
    let err = || InputError::InvalidTime(input.to_string());

    let (hour_str, minute_str) = input.trim().split_once(':').ok_or_else(err)?;
    if hour_str.is_empty()
        || minute_str.is_empty()
        || !hour_str.chars().all(|c| c.is_ascii_digit())
        || !minute_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err(err());
    }

    let hour: u32 = hour_str.parse().map_err(|_| err())?;
    let minute: u32 = minute_str.parse().map_err(|_| err())?;
    if hour > 23 || minute > 59 {
        return Err(err());
    }

    Ok((hour, minute))
}

/// Map a weekday token (`sun` … `sat`) to its cron index 0-6
pub fn parse_weekday(token: &str) -> Result<u8, InputError> {
    match token.trim().to_ascii_lowercase().as_str() {
        "sun" => Ok(0),
        "mon" => Ok(1),
        "tue" => Ok(2),
        "wed" => Ok(3),
        "thu" => Ok(4),
        "fri" => Ok(5),
        "sat" => Ok(6),
        _ => Err(InputError::InvalidWeekday(token.to_string())),
    }
}

/// Full weekday name for human-readable schedule rendering
pub(crate) fn weekday_name(index: u8) -> &'static str {
    match index {
        0 => "Sunday",
        1 => "Monday",
        2 => "Tuesday",
        3 => "Wednesday",
        4 => "Thursday",
        5 => "Friday",
        _ => "Saturday",
    }
}

#[cfg(test)]
#[path = "duration_tests.rs"]
mod tests;
