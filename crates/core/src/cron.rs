// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron expression parsing and next-run computation
//!
//! Accepts the 5-field form (minute hour day-of-month month day-of-week)
//! and the 6-field form with a leading seconds field. Fields support `*`,
//! single values, comma lists, ranges, `*/N` steps, and, in the
//! day-of-week position, the `NL` suffix for the last such weekday of the
//! month. Evaluation is timezone-aware: a wall time erased by a DST gap
//! fires at the first valid instant after the gap, and a repeated
//! (fall-back) wall time fires once, on the earlier offset.

use crate::error::InputError;
use chrono::{
    DateTime, Datelike, Days, Duration as ChronoDuration, LocalResult, NaiveDate, NaiveTime,
    TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;
use std::collections::BTreeSet;
use std::fmt;

/// Upper bound on the forward day search. Any satisfiable expression
/// matches within four years (covers leap-day schedules).
const MAX_SEARCH_DAYS: u64 = 4 * 366 + 1;

/// Day-of-week field: either an explicit list or a last-weekday-of-month rule
#[derive(Debug, Clone, PartialEq, Eq)]
enum DowSpec {
    List(Vec<u8>),
    Last(u8),
}

impl DowSpec {
    fn matches(&self, date: NaiveDate) -> bool {
        let dow = date.weekday().num_days_from_sunday() as u8;
        match self {
            DowSpec::List(days) => days.contains(&dow),
            DowSpec::Last(day) => *day == dow && date.day() + 7 > days_in_month(date),
        }
    }
}

/// A parsed, immutable cron expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpr {
    seconds: Vec<u8>,
    minutes: Vec<u8>,
    hours: Vec<u8>,
    months: Vec<u8>,
    /// `None` means the day-of-month field was `*`
    dom: Option<Vec<u8>>,
    /// `None` means the day-of-week field was `*`
    dow: Option<DowSpec>,
    canonical: String,
    has_seconds: bool,
}

impl CronExpr {
    /// Parse a 5- or 6-field cron expression
    pub fn parse(expression: &str) -> Result<Self, InputError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let (sec_field, rest) = match fields.len() {
            5 => ("0", &fields[..]),
            6 => (fields[0], &fields[1..]),
            n => {
                return Err(invalid(
                    expression,
                    format!("expected 5 or 6 fields, found {}", n),
                ))
            }
        };
        let has_seconds = fields.len() == 6;

        let seconds = parse_field(expression, sec_field, 0, 59)?;
        let minutes = parse_field(expression, rest[0], 0, 59)?;
        let hours = parse_field(expression, rest[1], 0, 23)?;
        let dom = if rest[2] == "*" {
            None
        } else {
            Some(parse_field(expression, rest[2], 1, 31)?)
        };
        let months = parse_field(expression, rest[3], 1, 12)?;
        let dow = parse_dow(expression, rest[4])?;

        Ok(Self {
            seconds,
            minutes,
            hours,
            months,
            dom,
            dow,
            canonical: fields.join(" "),
            has_seconds,
        })
    }

    /// The expression with whitespace normalized to single spaces
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Whether the expression carries a leading seconds field
    pub fn has_seconds(&self) -> bool {
        self.has_seconds
    }

    /// Compute the next firing instant strictly after `after`, evaluated in
    /// the given timezone. Returns `None` when the expression cannot match
    /// within the search horizon (e.g. day 30 in a February-only schedule).
    pub fn next_after(&self, after: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
        let local = after.with_timezone(&tz).naive_local();
        let from = (local + ChronoDuration::seconds(1)).with_nanosecond(0)?;
        let start_date = from.date();

        for offset in 0..MAX_SEARCH_DAYS {
            let date = start_date.checked_add_days(Days::new(offset))?;
            if !self.day_matches(date) {
                continue;
            }
            let floor = if offset == 0 { Some(from.time()) } else { None };
            if let Some(instant) = self.next_on_date(date, floor, tz, after) {
                return Some(instant);
            }
        }
        None
    }

    fn day_matches(&self, date: NaiveDate) -> bool {
        if !self.months.contains(&(date.month() as u8)) {
            return false;
        }
        let day = date.day() as u8;
        // Standard cron: when both day fields are restricted, a day matches
        // if either field matches.
        match (&self.dom, &self.dow) {
            (None, None) => true,
            (Some(dom), None) => dom.contains(&day),
            (None, Some(dow)) => dow.matches(date),
            (Some(dom), Some(dow)) => dom.contains(&day) || dow.matches(date),
        }
    }

    /// Walk the time sets on `date` in ascending order and return the first
    /// wall time at or past `floor` that maps to an instant after `after`.
    fn next_on_date(
        &self,
        date: NaiveDate,
        floor: Option<NaiveTime>,
        tz: Tz,
        after: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        for &hour in &self.hours {
            for &minute in &self.minutes {
                for &second in &self.seconds {
                    let time =
                        NaiveTime::from_hms_opt(hour as u32, minute as u32, second as u32)?;
                    if floor.is_some_and(|f| time < f) {
                        continue;
                    }
                    let naive = date.and_time(time);
                    let resolved = match tz.from_local_datetime(&naive) {
                        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
                        // Fall-back repeat: fire once, on the earlier offset
                        LocalResult::Ambiguous(earlier, _later) => {
                            Some(earlier.with_timezone(&Utc))
                        }
                        // Spring-forward gap: first valid instant after it
                        LocalResult::None => resolve_gap(naive, tz),
                    };
                    match resolved {
                        Some(instant) if instant > after => return Some(instant),
                        _ => continue,
                    }
                }
            }
        }
        None
    }
}

impl fmt::Display for CronExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical)
    }
}

/// Probe forward in one-minute steps until the wall clock becomes valid
/// again. DST gap boundaries are minute-aligned, so this lands exactly on
/// the first instant after the transition.
fn resolve_gap(naive: chrono::NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    let mut probe = naive.with_second(0)?;
    // Gaps are at most a few hours wide
    for _ in 0..(3 * 60) {
        probe += ChronoDuration::minutes(1);
        match tz.from_local_datetime(&probe) {
            LocalResult::Single(dt) => return Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earlier, _) => return Some(earlier.with_timezone(&Utc)),
            LocalResult::None => continue,
        }
    }
    None
}

fn parse_dow(expression: &str, field: &str) -> Result<Option<DowSpec>, InputError> {
    if field == "*" {
        return Ok(None);
    }
    if let Some(day) = field.strip_suffix('L') {
        let value: u32 = day
            .parse()
            .map_err(|_| invalid(expression, format!("bad last-weekday '{}'", field)))?;
        if value > 7 {
            return Err(invalid(
                expression,
                format!("weekday {} out of range 0-7", value),
            ));
        }
        return Ok(Some(DowSpec::Last((value % 7) as u8)));
    }
    let mut days = parse_field(expression, field, 0, 7)?;
    // Both 0 and 7 mean Sunday
    for day in days.iter_mut() {
        if *day == 7 {
            *day = 0;
        }
    }
    days.sort_unstable();
    days.dedup();
    Ok(Some(DowSpec::List(days)))
}

/// Parse one cron field into a sorted list of matching values.
fn parse_field(expression: &str, field: &str, min: u8, max: u8) -> Result<Vec<u8>, InputError> {
    let mut values = BTreeSet::new();

    for item in field.split(',') {
        if item == "*" {
            values.extend(min..=max);
            continue;
        }
        // */N and A-B/N steps
        if let Some((base, step)) = item.split_once('/') {
            let step: u8 = step
                .parse()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| invalid(expression, format!("bad step in '{}'", item)))?;
            let (lo, hi) = if base == "*" {
                (min, max)
            } else {
                parse_range(expression, base, min, max)?
            };
            values.extend((lo..=hi).step_by(step as usize));
            continue;
        }
        if item.contains('-') {
            let (lo, hi) = parse_range(expression, item, min, max)?;
            values.extend(lo..=hi);
            continue;
        }
        let value = parse_number(expression, item, min, max)?;
        values.insert(value);
    }

    if values.is_empty() {
        return Err(invalid(expression, format!("empty field '{}'", field)));
    }
    Ok(values.into_iter().collect())
}

fn parse_range(expression: &str, item: &str, min: u8, max: u8) -> Result<(u8, u8), InputError> {
    let (lo, hi) = item
        .split_once('-')
        .ok_or_else(|| invalid(expression, format!("bad range '{}'", item)))?;
    let lo = parse_number(expression, lo, min, max)?;
    let hi = parse_number(expression, hi, min, max)?;
    if lo > hi {
        return Err(invalid(
            expression,
            format!("range '{}' is inverted", item),
        ));
    }
    Ok((lo, hi))
}

fn parse_number(expression: &str, item: &str, min: u8, max: u8) -> Result<u8, InputError> {
    let value: u8 = item
        .parse()
        .map_err(|_| invalid(expression, format!("bad value '{}'", item)))?;
    if value < min || value > max {
        return Err(invalid(
            expression,
            format!("value {} out of range {}-{}", value, min, max),
        ));
    }
    Ok(value)
}

fn invalid(expression: &str, reason: String) -> InputError {
    InputError::InvalidCron {
        expression: expression.to_string(),
        reason,
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = (date.year(), date.month());
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map(|d| d.day()).unwrap_or(28)
}

#[cfg(test)]
#[path = "cron_tests.rs"]
mod tests;
