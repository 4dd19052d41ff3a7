// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule constructors and their lowering to cron expressions

use super::human;
use super::{ScheduleDescriptor, ScheduleKind};
use crate::cron::CronExpr;
use crate::duration::{parse_clock_time, parse_weekday, split_value_unit};
use crate::error::InputError;
use std::collections::BTreeMap;

/// Build an interval schedule from a string like `"15m"` or `"30s"`.
///
/// The interval must match `<positive integer><s|m|h|d|w>`. Intervals that
/// overflow their unit are promoted (e.g. `"90s"` lowers as minutes).
pub fn every(interval: &str) -> Result<ScheduleDescriptor, InputError> {
    let (value, unit) = split_value_unit(interval)
        .map_err(|_| InputError::InvalidInterval(interval.to_string()))?;
    if !matches!(unit, "s" | "m" | "h" | "d" | "w") {
        return Err(InputError::InvalidInterval(interval.to_string()));
    }

    let cron = lower_interval(value, unit);
    let mut params = BTreeMap::new();
    params.insert("interval".to_string(), interval.to_string());

    Ok(ScheduleDescriptor::new(
        ScheduleKind::Interval,
        cron,
        human::interval_phrase(value, unit),
        params,
    ))
}

fn lower_interval(value: u64, unit: &str) -> String {
    match unit {
        "s" if value < 60 => format!("*/{} * * * * *", value),
        "s" => lower_interval(value.div_ceil(60), "m"),
        "m" if value < 60 => format!("*/{} * * * *", value),
        "m" => lower_interval(value.div_ceil(60), "h"),
        "h" if value < 24 => format!("0 */{} * * *", value),
        "h" => lower_interval(value.div_ceil(24), "d"),
        "d" if value == 1 => "0 0 * * *".to_string(),
        "d" => format!("0 0 */{} * *", value),
        "w" if value == 1 => "0 0 * * 0".to_string(),
        _ => lower_interval(value * 7, "d"),
    }
}

/// Build a daily schedule from one or more `"HH:MM"` times.
///
/// All times must share the same hour or the same minute, because a single
/// cron expression cannot express an arbitrary cross product.
pub fn daily(times: &[&str]) -> Result<ScheduleDescriptor, InputError> {
    if times.is_empty() {
        return Err(InputError::InvalidTime("(no times given)".to_string()));
    }

    let mut parsed = Vec::with_capacity(times.len());
    for time in times {
        parsed.push(parse_clock_time(time)?);
    }
    parsed.sort_unstable();
    parsed.dedup();

    let mut hours: Vec<u32> = parsed.iter().map(|(h, _)| *h).collect();
    let mut minutes: Vec<u32> = parsed.iter().map(|(_, m)| *m).collect();
    hours.dedup();
    minutes.sort_unstable();
    minutes.dedup();

    let cron = if minutes.len() == 1 {
        format!("{} {} * * *", minutes[0], join(&hours))
    } else if hours.len() == 1 {
        format!("{} {} * * *", join(&minutes), hours[0])
    } else {
        return Err(InputError::MixedDailyTimes(times.join(",")));
    };

    let mut params = BTreeMap::new();
    params.insert("times".to_string(), times.join(","));

    Ok(ScheduleDescriptor::new(
        ScheduleKind::Daily,
        cron,
        human::daily_phrase(&parsed),
        params,
    ))
}

/// Build a weekly schedule from weekday tokens and an `"HH:MM"` time
pub fn weekly(days: &[&str], time: &str) -> Result<ScheduleDescriptor, InputError> {
    if days.is_empty() {
        return Err(InputError::InvalidWeekday("(no days given)".to_string()));
    }

    let (hour, minute) = parse_clock_time(time)?;
    let mut indices = Vec::with_capacity(days.len());
    for day in days {
        indices.push(parse_weekday(day)?);
    }
    indices.sort_unstable();
    indices.dedup();

    let cron = format!("{} {} * * {}", minute, hour, join(&indices));

    let mut params = BTreeMap::new();
    params.insert("days".to_string(), days.join(","));
    params.insert("time".to_string(), time.to_string());

    Ok(ScheduleDescriptor::new(
        ScheduleKind::Weekly,
        cron,
        human::weekly_phrase(&indices, hour, minute),
        params,
    ))
}

/// Day selector for [`monthly`]: a fixed day of month or `"last-<weekday>"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthlyDay {
    Day(u8),
    Last(String),
}

impl From<u8> for MonthlyDay {
    fn from(day: u8) -> Self {
        MonthlyDay::Day(day)
    }
}

impl From<&str> for MonthlyDay {
    fn from(token: &str) -> Self {
        MonthlyDay::Last(token.to_string())
    }
}

/// Build a monthly schedule: a day of month in 1-31 or a `"last-<weekday>"`
/// token, at an `"HH:MM"` time
pub fn monthly(day: impl Into<MonthlyDay>, time: &str) -> Result<ScheduleDescriptor, InputError> {
    let (hour, minute) = parse_clock_time(time)?;
    let day = day.into();

    let (cron, phrase, day_param) = match &day {
        MonthlyDay::Day(d) => {
            if !(1..=31).contains(d) {
                return Err(InputError::InvalidDayOfMonth(d.to_string()));
            }
            (
                format!("{} {} {} * *", minute, hour, d),
                human::monthly_phrase(*d, hour, minute),
                d.to_string(),
            )
        }
        MonthlyDay::Last(token) => {
            let weekday = token
                .strip_prefix("last-")
                .ok_or_else(|| InputError::InvalidDayOfMonth(token.clone()))?;
            let index = parse_weekday(weekday)?;
            (
                format!("{} {} * * {}L", minute, hour, index),
                human::last_weekday_phrase(index, hour, minute),
                token.clone(),
            )
        }
    };

    let mut params = BTreeMap::new();
    params.insert("day".to_string(), day_param);
    params.insert("time".to_string(), time.to_string());

    Ok(ScheduleDescriptor::new(
        ScheduleKind::Monthly,
        cron,
        phrase,
        params,
    ))
}

/// Wrap a raw cron expression in a descriptor.
///
/// The expression is canonicalized (whitespace compressed) and must parse
/// under the evaluator, so a descriptor that registers can always compute
/// its next run.
pub fn cron(expression: &str) -> Result<ScheduleDescriptor, InputError> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    for field in &fields {
        if !field
            .chars()
            .all(|c| c.is_ascii_digit() || "*,/-LW#".contains(c))
        {
            return Err(InputError::InvalidCron {
                expression: expression.to_string(),
                reason: format!("field '{}' contains invalid characters", field),
            });
        }
    }

    let parsed = CronExpr::parse(expression)?;
    let canonical = parsed.canonical().to_string();

    let mut params = BTreeMap::new();
    params.insert("expression".to_string(), expression.to_string());

    Ok(ScheduleDescriptor::new(
        ScheduleKind::Cron,
        canonical.clone(),
        format!("cron: {}", canonical),
        params,
    ))
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
